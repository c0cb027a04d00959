//! # 工具状态机
//!
//! ## 设计思路
//!
//! 擦除 / 局部重绘 / 扩展三个工具互斥，用一个枚举表达“当前激活的工具”，
//! 替代分散的布尔标志。所有状态变化只能通过具名转换函数发生，
//! 界面控件的可用性统一从 `ToolMachine::controls` 推导。
//!
//! ## 实现思路
//!
//! - 每个转换返回 `ToolTransition`，调用方据此决定是否丢弃蒙版。
//! - `start_extend` 是开关；进入扩展会隐式退出绘制类工具。
//! - 请求结束（成功或失败）统一调用 `finish_request` 回到 `None`。

use serde::Serialize;

/// 当前激活的工具。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    None,
    Erase,
    Inpaint,
    Extend,
}

impl ToolMode {
    /// 擦除与局部重绘都需要在蒙版上涂抹。
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Erase | Self::Inpaint)
    }
}

/// 一次状态转换的前后状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTransition {
    pub from: ToolMode,
    pub to: ToolMode,
}

impl ToolTransition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// 离开绘制类工具（或切换到另一个绘制工具）时蒙版作废。
    pub fn discards_mask(&self) -> bool {
        self.from.is_drawing() && self.changed()
    }
}

/// 派生控件状态时需要的会话外部信息。
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    pub loading: bool,
    pub suggesting: bool,
    pub has_edited_image: bool,
}

/// 界面控件的启用 / 可见状态快照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub mode: ToolMode,
    pub loading: bool,
    pub mask_canvas_visible: bool,
    pub apply_enabled: bool,
    pub brush_slider_enabled: bool,
    pub inpaint_prompt_visible: bool,
    pub aspect_choices_visible: bool,
    pub erase_enabled: bool,
    pub inpaint_enabled: bool,
    pub extend_enabled: bool,
    pub prompt_enabled: bool,
    pub quick_edits_enabled: bool,
    pub suggestions_enabled: bool,
    pub refresh_suggestions_enabled: bool,
    pub reset_enabled: bool,
    pub back_enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolMachine {
    mode: ToolMode,
    inpaint_prompt: String,
}

impl ToolMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn inpaint_prompt(&self) -> &str {
        &self.inpaint_prompt
    }

    pub fn set_inpaint_prompt(&mut self, prompt: impl Into<String>) {
        self.inpaint_prompt = prompt.into();
    }

    pub fn start_erase(&mut self) -> ToolTransition {
        self.inpaint_prompt.clear();
        self.go(ToolMode::Erase)
    }

    pub fn start_inpaint(&mut self) -> ToolTransition {
        self.inpaint_prompt.clear();
        self.go(ToolMode::Inpaint)
    }

    /// 扩展工具是开关：再次触发即关闭。
    pub fn start_extend(&mut self) -> ToolTransition {
        self.inpaint_prompt.clear();
        if self.mode == ToolMode::Extend {
            self.go(ToolMode::None)
        } else {
            self.go(ToolMode::Extend)
        }
    }

    /// 仅对绘制类工具生效，其余状态保持不变。
    pub fn cancel_drawing(&mut self) -> ToolTransition {
        if self.mode.is_drawing() {
            self.go(ToolMode::None)
        } else {
            self.go(self.mode)
        }
    }

    /// 请求结束（成功或失败）后回到初始状态。
    pub fn finish_request(&mut self) -> ToolTransition {
        self.inpaint_prompt.clear();
        self.go(ToolMode::None)
    }

    pub fn controls(&self, flags: SessionFlags) -> ControlState {
        let idle = !flags.loading;
        let tool_active = self.mode != ToolMode::None;
        let drawing = self.mode.is_drawing();

        ControlState {
            mode: self.mode,
            loading: flags.loading,
            mask_canvas_visible: drawing,
            apply_enabled: drawing && idle,
            brush_slider_enabled: drawing && idle,
            inpaint_prompt_visible: self.mode == ToolMode::Inpaint,
            aspect_choices_visible: self.mode == ToolMode::Extend,
            erase_enabled: idle && !tool_active,
            inpaint_enabled: idle && !tool_active,
            extend_enabled: idle && !drawing,
            prompt_enabled: idle && !tool_active,
            quick_edits_enabled: idle && !tool_active,
            suggestions_enabled: idle && !tool_active && !flags.suggesting,
            refresh_suggestions_enabled: idle && !flags.suggesting,
            reset_enabled: idle && flags.has_edited_image,
            back_enabled: idle,
        }
    }

    fn go(&mut self, to: ToolMode) -> ToolTransition {
        let transition = ToolTransition { from: self.mode, to };
        if transition.changed() {
            log::debug!("🛠️ 工具切换：{:?} -> {:?}", transition.from, transition.to);
        }
        self.mode = to;
        transition
    }
}
