//! # 编辑会话
//!
//! ## 设计思路
//!
//! `EditorSession` 把栅格层、工具状态机与外部模型串成完整的编辑流程：
//! 上传 → 建议 → 编辑 / 工具模式 → 结果。会话只持有一份可变状态，
//! 所有方法都取 `&mut self`，指针事件与状态转换天然串行。
//!
//! ## 实现思路
//!
//! 每个外部请求都遵循同一生命周期：
//!
//! 1. 前置条件检查（有图、描述非空），失败时发出提示并返回错误
//! 2. 占用加载标志（已占用返回 `Busy`），清空旧提示，设置状态文案
//! 3. 本地准备（解码 / 合成 / 编码）+ 外部调用
//! 4. 无论成败：工具回到 `None`、状态文案清空、守卫释放加载标志
//! 5. 成功写入编辑结果；失败发出提示并把错误返回给调用方
//!
//! 建议是唯一的降级路径：失败只记日志，列表置空，不发提示。

use std::time::Instant;

use super::collaborator::{CaptureDevice, GenerativeModel};
use super::loading::{LoadingFlag, LoadingGuard};
use super::notice::{Notice, NoticeBoard};
use super::presets::{ERASE_INSTRUCTION, EXTEND_INSTRUCTION, QuickEdit, inpaint_instruction};
use super::EditorConfig;
use crate::error::EditorError;
use crate::raster::{
    AspectTarget, Bitmap, BitmapCodec, Compositor, DisplayRect, ExtendPlan, MARKER_COLOR,
    MaskPainter, MediaType, RasterError, Surface,
};
use crate::tools::{ControlState, SessionFlags, ToolMachine, ToolMode, ToolTransition};

const MISSING_EDIT_PROMPT: &str = "请输入想要进行的编辑";
const MISSING_INPAINT_PROMPT: &str = "请描述要在选中区域添加的内容";
const MISSING_GENERATE_PROMPT: &str = "请输入想要生成的画面描述";

pub struct EditorSession<M> {
    model: M,
    config: EditorConfig,
    codec: BitmapCodec,
    compositor: Compositor,
    painter: MaskPainter,
    tools: ToolMachine,
    loading: LoadingFlag,
    notices: NoticeBoard,
    original: Option<Bitmap>,
    edited: Option<Bitmap>,
    suggestions: Vec<String>,
    suggesting: bool,
    status: Option<String>,
}

impl<M: GenerativeModel> EditorSession<M> {
    pub fn new(model: M, config: EditorConfig) -> Result<Self, EditorError> {
        config.validate()?;

        Ok(Self {
            model,
            codec: BitmapCodec::new(config.raster.clone()),
            compositor: Compositor::new(&config.raster),
            painter: MaskPainter::new(
                config.default_brush_size,
                config.min_brush_size,
                config.max_brush_size,
            )
            .with_pixel_limit(config.raster.max_decoded_pixels),
            tools: ToolMachine::new(),
            loading: LoadingFlag::new(),
            notices: NoticeBoard::new(config.notice_policy),
            original: None,
            edited: None,
            suggestions: Vec::new(),
            suggesting: false,
            status: None,
            config,
        })
    }

    pub fn with_defaults(model: M) -> Result<Self, EditorError> {
        Self::new(model, EditorConfig::default())
    }

    // ========================================================================
    // 只读访问
    // ========================================================================

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn codec(&self) -> &BitmapCodec {
        &self.codec
    }

    pub fn original(&self) -> Option<&Bitmap> {
        self.original.as_ref()
    }

    pub fn edited(&self) -> Option<&Bitmap> {
        self.edited.as_ref()
    }

    /// 编辑结果优先，否则是原图。
    pub fn active_image(&self) -> Option<&Bitmap> {
        self.edited.as_ref().or(self.original.as_ref())
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_suggesting(&self) -> bool {
        self.suggesting
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// 与界面层共享的加载标志句柄。
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// 请求在途时展示的状态文案。
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.dismiss();
    }

    pub fn painter(&self) -> &MaskPainter {
        &self.painter
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tools.mode()
    }

    pub fn inpaint_prompt(&self) -> &str {
        self.tools.inpaint_prompt()
    }

    pub fn controls(&self) -> ControlState {
        self.tools.controls(SessionFlags {
            loading: self.loading.is_set(),
            suggesting: self.suggesting,
            has_edited_image: self.edited.is_some(),
        })
    }

    // ========================================================================
    // 载入图片
    // ========================================================================

    /// 载入新原图：清空编辑结果、提示、工具状态，随后重新获取建议。
    pub async fn load_image(&mut self, bitmap: Bitmap) -> Result<(), EditorError> {
        if self.loading.is_set() {
            return self.fail(EditorError::Busy);
        }

        log::info!(
            "🖼️ 载入新图片 - {} {}x{}",
            bitmap.media_type(),
            bitmap.width(),
            bitmap.height()
        );
        self.notices.clear();
        self.original = Some(bitmap);
        self.edited = None;
        self.suggestions.clear();
        self.reset_tools();

        self.refresh_suggestions().await;
        Ok(())
    }

    /// 由原始字节（文件选择）载入。
    pub async fn load_bytes(&mut self, bytes: Vec<u8>, media_type: &str) -> Result<(), EditorError> {
        match self.codec.load_bytes(bytes, media_type) {
            Ok(bitmap) => self.load_image(bitmap).await,
            Err(e) => self.fail(e.into()),
        }
    }

    /// 从采集设备拍一帧并载入。
    pub async fn capture<D: CaptureDevice>(&mut self, device: &mut D) -> Result<(), EditorError> {
        let frame = match device.capture().await {
            Ok(frame) => frame,
            Err(EditorError::CaptureUnavailable(reason)) => {
                return self.fail(EditorError::CaptureUnavailable(reason));
            }
            Err(other) => return self.fail(EditorError::CaptureUnavailable(other.to_string())),
        };

        log::debug!(
            "📷 采集到一帧 - {} ({} 字节)",
            frame.media_type,
            frame.bytes.len()
        );
        self.load_bytes(frame.bytes, &frame.media_type).await
    }

    /// 文生图，结果作为新原图载入。
    pub async fn generate(&mut self, prompt: &str, aspect_tag: &str) -> Result<(), EditorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.fail(EditorError::MissingPrompt(MISSING_GENERATE_PROMPT));
        }

        let started = Instant::now();
        let result = {
            let _guard = self.begin("Generating image...")?;
            let result = self.model.generate(prompt, aspect_tag).await;
            self.status = None;
            result
        };

        match result {
            Ok(bitmap) => {
                log::info!("✨ 生成完成 - 比例: {} 耗时: {:?}", aspect_tag, started.elapsed());
                self.load_image(bitmap).await
            }
            Err(e) => self.fail(e),
        }
    }

    /// 针对原图重新获取建议。失败时列表置空，不发提示。
    pub async fn refresh_suggestions(&mut self) -> &[String] {
        let Some(original) = self.original.clone() else {
            self.suggestions.clear();
            return &self.suggestions;
        };

        self.suggesting = true;
        let result = self.model.suggest(&original).await;
        self.suggesting = false;

        self.suggestions = match result {
            Ok(items) => items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .take(self.config.suggestion_limit)
                .collect(),
            Err(e) => {
                log::warn!("⚠️ 获取编辑建议失败，已忽略：{}", e);
                Vec::new()
            }
        };
        log::debug!("💡 编辑建议 {} 条", self.suggestions.len());
        &self.suggestions
    }

    // ========================================================================
    // 自由编辑
    // ========================================================================

    pub async fn edit(&mut self, prompt: &str) -> Result<(), EditorError> {
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            return self.fail(EditorError::MissingPrompt(MISSING_EDIT_PROMPT));
        }
        let image = self.require_image()?;

        let started = Instant::now();
        let _guard = self.begin(format!("Applying edit: {}", prompt))?;
        let result = self.model.edit(&image, &prompt).await;
        self.finish_request(result, "编辑", started)
    }

    pub async fn quick_edit(&mut self, id: &str) -> Result<(), EditorError> {
        match QuickEdit::find(id) {
            Some(preset) => self.edit(preset.prompt).await,
            None => self.fail(RasterError::InvalidFormat(format!("未知的快捷编辑：{}", id)).into()),
        }
    }

    // ========================================================================
    // 工具与蒙版
    // ========================================================================

    pub fn start_erase(&mut self) -> ToolTransition {
        let transition = self.tools.start_erase();
        self.sync_painter(transition)
    }

    pub fn start_inpaint(&mut self) -> ToolTransition {
        let transition = self.tools.start_inpaint();
        self.sync_painter(transition)
    }

    pub fn start_extend(&mut self) -> ToolTransition {
        let transition = self.tools.start_extend();
        self.sync_painter(transition)
    }

    pub fn cancel_drawing(&mut self) -> ToolTransition {
        let transition = self.tools.cancel_drawing();
        self.sync_painter(transition)
    }

    pub fn set_inpaint_prompt(&mut self, prompt: impl Into<String>) {
        self.tools.set_inpaint_prompt(prompt);
    }

    pub fn set_brush_size(&mut self, size: f32) -> f32 {
        self.painter.set_brush_size(size)
    }

    pub fn pointer_down(&mut self, viewport_x: f32, viewport_y: f32) -> bool {
        !self.loading.is_set() && self.painter.pointer_down(viewport_x, viewport_y)
    }

    pub fn pointer_move(&mut self, viewport_x: f32, viewport_y: f32) -> bool {
        !self.loading.is_set() && self.painter.pointer_move(viewport_x, viewport_y)
    }

    pub fn pointer_up(&mut self) {
        self.painter.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.painter.pointer_leave();
    }

    /// 图片渲染区域变化，蒙版随之重建（已有笔迹丢弃）。
    pub fn resize_display(&mut self, rect: DisplayRect) -> Result<(), EditorError> {
        match self.painter.resize(rect) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn clear_mask(&mut self) {
        self.painter.clear();
    }

    /// 提交当前蒙版：擦除或局部重绘。
    ///
    /// 蒙版为空（包括缩放到原图分辨率后没有任何像素超过覆盖阈值）时直接返回，
    /// 不调用模型。只要蒙版上有笔迹，提交后无论成败都清空蒙版。
    pub async fn apply_mask(&mut self) -> Result<(), EditorError> {
        let mode = self.tools.mode();
        if !mode.is_drawing() {
            log::debug!("🫥 当前没有绘制工具，忽略提交");
            return Ok(());
        }
        if self.painter.is_blank() {
            log::debug!("🫥 蒙版为空，跳过提交");
            return Ok(());
        }

        let result = self.submit_mask(mode).await;
        self.painter.clear();
        result
    }

    /// 按目录中的比例扩展画布。
    pub async fn extend(&mut self, name: &str) -> Result<(), EditorError> {
        let Some(target) = AspectTarget::find(name) else {
            return self.fail(RasterError::InvalidFormat(format!("未知的宽高比：{}", name)).into());
        };
        let image = self.require_image()?;

        // 选定比例即关闭扩展面板
        let transition = self.tools.finish_request();
        self.sync_painter(transition);

        let started = Instant::now();
        let _guard = self.begin(format!("Extending image to a {} ratio...", target.name))?;
        let result = self.run_extend(&image, target).await;
        self.finish_request(result, "扩展", started)
    }

    // ========================================================================
    // 重置
    // ========================================================================

    /// 丢弃编辑结果，回到原图。
    pub fn reset(&mut self) -> Result<(), EditorError> {
        if self.loading.is_set() {
            return self.fail(EditorError::Busy);
        }
        self.edited = None;
        self.notices.clear();
        self.reset_tools();
        log::debug!("↩️ 已丢弃编辑结果");
        Ok(())
    }

    /// 丢弃整张图片，回到上传页。
    pub fn back(&mut self) -> Result<(), EditorError> {
        if self.loading.is_set() {
            return self.fail(EditorError::Busy);
        }
        self.original = None;
        self.edited = None;
        self.suggestions.clear();
        self.notices.clear();
        self.reset_tools();
        self.painter.resize(DisplayRect::default())?;
        log::debug!("⬅️ 已关闭当前图片");
        Ok(())
    }

    // ========================================================================
    // 内部实现
    // ========================================================================

    async fn submit_mask(&mut self, mode: ToolMode) -> Result<(), EditorError> {
        let prompt = self.tools.inpaint_prompt().trim().to_string();
        if mode == ToolMode::Inpaint && prompt.is_empty() {
            return self.fail(EditorError::MissingPrompt(MISSING_INPAINT_PROMPT));
        }
        let image = self.require_image()?;

        let stencil = match self.source_stencil(&image) {
            Ok(stencil) => stencil,
            Err(e) => return self.fail(e),
        };
        if self.compositor.coverage(&stencil) == 0 {
            log::debug!(
                "🫥 蒙版缩放到 {}x{} 后没有覆盖像素，跳过提交",
                stencil.width(),
                stencil.height()
            );
            return Ok(());
        }

        let status = match mode {
            ToolMode::Inpaint => format!("Inpainting: {}", prompt),
            _ => "Applying Magic Erase...".to_string(),
        };
        let started = Instant::now();
        let _guard = self.begin(status)?;
        let result = self.run_mask_edit(mode, &image, &stencil, &prompt).await;
        self.finish_request(result, "蒙版编辑", started)
    }

    /// 把显示分辨率的蒙版缩放到原图分辨率。
    fn source_stencil(&self, image: &Bitmap) -> Result<Surface, EditorError> {
        let (width, height) = image.dimensions();
        self.codec.check_dimensions(width, height)?;
        Ok(self
            .compositor
            .upscale_mask(self.painter.layer().surface(), width, height)?)
    }

    async fn run_mask_edit(
        &self,
        mode: ToolMode,
        image: &Bitmap,
        stencil: &Surface,
        prompt: &str,
    ) -> Result<Bitmap, EditorError> {
        match mode {
            ToolMode::Inpaint => {
                let source = self.codec.decode_async(image).await?;
                let composed = self.compositor.composite(&source, Some(stencil), Some(MARKER_COLOR))?;
                let marked = self.codec.encode_default(&composed)?;
                self.model.edit(&marked, &inpaint_instruction(prompt)).await
            }
            _ => {
                let mask = self.codec.encode(stencil, MediaType::Png)?;
                self.model.erase(image, &mask, ERASE_INSTRUCTION).await
            }
        }
    }

    async fn run_extend(
        &self,
        image: &Bitmap,
        target: &AspectTarget,
    ) -> Result<Bitmap, EditorError> {
        let source = self.codec.decode_async(image).await?;
        let (width, height) = source.dimensions();
        let plan = ExtendPlan::compute(width, height, target.ratio)?;
        self.codec.check_dimensions(plan.target_width, plan.target_height)?;
        if plan.is_identity() {
            log::debug!("📐 原图已是 {} 比例，仍按完整流程提交", target.name);
        }

        let canvas = plan.render(&source)?;
        let padded = self.codec.encode_default(&canvas)?;
        self.model.edit(&padded, EXTEND_INSTRUCTION).await
    }

    fn require_image(&mut self) -> Result<Bitmap, EditorError> {
        let image = self.active_image().cloned();
        match image {
            Some(image) => Ok(image),
            None => self.fail(EditorError::NoImage),
        }
    }

    /// 占用加载标志，清空旧提示，设置状态文案。
    fn begin(&mut self, status: impl Into<String>) -> Result<LoadingGuard, EditorError> {
        let guard = match self.loading.try_acquire() {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };
        self.notices.clear();
        self.status = Some(status.into());
        Ok(guard)
    }

    fn finish_request(
        &mut self,
        result: Result<Bitmap, EditorError>,
        label: &str,
        started: Instant,
    ) -> Result<(), EditorError> {
        self.status = None;
        self.reset_tools();

        match result {
            Ok(bitmap) => {
                log::info!(
                    "✅ {}完成 - {}x{} 耗时: {:?}",
                    label,
                    bitmap.width(),
                    bitmap.height(),
                    started.elapsed()
                );
                self.edited = Some(bitmap);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail<T>(&mut self, error: EditorError) -> Result<T, EditorError> {
        self.notices.raise(&error);
        Err(error)
    }

    fn reset_tools(&mut self) {
        let transition = self.tools.finish_request();
        self.sync_painter(transition);
    }

    fn sync_painter(&mut self, transition: ToolTransition) -> ToolTransition {
        if transition.discards_mask() {
            self.painter.clear();
        }
        self.painter.set_armed(self.tools.mode().is_drawing());
        transition
    }
}
