//! # 编辑会话模块（editor）
//!
//! ## 设计思路
//!
//! 把栅格层与工具状态机编排成一次完整的编辑会话，外部模型与相机以 trait 注入。
//!
//! - `session`：请求生命周期、蒙版提交、画布扩展、重置
//! - `collaborator`：生成式模型 / 采集设备接口
//! - `loading`：互斥加载标志与 RAII 守卫
//! - `notice`：单条提示（替换或排队）
//! - `presets`：固定指令与一键编辑
//! - `config`：会话配置

mod collaborator;
mod config;
mod loading;
mod notice;
mod presets;
mod session;

pub use collaborator::{CaptureDevice, CapturedFrame, GenerativeModel};
pub use config::EditorConfig;
pub use loading::{LoadingFlag, LoadingGuard};
pub use notice::{Notice, NoticeBoard, NoticePolicy};
pub use presets::{ERASE_INSTRUCTION, EXTEND_INSTRUCTION, QUICK_EDITS, QuickEdit, inpaint_instruction};
pub use session::EditorSession;
