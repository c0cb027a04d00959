//! # 魔法画布：库入口
//!
//! 生成式修图前端的核心：蒙版合成与工具模式状态机。真正的图像变换由外部模型完成，
//! 本库负责把位图整理成模型需要的形状，并协调“上传 → 编辑 → 工具 → 结果”的流程。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  editor ─── EditorSession (请求生命周期 + 提示 + 建议)     │
//! │     │            ↕                                       │
//! │     │      GenerativeModel / CaptureDevice (trait 注入)   │
//! │     │                                                    │
//! │  tools ──── ToolMachine (None / Erase / Inpaint / Extend)│
//! │     │                                                    │
//! │  raster                                                  │
//! │   ├─ codec        Bitmap ↔ RgbaImage，资源上限            │
//! │   ├─ mask         指针事件 → 显示分辨率蒙版               │
//! │   ├─ compositor   蒙版放大 + 标记色合成                   │
//! │   └─ extend       宽高比扩展画布                          │
//! │                                                          │
//! │  error ──── EditorError (统一错误类型)                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `EditorError` |
//! | [`raster`] | 编解码、蒙版绘制、合成、扩展画布 |
//! | [`tools`] | 工具互斥状态机与控件可用性 |
//! | [`editor`] | 编辑会话编排、外部协作方接口、配置 |

pub mod editor;
pub mod error;
pub mod raster;
pub mod tools;

pub use editor::{EditorConfig, EditorSession, GenerativeModel};
pub use error::EditorError;
