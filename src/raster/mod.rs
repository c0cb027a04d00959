//! # 栅格模块（raster）
//!
//! ## 设计思路
//!
//! 把“编码图片 ↔ 像素表面 → 蒙版绘制 → 合成 / 扩展画布”按职责拆分为多个子模块，
//! 全部基于 `image::RgbaImage`，不依赖任何具体的界面框架。
//!
//! - `bitmap`：编码图片 `Bitmap` 与媒体类型
//! - `codec`：Base64 / Data URL 载入、解码、编码与资源限制
//! - `compositor`：蒙版放大与标记色合成
//! - `mask`：指针输入 → 显示分辨率蒙版
//! - `extend`：宽高比扩展计划与填充画布
//! - `config/error`：配置与错误
//!
//! ```text
//! 指针事件
//!    ↓
//! mask.rs（显示分辨率笔迹）
//!    ↓
//! compositor.rs（放大到原图分辨率 + 标记色）
//!    ↓
//! codec.rs（编码为 Bitmap）
//!    ↓
//! 外部模型
//! ```

mod bitmap;
mod codec;
mod compositor;
mod config;
mod error;
mod extend;
mod mask;

pub use bitmap::{Bitmap, MediaType, Surface};
pub use codec::BitmapCodec;
pub use compositor::Compositor;
pub use config::{MARKER_COLOR, MaskResampling, RasterConfig, STROKE_COLOR};
pub use error::RasterError;
pub use extend::{ASPECT_TARGETS, AspectTarget, ExtendPlan};
pub use mask::{
    DEFAULT_BRUSH_SIZE, DisplayRect, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, MaskLayer, MaskPainter,
    StrokePoint,
};
