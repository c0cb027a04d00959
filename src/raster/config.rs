//! # 栅格配置
//!
//! ## 设计思路
//!
//! 把解码上限、蒙版缩放策略、描边颜色等“可调参数”集中到 `RasterConfig`，
//! 保证行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的默认值。
//! - `MaskResampling` 负责策略字符串解析与反向输出。
//! - `validate` 在会话创建和外部注入配置时统一做范围校验。

use image::Rgba;
use serde::{Deserialize, Serialize};

use super::{MediaType, RasterError};

/// 标记色：外部模型据此定位需要替换的区域（纯绿、完全不透明）。
pub const MARKER_COLOR: Rgba<u8> = Rgba([0x00, 0xFF, 0x00, 0xFF]);

/// 用户描边颜色：red-500，75% 不透明度。
pub const STROKE_COLOR: Rgba<u8> = Rgba([239, 68, 68, 191]);

/// 蒙版从显示分辨率放大到原图分辨率时使用的采样方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskResampling {
    Nearest,
    Bilinear,
}

impl MaskResampling {
    /// 从外部字符串解析采样方式。
    ///
    /// # 示例
    /// ```rust
    /// use magic_canvas::raster::MaskResampling;
    ///
    /// let r = MaskResampling::parse("Bilinear")?;
    /// assert_eq!(r.as_str(), "bilinear");
    /// # Ok::<(), magic_canvas::raster::RasterError>(())
    /// ```
    pub fn parse(value: &str) -> Result<Self, RasterError> {
        match value.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(RasterError::InvalidFormat(format!(
                "未知蒙版采样方式：{}（可选：nearest / bilinear）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
        }
    }
}

/// 栅格处理配置。
///
/// 字段覆盖了载入、解码、蒙版放大与输出编码四个阶段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// 编码载荷（解码前）允许的最大字节数。
    pub max_payload_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 蒙版放大采样方式。
    pub mask_resampling: MaskResampling,
    /// 覆盖度阈值：放大后 alpha 大于该值的像素视为“已涂抹”。
    pub mask_alpha_threshold: u8,
    /// 发送给外部模型的图片编码格式。
    pub output_media_type: MediaType,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            mask_resampling: MaskResampling::Bilinear,
            mask_alpha_threshold: 16,
            output_media_type: MediaType::Png,
        }
    }
}

impl RasterConfig {
    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), RasterError> {
        if self.max_payload_size < 1024 {
            return Err(RasterError::InvalidFormat(
                "max_payload_size 不能小于 1KB".to_string(),
            ));
        }
        if self.max_decoded_pixels == 0 {
            return Err(RasterError::InvalidFormat(
                "max_decoded_pixels 必须大于 0".to_string(),
            ));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(RasterError::InvalidFormat(
                "max_decoded_bytes 不能小于 8MB".to_string(),
            ));
        }
        if self.output_media_type == MediaType::Gif {
            return Err(RasterError::InvalidFormat(
                "output_media_type 不支持 gif（调色板会破坏标记色）".to_string(),
            ));
        }
        Ok(())
    }
}
