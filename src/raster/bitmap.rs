//! # 编码图片与媒体类型
//!
//! ## 设计思路
//!
//! 把“外部可传输的编码图片”和“可绘制的像素表面”解耦：
//! - `Bitmap` 表示编码后的不可变载荷（字节 + 媒体类型 + 尺寸）
//! - `Surface`（`RgbaImage`）表示解码后的可绘制像素
//!
//! 每次变换都产生新的 `Bitmap`，所以内部字节用 `Arc<[u8]>` 共享，克隆开销固定。

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};

use super::RasterError;

/// 解码后的可绘制像素表面。
pub type Surface = RgbaImage;

/// 支持的图片媒体类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg", alias = "image/jpg")]
    Jpeg,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/bmp")]
    Bmp,
}

impl MediaType {
    /// 解析 `image/...` 形式的媒体类型，忽略大小写与参数部分。
    pub fn parse(value: &str) -> Result<Self, RasterError> {
        let essence = value.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/webp" => Ok(Self::Webp),
            "image/gif" => Ok(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Ok(Self::Bmp),
            other => Err(RasterError::InvalidFormat(format!(
                "不支持的媒体类型：{}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 编码后的图片：字节载荷 + 媒体类型 + 头部尺寸。
///
/// 构造时会做文件签名与头部尺寸校验，但不做完整解码。
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Arc<[u8]>,
    media_type: MediaType,
    width: u32,
    height: u32,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("media_type", &self.media_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Bitmap {
    /// 由原始字节与声明的媒体类型构造。
    ///
    /// 字节签名必须是图片，且与声明类型一致，否则返回 `Decode`。
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, media_type: &str) -> Result<Self, RasterError> {
        let bytes = bytes.into();
        let declared = MediaType::parse(media_type)?;
        Self::validate_signature(&bytes, declared)?;

        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), declared.image_format())
            .into_dimensions()
            .map_err(|e| RasterError::Decode(format!("无法读取图片尺寸：{}", e)))?;

        Ok(Self {
            bytes: bytes.into(),
            media_type: declared,
            width,
            height,
        })
    }

    /// 由纯 Base64 文本与媒体类型构造（外部模型返回的 inline 数据即此形式）。
    pub fn from_base64(data: &str, media_type: &str) -> Result<Self, RasterError> {
        let bytes = general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| RasterError::Decode(format!("Base64 解码失败：{}", e)))?;
        Self::from_bytes(bytes, media_type)
    }

    /// 编码器产出的字节，尺寸已知，不再重复校验。
    pub(crate) fn from_encoded(bytes: Vec<u8>, media_type: MediaType, width: u32, height: u32) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 导出为纯 Base64 文本。
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// 导出为 `data:<type>;base64,<payload>`。
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    /// 通过文件签名（magic bytes）校验载荷确为声明类型的图片。
    fn validate_signature(bytes: &[u8], declared: MediaType) -> Result<(), RasterError> {
        if bytes.is_empty() {
            return Err(RasterError::Decode("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| RasterError::Decode("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(RasterError::Decode(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        let detected = MediaType::parse(kind.mime_type())
            .map_err(|_| RasterError::Decode(format!("不支持的图片签名：{}", kind.mime_type())))?;
        if detected != declared {
            return Err(RasterError::Decode(format!(
                "声明类型 {} 与实际内容 {} 不一致",
                declared, detected
            )));
        }

        Ok(())
    }
}
