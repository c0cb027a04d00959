//! # 编解码模块
//!
//! ## 设计思路
//!
//! 将“编码载荷 ↔ RGBA 像素表面”的转换集中管理，并在关键节点增加资源上限控制。
//! 先做体积与尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. Base64 / Data URL：解析标记 + 估算解码体积 + 解码
//! 2. 按头部尺寸做像素与内存上限的快速拒绝
//! 3. 完整解码并转换 RGBA
//! 4. 异步解码跑在阻塞任务上；`decode_all` 一次性发起 N 个解码再统一等待

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::time::Instant;

use super::{Bitmap, MediaType, RasterConfig, RasterError, Surface};

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// 编码图片与像素表面之间的转换器。
#[derive(Debug, Clone)]
pub struct BitmapCodec {
    config: RasterConfig,
}

impl BitmapCodec {
    pub fn new(config: RasterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// 从原始字节载入（文件选择、相机拍照的产物）。
    pub fn load_bytes(&self, bytes: Vec<u8>, media_type: &str) -> Result<Bitmap, RasterError> {
        if bytes.len() as u64 > self.config.max_payload_size {
            return Err(RasterError::ResourceLimit(format!(
                "图片体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                self.config.max_payload_size as f64 / 1024.0 / 1024.0
            )));
        }
        Bitmap::from_bytes(bytes, media_type)
    }

    /// 从纯 Base64 文本载入。
    pub fn load_base64(&self, data: &str, media_type: &str) -> Result<Bitmap, RasterError> {
        let bytes = Self::decode_base64_with_limit(data.trim(), self.config.max_payload_size)?;
        Bitmap::from_bytes(bytes, media_type)
    }

    /// 从 `data:<type>;base64,<payload>` 载入。
    pub fn load_data_uri(&self, uri: &str) -> Result<Bitmap, RasterError> {
        let normalized = uri.trim();
        let rest = normalized
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| RasterError::InvalidFormat("缺少 data: 前缀".to_string()))?;
        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| RasterError::InvalidFormat("缺少 base64 标记".to_string()))?;

        let media_type = &rest[..marker];
        let payload = &rest[marker + BASE64_MARKER.len()..];
        let bytes = Self::decode_base64_with_limit(payload, self.config.max_payload_size)?;
        Bitmap::from_bytes(bytes, media_type)
    }

    /// 同步解码为 RGBA 表面。
    pub fn decode(&self, bitmap: &Bitmap) -> Result<Surface, RasterError> {
        let start = Instant::now();
        let (header_width, header_height) = bitmap.dimensions();
        self.check_dimensions(header_width, header_height)?;

        let decoded = image::load_from_memory_with_format(
            bitmap.bytes(),
            bitmap.media_type().image_format(),
        )
        .map_err(|e| RasterError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(width, height)?;

        log::debug!(
            "🖼️ 解码完成 - 类型: {} 尺寸: {}x{} 耗时: {}ms",
            bitmap.media_type(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(decoded.into_rgba8())
    }

    /// 按像素与内存上限校验一块即将分配的 RGBA 表面。
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), RasterError> {
        self.validate_pixel_limits(width, height)?;
        self.validate_decoded_memory_limits(width, height)
    }

    /// 异步解码：在阻塞任务上执行，完成或失败都只产出一次结果。
    pub async fn decode_async(&self, bitmap: &Bitmap) -> Result<Surface, RasterError> {
        let codec = self.clone();
        let bitmap = bitmap.clone();
        tokio::task::spawn_blocking(move || codec.decode(&bitmap))
            .await
            .map_err(|e| RasterError::Decode(format!("解码任务异常终止：{}", e)))?
    }

    /// 同时发起 N 个独立解码并等待全部完成；任一失败即整体失败。
    ///
    /// 结果顺序与输入顺序一致。
    pub async fn decode_all(&self, bitmaps: &[Bitmap]) -> Result<Vec<Surface>, RasterError> {
        let handles: Vec<_> = bitmaps
            .iter()
            .cloned()
            .map(|bitmap| {
                let codec = self.clone();
                tokio::task::spawn_blocking(move || codec.decode(&bitmap))
            })
            .collect();

        let mut surfaces = Vec::with_capacity(handles.len());
        for handle in handles {
            let surface = handle
                .await
                .map_err(|e| RasterError::Decode(format!("解码任务异常终止：{}", e)))??;
            surfaces.push(surface);
        }
        Ok(surfaces)
    }

    /// 按配置的默认输出格式编码。
    pub fn encode_default(&self, surface: &Surface) -> Result<Bitmap, RasterError> {
        self.encode(surface, self.config.output_media_type)
    }

    /// 将像素表面编码为指定格式。JPEG 不支持透明通道，先压平为 RGB。
    pub fn encode(&self, surface: &Surface, media_type: MediaType) -> Result<Bitmap, RasterError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::Encode("不能编码空表面".to_string()));
        }

        let mut cursor = Cursor::new(Vec::new());
        let format = media_type.image_format();
        let written = match media_type {
            MediaType::Jpeg => DynamicImage::ImageRgba8(surface.clone())
                .into_rgb8()
                .write_to(&mut cursor, format),
            _ => surface.write_to(&mut cursor, format),
        };
        written.map_err(|e| RasterError::Encode(format!("{} 编码失败：{}", media_type, e)))?;

        Ok(Bitmap::from_encoded(cursor.into_inner(), media_type, width, height))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, RasterError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| RasterError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| RasterError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    fn decode_base64_with_limit(data: &str, max_payload_size: u64) -> Result<Vec<u8>, RasterError> {
        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(data)?;
        if estimated_len > max_payload_size {
            return Err(RasterError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_payload_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(data)
            .map_err(|e| RasterError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), RasterError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| RasterError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.config.max_decoded_pixels {
            return Err(RasterError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(&self, width: u32, height: u32) -> Result<(), RasterError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| RasterError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.config.max_decoded_bytes {
            return Err(RasterError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}
