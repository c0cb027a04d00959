//! # 合成模块
//!
//! ## 设计思路
//!
//! 输出分辨率永远跟随底图（原图的自然尺寸），而不是屏幕上的显示尺寸。
//! 蒙版在显示分辨率下绘制，合成前先放大到底图分辨率，再用 alpha 作为模板
//! 把覆盖区域染成纯色标记，外部模型据此定位需要重绘的区域。
//!
//! ## 实现思路
//!
//! 1. 复制底图作为输出
//! 2. 蒙版尺寸不一致时用 `fast_image_resize` 放大（失败回退 `imageops::resize`）
//! 3. 有填充色：alpha 超过阈值的像素直接写入不透明标记色
//! 4. 无填充色：按 source-over 叠加蒙版

use fast_image_resize as fr;
use image::Rgba;
use image::imageops::{self, FilterType};

use super::{MaskResampling, RasterConfig, RasterError, Surface};

/// 底图 + 蒙版 + 填充色的扁平化合成器。
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    resampling: MaskResampling,
    alpha_threshold: u8,
}

impl Compositor {
    pub fn new(config: &RasterConfig) -> Self {
        Self {
            resampling: config.mask_resampling,
            alpha_threshold: config.mask_alpha_threshold,
        }
    }

    /// 表面上是否存在任何非零像素。
    pub fn has_coverage(surface: &Surface) -> bool {
        surface.as_raw().iter().any(|&channel| channel != 0)
    }

    /// 统计 alpha 超过覆盖阈值的像素数。
    ///
    /// 显示分辨率大于原图时，缩小会把细笔迹平均到阈值以下，所以提交前要在
    /// 缩放后的模板上再判断一次。
    pub fn coverage(&self, stencil: &Surface) -> usize {
        stencil
            .pixels()
            .filter(|pixel| pixel[3] > self.alpha_threshold)
            .count()
    }

    /// 把蒙版缩放到目标分辨率，尺寸一致时直接复制。
    pub fn upscale_mask(
        &self,
        mask: &Surface,
        target_width: u32,
        target_height: u32,
    ) -> Result<Surface, RasterError> {
        if target_width == 0 || target_height == 0 {
            return Err(RasterError::InvalidFormat(format!(
                "目标尺寸无效：{}x{}",
                target_width, target_height
            )));
        }
        if mask.dimensions() == (target_width, target_height) {
            return Ok(mask.clone());
        }

        match self.resize_with_fast_image_resize(mask, target_width, target_height) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 放大蒙版失败，回退 imageops::resize：{}",
                    err
                );
                Ok(imageops::resize(
                    mask,
                    target_width,
                    target_height,
                    self.fallback_filter(),
                ))
            }
        }
    }

    /// 以 `base` 的分辨率合成输出。
    ///
    /// 蒙版为空时视为无操作，直接返回底图副本；调用方应在更早的阶段拦截空蒙版。
    pub fn composite(
        &self,
        base: &Surface,
        overlay: Option<&Surface>,
        fill: Option<Rgba<u8>>,
    ) -> Result<Surface, RasterError> {
        let (width, height) = base.dimensions();
        let mut output = base.clone();

        let Some(overlay) = overlay else {
            return Ok(output);
        };
        if !Self::has_coverage(overlay) {
            log::debug!("🫥 蒙版为空，跳过合成");
            return Ok(output);
        }

        let scaled = self.upscale_mask(overlay, width, height)?;

        match fill {
            Some(color) => {
                let opaque = Rgba([color[0], color[1], color[2], 0xFF]);
                for (out, stencil) in output.pixels_mut().zip(scaled.pixels()) {
                    if stencil[3] > self.alpha_threshold {
                        *out = opaque;
                    }
                }
            }
            None => imageops::overlay(&mut output, &scaled, 0, 0),
        }

        log::debug!(
            "🎨 合成完成 - 底图: {}x{} 蒙版: {}x{} 填充: {}",
            width,
            height,
            overlay.width(),
            overlay.height(),
            fill.is_some()
        );

        Ok(output)
    }

    fn resize_with_fast_image_resize(
        &self,
        mask: &Surface,
        target_width: u32,
        target_height: u32,
    ) -> Result<Surface, RasterError> {
        let (src_width, src_height) = mask.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            mask.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| RasterError::Encode(format!("构建蒙版缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(self.fast_algorithm());

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| RasterError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

        Surface::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| RasterError::Encode("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn fast_algorithm(&self) -> fr::ResizeAlg {
        match self.resampling {
            MaskResampling::Nearest => fr::ResizeAlg::Nearest,
            MaskResampling::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        }
    }

    fn fallback_filter(&self) -> FilterType {
        match self.resampling {
            MaskResampling::Nearest => FilterType::Nearest,
            MaskResampling::Bilinear => FilterType::Triangle,
        }
    }
}
