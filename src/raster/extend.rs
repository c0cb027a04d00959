//! # 画布扩展模块
//!
//! ## 设计思路
//!
//! 把原图居中放到目标宽高比的新画布上，四周用标记色填满，
//! 外部模型收到后把标记区域“擦掉”并向外延展画面。
//!
//! ## 实现思路
//!
//! - 原图比目标更宽：宽度不变，增高；否则高度不变，加宽。
//! - 偏移量可能带 0.5，绘制原点统一取 `floor`，计划与绘制共用同一个原点，避免 1px 缝。

use image::imageops;
use serde::Serialize;

use super::{MARKER_COLOR, RasterError, Surface};

/// 预设宽高比。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectTarget {
    pub name: &'static str,
    /// 宽 / 高。
    pub ratio: f64,
}

pub static ASPECT_TARGETS: [AspectTarget; 5] = [
    AspectTarget { name: "16:9", ratio: 16.0 / 9.0 },
    AspectTarget { name: "4:3", ratio: 4.0 / 3.0 },
    AspectTarget { name: "1:1", ratio: 1.0 },
    AspectTarget { name: "3:4", ratio: 3.0 / 4.0 },
    AspectTarget { name: "9:16", ratio: 9.0 / 16.0 },
];

impl AspectTarget {
    /// 按名称查找预设（如 `"16:9"`）。
    pub fn find(name: &str) -> Option<&'static AspectTarget> {
        let name = name.trim();
        ASPECT_TARGETS.iter().find(|target| target.name == name)
    }
}

/// 扩展计划：新画布尺寸与原图偏移。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtendPlan {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ExtendPlan {
    /// 计算扩展计划。
    ///
    /// # 示例
    /// ```rust
    /// use magic_canvas::raster::ExtendPlan;
    ///
    /// let plan = ExtendPlan::compute(800, 600, 16.0 / 9.0)?;
    /// assert_eq!((plan.target_width, plan.target_height), (1067, 600));
    /// assert_eq!(plan.offset_x, 133.5);
    /// # Ok::<(), magic_canvas::raster::RasterError>(())
    /// ```
    pub fn compute(source_width: u32, source_height: u32, ratio: f64) -> Result<Self, RasterError> {
        if source_width == 0 || source_height == 0 {
            return Err(RasterError::InvalidFormat(format!(
                "原图尺寸无效：{}x{}",
                source_width, source_height
            )));
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(RasterError::InvalidFormat(format!("宽高比无效：{}", ratio)));
        }

        let (w, h) = (source_width as f64, source_height as f64);
        let (target_width, target_height) = if w / h > ratio {
            (source_width, Self::to_dimension(w / ratio)?.max(source_height))
        } else {
            (Self::to_dimension(h * ratio)?.max(source_width), source_height)
        };

        Ok(Self {
            source_width,
            source_height,
            target_width,
            target_height,
            offset_x: (target_width - source_width) as f64 / 2.0,
            offset_y: (target_height - source_height) as f64 / 2.0,
        })
    }

    /// 实际绘制原点（向下取整）。
    pub fn origin(&self) -> (u32, u32) {
        (self.offset_x.floor() as u32, self.offset_y.floor() as u32)
    }

    /// 比例恰好一致时不产生任何填充。
    pub fn is_identity(&self) -> bool {
        self.target_width == self.source_width && self.target_height == self.source_height
    }

    /// 生成填充好标记色、原图居中的新画布。
    pub fn render(&self, source: &Surface) -> Result<Surface, RasterError> {
        if source.dimensions() != (self.source_width, self.source_height) {
            return Err(RasterError::InvalidFormat(format!(
                "原图尺寸 {:?} 与扩展计划 {}x{} 不一致",
                source.dimensions(),
                self.source_width,
                self.source_height
            )));
        }

        let mut canvas = Surface::from_pixel(self.target_width, self.target_height, MARKER_COLOR);
        let (x, y) = self.origin();
        imageops::overlay(&mut canvas, source, x as i64, y as i64);

        log::debug!(
            "📐 扩展画布 {}x{} -> {}x{} 原点 ({}, {})",
            self.source_width,
            self.source_height,
            self.target_width,
            self.target_height,
            x,
            y
        );

        Ok(canvas)
    }

    fn to_dimension(value: f64) -> Result<u32, RasterError> {
        let rounded = value.round();
        if rounded < 1.0 || rounded > u32::MAX as f64 {
            return Err(RasterError::ResourceLimit(format!("扩展后尺寸超出范围：{}", value)));
        }
        Ok(rounded as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn landscape_to_wide_ratio_grows_width() {
        let plan = ExtendPlan::compute(800, 600, 16.0 / 9.0).unwrap();

        assert_eq!(plan.target_width, 1067);
        assert_eq!(plan.target_height, 600);
        assert_eq!(plan.offset_x, 133.5);
        assert_eq!(plan.offset_y, 0.0);
        assert_eq!(plan.origin(), (133, 0));
    }

    #[test]
    fn landscape_to_portrait_ratio_grows_height() {
        let plan = ExtendPlan::compute(800, 600, 9.0 / 16.0).unwrap();

        assert_eq!(plan.target_width, 800);
        assert_eq!(plan.target_height, 1422);
        assert_eq!(plan.offset_y, 411.0);
    }

    #[test]
    fn matching_ratio_degenerates_to_zero_offsets() {
        let plan = ExtendPlan::compute(400, 400, 1.0).unwrap();

        assert!(plan.is_identity());
        assert_eq!(plan.origin(), (0, 0));
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(ExtendPlan::compute(0, 10, 1.0).is_err());
        assert!(ExtendPlan::compute(10, 10, 0.0).is_err());
        assert!(ExtendPlan::compute(10, 10, f64::NAN).is_err());
    }

    #[test]
    fn render_fills_padding_with_marker_and_centers_source() {
        let source = Surface::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let plan = ExtendPlan::compute(4, 4, 2.0).unwrap();

        let canvas = plan.render(&source).unwrap();

        assert_eq!(canvas.dimensions(), (8, 4));
        assert_eq!(*canvas.get_pixel(0, 0), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(1, 2), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(5, 2), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(6, 2), MARKER_COLOR);
    }

    #[test]
    fn render_rejects_mismatched_source() {
        let plan = ExtendPlan::compute(4, 4, 2.0).unwrap();

        assert!(plan.render(&Surface::new(5, 4)).is_err());
    }

    #[test]
    fn catalog_lookup_by_name() {
        assert_eq!(AspectTarget::find("4:3").map(|t| t.ratio), Some(4.0 / 3.0));
        assert!(AspectTarget::find("2:1").is_none());
    }
}
