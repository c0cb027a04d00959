//! # 蒙版绘制模块
//!
//! ## 设计思路
//!
//! 蒙版层始终以“显示分辨率”贴合屏幕上渲染出来的图片，指针坐标只做平移、不做缩放。
//! 放大到原图分辨率这一步留给合成器，在 Apply 时统一完成。
//!
//! 状态机：`Idle → Stroking → Idle`，外加一个与之正交的 `armed` 标志
//! （只有擦除 / 局部重绘工具激活时才接受指针输入）。
//!
//! ## 实现思路
//!
//! - 按下：记录首点，并立即画一个半径为 brush/2 的实心圆（单击也能留下痕迹）
//! - 移动：从上一个点到当前点画一段圆头线段，宽度为 brush
//! - 抬起 / 离开：回到 Idle，笔迹保留直到显式清除或 Apply
//! - 显示尺寸变化：重建蒙版层并清空（已知取舍：旧笔迹丢失，需要重画）
//!
//! 像素覆盖判定以像素中心 `(x + 0.5, y + 0.5)` 为准；描边颜色直接写入而非叠加，
//! 重叠笔迹不会越涂越深。

use image::Rgba;

use super::{Bitmap, BitmapCodec, MediaType, RasterConfig, RasterError, STROKE_COLOR, Surface};

pub const DEFAULT_BRUSH_SIZE: f32 = 40.0;
pub const MIN_BRUSH_SIZE: f32 = 5.0;
pub const MAX_BRUSH_SIZE: f32 = 100.0;

/// 蒙版层坐标系中的一个点（显示像素，原点为渲染图片区域左上角）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 图片在视口中的渲染区域。
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: u32,
    pub height: u32,
}

/// 显示分辨率下累积笔迹的栅格层。
#[derive(Debug, Clone)]
pub struct MaskLayer {
    surface: Surface,
    left: f32,
    top: f32,
}

impl MaskLayer {
    pub fn new(rect: DisplayRect) -> Self {
        Self {
            surface: Surface::new(rect.width, rect.height),
            left: rect.left,
            top: rect.top,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn rect(&self) -> DisplayRect {
        DisplayRect {
            left: self.left,
            top: self.top,
            width: self.surface.width(),
            height: self.surface.height(),
        }
    }

    /// 视口坐标 → 蒙版层本地坐标。
    pub fn to_local(&self, viewport_x: f32, viewport_y: f32) -> StrokePoint {
        StrokePoint::new(viewport_x - self.left, viewport_y - self.top)
    }

    /// 所有像素的所有通道都为 0 时视为空白。
    pub fn is_blank(&self) -> bool {
        self.surface.as_raw().iter().all(|&channel| channel == 0)
    }

    pub fn clear(&mut self) {
        let (width, height) = self.surface.dimensions();
        self.surface = Surface::new(width, height);
    }

    /// 以 PNG 导出当前蒙版（显示分辨率，保留透明通道）。
    pub fn export(&self, codec: &BitmapCodec) -> Result<Bitmap, RasterError> {
        codec.encode(&self.surface, MediaType::Png)
    }

    pub fn fill_circle(&mut self, center: StrokePoint, radius: f32, color: Rgba<u8>) {
        self.paint_where(
            (center.x - radius, center.y - radius),
            (center.x + radius, center.y + radius),
            color,
            |px, py| {
                let dx = px - center.x;
                let dy = py - center.y;
                dx * dx + dy * dy <= radius * radius
            },
        );
    }

    /// 圆头圆角线段：到线段距离不超过 width/2 的像素都被覆盖。
    pub fn stroke_segment(&mut self, from: StrokePoint, to: StrokePoint, width: f32, color: Rgba<u8>) {
        let half = width / 2.0;
        self.paint_where(
            (from.x.min(to.x) - half, from.y.min(to.y) - half),
            (from.x.max(to.x) + half, from.y.max(to.y) + half),
            color,
            |px, py| point_to_segment_dist(px, py, from, to) <= half,
        );
    }

    fn paint_where<F>(&mut self, min: (f32, f32), max: (f32, f32), color: Rgba<u8>, covers: F)
    where
        F: Fn(f32, f32) -> bool,
    {
        let (w, h) = self.surface.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let x0 = min.0.floor().max(0.0) as u32;
        let y0 = min.1.floor().max(0.0) as u32;
        let x1 = (max.0.ceil().max(0.0) as u32).min(w - 1);
        let y1 = (max.1.ceil().max(0.0) as u32).min(h - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                if covers(x as f32 + 0.5, y as f32 + 0.5) {
                    self.surface.put_pixel(x, y, color);
                }
            }
        }
    }
}

fn point_to_segment_dist(px: f32, py: f32, a: StrokePoint, b: StrokePoint) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let (apx, apy) = (px - a.x, py - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + abx * t, a.y + aby * t);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StrokeState {
    Idle,
    Stroking { last: StrokePoint },
}

/// 把指针事件转换为蒙版笔迹。
#[derive(Debug, Clone)]
pub struct MaskPainter {
    layer: MaskLayer,
    state: StrokeState,
    armed: bool,
    brush_size: f32,
    brush_range: (f32, f32),
    stroke: Vec<StrokePoint>,
    /// 蒙版层允许的最大像素数。
    max_pixels: u64,
}

impl MaskPainter {
    pub fn new(brush_size: f32, min_brush: f32, max_brush: f32) -> Self {
        Self {
            layer: MaskLayer::new(DisplayRect {
                left: 0.0,
                top: 0.0,
                width: 0,
                height: 0,
            }),
            state: StrokeState::Idle,
            armed: false,
            brush_size: brush_size.clamp(min_brush, max_brush),
            brush_range: (min_brush, max_brush),
            stroke: Vec::new(),
            max_pixels: RasterConfig::default().max_decoded_pixels,
        }
    }

    pub fn with_pixel_limit(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn layer(&self) -> &MaskLayer {
        &self.layer
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_stroking(&self) -> bool {
        matches!(self.state, StrokeState::Stroking { .. })
    }

    pub fn is_blank(&self) -> bool {
        self.layer.is_blank()
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// 当前（或最近一次）笔画的点序列。
    pub fn current_stroke(&self) -> &[StrokePoint] {
        &self.stroke
    }

    /// 设置笔刷直径，超出范围时截断，返回实际生效值。
    pub fn set_brush_size(&mut self, size: f32) -> f32 {
        let (min, max) = self.brush_range;
        self.brush_size = if size.is_finite() { size.clamp(min, max) } else { self.brush_size };
        self.brush_size
    }

    /// 解除武装时结束进行中的笔画。
    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
        if !armed {
            self.state = StrokeState::Idle;
        }
    }

    /// 指针按下（视口坐标）。返回是否开始了新笔画。
    pub fn pointer_down(&mut self, viewport_x: f32, viewport_y: f32) -> bool {
        if !self.armed {
            return false;
        }
        let point = self.layer.to_local(viewport_x, viewport_y);
        self.stroke.clear();
        self.stroke.push(point);
        self.layer.fill_circle(point, self.brush_size / 2.0, STROKE_COLOR);
        self.state = StrokeState::Stroking { last: point };
        true
    }

    /// 指针移动（视口坐标）。只有处于 Stroking 时才绘制。
    pub fn pointer_move(&mut self, viewport_x: f32, viewport_y: f32) -> bool {
        let StrokeState::Stroking { last } = self.state else {
            return false;
        };
        let point = self.layer.to_local(viewport_x, viewport_y);
        self.layer.stroke_segment(last, point, self.brush_size, STROKE_COLOR);
        self.stroke.push(point);
        self.state = StrokeState::Stroking { last: point };
        true
    }

    pub fn pointer_up(&mut self) {
        self.state = StrokeState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// 渲染区域变化（窗口缩放、换图）：重建蒙版层并清空已有笔迹。
    ///
    /// 区域像素数超过上限时返回 `ResourceLimit`，蒙版层退化为空层，不再接受笔迹。
    pub fn resize(&mut self, rect: DisplayRect) -> Result<(), RasterError> {
        if self.layer.rect() != rect && !self.layer.is_blank() {
            log::debug!(
                "🧽 显示区域变化 {:?} -> {:?}，已有蒙版被丢弃",
                self.layer.rect(),
                rect
            );
        }
        self.state = StrokeState::Idle;
        self.stroke.clear();

        let pixels = rect.width as u64 * rect.height as u64;
        if pixels > self.max_pixels {
            self.layer = MaskLayer::new(DisplayRect {
                width: 0,
                height: 0,
                ..rect
            });
            return Err(RasterError::ResourceLimit(format!(
                "蒙版区域过大：{}x{}（限制：{} 像素）",
                rect.width, rect.height, self.max_pixels
            )));
        }

        self.layer = MaskLayer::new(rect);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.layer.clear();
        self.state = StrokeState::Idle;
        self.stroke.clear();
    }
}

impl Default for MaskPainter {
    fn default() -> Self {
        Self::new(DEFAULT_BRUSH_SIZE, MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterConfig;

    fn armed_painter(width: u32, height: u32) -> MaskPainter {
        let mut painter = MaskPainter::default();
        painter.resize(DisplayRect {
            left: 0.0,
            top: 0.0,
            width,
            height,
        })
        .expect("resize");
        painter.set_armed(true);
        painter
    }

    #[test]
    fn single_dab_paints_circle_of_half_brush_radius() {
        let mut painter = armed_painter(120, 120);
        assert_eq!(painter.brush_size(), 40.0);

        painter.pointer_down(50.0, 50.0);
        painter.pointer_up();

        let surface = painter.layer().surface();
        for y in 0..120u32 {
            for x in 0..120u32 {
                let dx = x as f32 + 0.5 - 50.0;
                let dy = y as f32 + 0.5 - 50.0;
                let inside = dx * dx + dy * dy <= 20.0 * 20.0;
                let px = *surface.get_pixel(x, y);
                if inside {
                    assert_eq!(px, STROKE_COLOR, "pixel ({x},{y}) should be painted");
                } else {
                    assert_eq!(px, Rgba([0, 0, 0, 0]), "pixel ({x},{y}) should be empty");
                }
            }
        }
    }

    #[test]
    fn drag_paints_along_path_with_round_caps() {
        let mut painter = armed_painter(200, 100);
        painter.set_brush_size(10.0);

        painter.pointer_down(20.0, 50.0);
        painter.pointer_move(100.0, 50.0);
        painter.pointer_move(180.0, 50.0);
        painter.pointer_up();

        let surface = painter.layer().surface();
        for x in [20u32, 60, 100, 140, 179] {
            assert_eq!(*surface.get_pixel(x, 50), STROKE_COLOR);
        }
        assert_eq!(surface.get_pixel(100, 60)[3], 0);
        assert_eq!(painter.current_stroke().len(), 3);
        assert!(!painter.is_stroking());
    }

    #[test]
    fn pointer_events_ignored_when_not_armed() {
        let mut painter = armed_painter(50, 50);
        painter.set_armed(false);

        assert!(!painter.pointer_down(10.0, 10.0));
        assert!(!painter.pointer_move(20.0, 20.0));
        assert!(painter.is_blank());
    }

    #[test]
    fn move_after_up_does_not_paint() {
        let mut painter = armed_painter(50, 50);
        painter.pointer_down(5.0, 5.0);
        painter.pointer_leave();
        painter.clear();

        assert!(!painter.pointer_move(40.0, 40.0));
        assert!(painter.is_blank());
    }

    #[test]
    fn viewport_offset_is_subtracted() {
        let mut painter = MaskPainter::new(6.0, 5.0, 100.0);
        painter.resize(DisplayRect {
            left: 100.0,
            top: 40.0,
            width: 50,
            height: 50,
        })
        .expect("resize");
        painter.set_armed(true);

        painter.pointer_down(110.0, 50.0);

        assert_eq!(painter.current_stroke()[0], StrokePoint::new(10.0, 10.0));
        assert_eq!(*painter.layer().surface().get_pixel(10, 10), STROKE_COLOR);
    }

    #[test]
    fn resize_clears_and_tracks_rendered_size() {
        let mut painter = armed_painter(50, 50);
        painter.pointer_down(25.0, 25.0);
        assert!(!painter.is_blank());

        painter.resize(DisplayRect {
            left: 3.0,
            top: 4.0,
            width: 80,
            height: 60,
        })
        .expect("resize");

        assert!(painter.is_blank());
        assert_eq!(painter.layer().dimensions(), (80, 60));
        assert!(!painter.is_stroking());
    }

    #[test]
    fn oversized_display_rect_is_rejected_and_layer_left_empty() {
        let mut painter = armed_painter(50, 50).with_pixel_limit(10_000);
        painter.pointer_down(25.0, 25.0);

        let result = painter.resize(DisplayRect {
            left: 0.0,
            top: 0.0,
            width: 200,
            height: 100,
        });

        assert!(matches!(result, Err(RasterError::ResourceLimit(_))));
        assert_eq!(painter.layer().dimensions(), (0, 0));
        assert!(painter.is_blank());
        assert!(painter.pointer_down(10.0, 10.0));
        assert!(painter.is_blank());
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut painter = MaskPainter::default();

        assert_eq!(painter.set_brush_size(1.0), MIN_BRUSH_SIZE);
        assert_eq!(painter.set_brush_size(500.0), MAX_BRUSH_SIZE);
        assert_eq!(painter.set_brush_size(f32::NAN), MAX_BRUSH_SIZE);
    }

    #[test]
    fn export_keeps_display_resolution() {
        let mut painter = armed_painter(64, 48);
        painter.pointer_down(10.0, 10.0);
        let codec = BitmapCodec::new(RasterConfig::default());

        let bitmap = painter.layer().export(&codec).expect("export mask");

        assert_eq!(bitmap.dimensions(), (64, 48));
        assert_eq!(bitmap.media_type(), MediaType::Png);
    }
}
