//! Flat, `Pod` instance data for bulk drawing.
//!
//! Everything is kept in surface pixels; `SurfaceUniforms` maps pixels to
//! clip space so a GPU backend can upload the buffers unchanged.

use crate::application::render_pipeline::{ImmediateSurface, Primitive, Shape, TextAlign};
use crate::domain::chart::{Color, Point, Rect, SurfaceSize};
use bytemuck::{Pod, Zeroable};

/// Wick width in pixels
const WICK_WIDTH: f32 = 1.0;
/// Dash and gap length for dashed segments
const DASH: f64 = 4.0;

/// One axis-aligned filled rectangle
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
}

impl RectInstance {
    pub fn new(rect: &Rect, color: Color) -> Self {
        Self {
            origin: [rect.x as f32, rect.y as f32],
            size: [rect.width as f32, rect.height as f32],
            color: color.to_array(),
        }
    }
}

/// Endpoint of a line-list segment; vertices come in pairs
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl LineVertex {
    fn new(p: Point, color: Color) -> Self {
        Self { position: [p.x as f32, p.y as f32], color: color.to_array() }
    }
}

/// Pixel to clip-space transform: `clip = pos * scale + offset`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl SurfaceUniforms {
    pub fn for_size(size: SurfaceSize) -> Self {
        let w = size.width.max(1) as f32;
        let h = size.height.max(1) as f32;
        Self { scale: [2.0 / w, -2.0 / h], offset: [-1.0, 1.0] }
    }
}

/// Text is not instanced; backends lay it out themselves
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub at: Point,
    pub text: String,
    pub color: Color,
    pub align: TextAlign,
}

/// Immediate surface that flattens primitives into upload-ready buffers
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    size: SurfaceSize,
    rects: Vec<RectInstance>,
    lines: Vec<LineVertex>,
    texts: Vec<TextRun>,
    draws: usize,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn rects(&self) -> &[RectInstance] {
        &self.rects
    }

    pub fn lines(&self) -> &[LineVertex] {
        &self.lines
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    /// Primitives drawn since the last clear
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    pub fn rect_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rects)
    }

    pub fn line_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lines)
    }

    pub fn uniforms(&self) -> SurfaceUniforms {
        SurfaceUniforms::for_size(self.size)
    }

    fn push_segment(&mut self, from: Point, to: Point, color: Color) {
        self.lines.push(LineVertex::new(from, color));
        self.lines.push(LineVertex::new(to, color));
    }

    fn push_dashed(&mut self, from: Point, to: Point, color: Color) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let length = (dx * dx + dy * dy).sqrt();
        if length <= DASH {
            self.push_segment(from, to, color);
            return;
        }
        let (ux, uy) = (dx / length, dy / length);
        let mut t = 0.0;
        while t < length {
            let end = (t + DASH).min(length);
            self.push_segment(
                Point::new(from.x + ux * t, from.y + uy * t),
                Point::new(from.x + ux * end, from.y + uy * end),
                color,
            );
            t += 2.0 * DASH;
        }
    }
}

impl ImmediateSurface for InstanceBuffer {
    fn clear(&mut self, size: SurfaceSize) {
        self.size = size;
        self.rects.clear();
        self.lines.clear();
        self.texts.clear();
        self.draws = 0;
    }

    fn draw(&mut self, primitive: &Primitive) {
        self.draws += 1;
        match &primitive.shape {
            Shape::Candle { x, body, wick_top, wick_bottom, color } => {
                let wick = Rect::new(
                    x - WICK_WIDTH as f64 / 2.0,
                    *wick_top,
                    WICK_WIDTH as f64,
                    (wick_bottom - wick_top).max(0.0),
                );
                self.rects.push(RectInstance::new(&wick, *color));
                self.rects.push(RectInstance::new(body, *color));
            }
            Shape::Rect { rect, color } => self.rects.push(RectInstance::new(rect, *color)),
            Shape::Columns { rects, color } => {
                self.rects.extend(rects.iter().map(|r| RectInstance::new(r, *color)));
            }
            Shape::Polyline { points, color, .. } => {
                for pair in points.windows(2) {
                    self.push_segment(pair[0], pair[1], *color);
                }
            }
            Shape::Segment { from, to, color, dashed, .. } => {
                if *dashed {
                    self.push_dashed(*from, *to, *color);
                } else {
                    self.push_segment(*from, *to, *color);
                }
            }
            Shape::Text { at, text, color, align } => self.texts.push(TextRun {
                at: *at,
                text: text.clone(),
                color: *color,
                align: *align,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render_pipeline::{Layer, PrimitiveId};

    #[test]
    fn candle_expands_to_wick_and_body() {
        let mut buffer = InstanceBuffer::new();
        buffer.clear(SurfaceSize::new(100, 50));
        let candle = Primitive::new(
            Layer::Candles,
            PrimitiveId::Bar(1),
            Shape::Candle {
                x: 10.0,
                body: Rect::new(8.0, 20.0, 4.0, 10.0),
                wick_top: 5.0,
                wick_bottom: 40.0,
                color: Color::from_hex(0x26a69a),
            },
        );
        buffer.draw(&candle);
        assert_eq!(buffer.rects().len(), 2);
        assert_eq!(buffer.rects()[0].size, [1.0, 35.0]);
        assert_eq!(buffer.rect_bytes().len(), 2 * std::mem::size_of::<RectInstance>());
    }

    #[test]
    fn dashed_segment_is_split() {
        let mut buffer = InstanceBuffer::new();
        let seg = Primitive::new(
            Layer::Crosshair,
            PrimitiveId::Cursor(1),
            Shape::Segment {
                from: Point::new(0.0, 0.0),
                to: Point::new(32.0, 0.0),
                color: Color::from_hex(0xffffff),
                width: 1.0,
                dashed: true,
            },
        );
        buffer.draw(&seg);
        assert_eq!(buffer.lines().len(), 8);
    }

    #[test]
    fn uniforms_map_corners_to_clip_space() {
        let u = SurfaceUniforms::for_size(SurfaceSize::new(200, 100));
        let clip = |x: f32, y: f32| [x * u.scale[0] + u.offset[0], y * u.scale[1] + u.offset[1]];
        assert_eq!(clip(0.0, 0.0), [-1.0, 1.0]);
        assert_eq!(clip(200.0, 100.0), [1.0, -1.0]);
    }
}
