use super::retained_scene::{RenderedPrimitive, RetainedScene};
use crate::application::render_pipeline::{
    ImmediateSurface, Primitive, RenderTarget, RetainedOp, RetainedSurface, Shape, TextAlign,
};
use crate::domain::chart::{Color, SurfaceSize};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const COMPONENT: LogComponent = LogComponent::Infrastructure("CanvasTarget");
const FONT: &str = "11px sans-serif";

/// Canvas 2D backend. Bulk frames paint straight through; diffed frames are
/// folded into a retained scene and repainted with tween state on present.
pub struct CanvasTarget {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    scene: RetainedScene,
    size: SurfaceSize,
    repaint_retained: bool,
}

impl CanvasTarget {
    pub fn from_canvas(canvas: HtmlCanvasElement) -> ChartResult<Self> {
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| ChartError::SurfaceUnavailable { width: canvas.width(), height: canvas.height() })?;
        let size = SurfaceSize::new(canvas.width(), canvas.height());
        log_debug!(COMPONENT, "2d context acquired {}x{}", size.width, size.height);
        Ok(Self { canvas, context, scene: RetainedScene::new(), size, repaint_retained: false })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.size = size;
        self.repaint_retained = true;
    }

    /// Retained tweens still running
    pub fn is_animating(&self) -> bool {
        self.scene.animating() > 0
    }

    /// Move the retained scene clock; call before each frame is issued
    pub fn advance(&mut self, now_ms: f64) {
        self.scene.advance(now_ms);
    }

    /// Repaint tween state between frames; no-op in bulk mode
    pub fn repaint(&mut self) {
        if self.repaint_retained {
            self.paint_scene();
        }
    }

    fn paint_scene(&self) {
        self.context.clear_rect(0.0, 0.0, self.size.width as f64, self.size.height as f64);
        for (_, RenderedPrimitive { shape, opacity }) in self.scene.snapshot() {
            self.paint(&shape, opacity);
        }
        self.context.set_global_alpha(1.0);
    }

    fn paint(&self, shape: &Shape, opacity: f64) {
        let ctx = &self.context;
        ctx.set_global_alpha(opacity.clamp(0.0, 1.0));
        match shape {
            Shape::Candle { x, body, wick_top, wick_bottom, color } => {
                self.stroke_style(*color);
                ctx.set_line_width(1.0);
                ctx.begin_path();
                ctx.move_to(*x, *wick_top);
                ctx.line_to(*x, *wick_bottom);
                ctx.stroke();
                self.fill_style(*color);
                ctx.fill_rect(body.x, body.y, body.width, body.height);
            }
            Shape::Rect { rect, color } => {
                self.fill_style(*color);
                ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            }
            Shape::Columns { rects, color } => {
                self.fill_style(*color);
                for rect in rects {
                    ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                }
            }
            Shape::Polyline { points, color, width } => {
                let Some((first, rest)) = points.split_first() else {
                    return;
                };
                self.stroke_style(*color);
                ctx.set_line_width(*width);
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for p in rest {
                    ctx.line_to(p.x, p.y);
                }
                ctx.stroke();
            }
            Shape::Segment { from, to, color, width, dashed } => {
                self.stroke_style(*color);
                ctx.set_line_width(*width);
                let dash = js_sys::Array::new();
                if *dashed {
                    dash.push(&JsValue::from_f64(4.0));
                    dash.push(&JsValue::from_f64(4.0));
                }
                if ctx.set_line_dash(&dash).is_err() {
                    log_warn!(COMPONENT, "line dash rejected");
                }
                ctx.begin_path();
                ctx.move_to(from.x, from.y);
                ctx.line_to(to.x, to.y);
                ctx.stroke();
                let _ = ctx.set_line_dash(&js_sys::Array::new());
            }
            Shape::Text { at, text, color, align } => {
                self.fill_style(*color);
                ctx.set_font(FONT);
                ctx.set_text_align(match align {
                    TextAlign::Left => "left",
                    TextAlign::Center => "center",
                    TextAlign::Right => "right",
                });
                ctx.set_text_baseline("middle");
                if ctx.fill_text(text, at.x, at.y).is_err() {
                    log_warn!(COMPONENT, "fill_text failed for {:?}", text);
                }
            }
        }
    }

    fn fill_style(&self, color: Color) {
        #[allow(deprecated)]
        self.context.set_fill_style(&JsValue::from_str(&color.to_css()));
    }

    fn stroke_style(&self, color: Color) {
        #[allow(deprecated)]
        self.context.set_stroke_style(&JsValue::from_str(&color.to_css()));
    }
}

impl ImmediateSurface for CanvasTarget {
    fn clear(&mut self, size: SurfaceSize) {
        self.repaint_retained = false;
        self.context.set_global_alpha(1.0);
        self.context.clear_rect(0.0, 0.0, size.width as f64, size.height as f64);
    }

    fn draw(&mut self, primitive: &Primitive) {
        self.paint(&primitive.shape, 1.0);
    }
}

impl RetainedSurface for CanvasTarget {
    fn apply(&mut self, op: &RetainedOp) {
        self.repaint_retained = true;
        self.scene.apply(op);
    }

    fn clear_retained(&mut self) {
        self.scene.clear_retained();
    }
}

impl RenderTarget for CanvasTarget {
    fn immediate(&mut self) -> &mut dyn ImmediateSurface {
        self
    }

    fn retained(&mut self) -> &mut dyn RetainedSurface {
        self
    }

    fn present(&mut self) {
        if self.repaint_retained {
            self.paint_scene();
        } else {
            self.context.set_global_alpha(1.0);
        }
    }
}
