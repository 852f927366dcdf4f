//! Pure scene construction: (data, scales, cursor) -> primitives in draw order.

use super::primitives::{Layer, Primitive, PrimitiveId, Shape, TextAlign};
use crate::config::ChartConfig;
use crate::domain::chart::{Color, CrosshairState, Point, Rect, ScaleSet, TooltipContent};
use crate::domain::indicators::series::points_in_range;
use crate::domain::indicators::{IndicatorEngine, IndicatorKind, IndicatorView, Placement};
use crate::domain::market_data::{Bar, BarSeries};
use crate::time_utils::{format_time_label, tick_indices};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Visible bars above which candle geometry is built on the rayon pool
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 2_000;

const PRICE_TICKS: usize = 5;
const TIME_TICKS: usize = 6;
const TOOLTIP_OFFSET: f64 = 12.0;
const TOOLTIP_LINE_HEIGHT: f64 = 16.0;

/// Everything one frame is drawn from
pub struct SceneInput<'a> {
    pub series: &'a BarSeries,
    pub engine: &'a IndicatorEngine,
    pub scales: &'a ScaleSet,
    pub crosshair: Option<&'a CrosshairState>,
    /// Brush selection as pixel x extents
    pub brush: Option<(f64, f64)>,
    pub config: &'a ChartConfig,
}

pub fn build_scene(input: &SceneInput<'_>) -> Vec<Primitive> {
    let (lo, hi) = input.scales.visible();
    let bars = &input.series.bars()[lo..=hi.min(input.series.len().saturating_sub(1))];

    let mut scene = grid(input);
    scene.extend(volume(bars, input));
    scene.extend(candles(bars, input));
    for view in input.engine.visible_with(input.series.len(), Placement::Overlay) {
        scene.extend(overlay(&view, input));
    }
    for view in input.engine.visible_with(input.series.len(), Placement::Oscillator) {
        scene.extend(oscillator(&view, input));
    }
    scene.extend(cursor(input));
    scene.sort_by_key(Primitive::layer);
    scene
}

fn grid(input: &SceneInput<'_>) -> Vec<Primitive> {
    let scales = input.scales;
    let colors = &input.config.colors;
    let price = scales.layout.price;
    let mut out = Vec::new();

    let (min, max) = scales.price.domain();
    for i in 0..PRICE_TICKS {
        let value = min + (max - min) * (i as f64 + 0.5) / PRICE_TICKS as f64;
        let y = scales.price.y(value);
        out.push(Primitive::new(
            Layer::Grid,
            PrimitiveId::Guide(i as u32),
            Shape::Segment {
                from: Point::new(price.x, y),
                to: Point::new(price.right(), y),
                color: colors.grid,
                width: 1.0,
                dashed: false,
            },
        ));
        out.push(Primitive::new(
            Layer::Grid,
            PrimitiveId::Guide(100 + i as u32),
            Shape::Text {
                at: Point::new(price.right() + 4.0, y),
                text: format!("{:.2}", value),
                color: colors.axis_text,
                align: TextAlign::Left,
            },
        ));
    }

    let (lo, hi) = scales.visible();
    let span_ms = match (input.series.get(lo), input.series.get(hi)) {
        (Some(a), Some(b)) => b.timestamp.value().saturating_sub(a.timestamp.value()),
        _ => 0,
    };
    let axis = scales.layout.time_axis;
    for (slot, index) in tick_indices(lo, hi, TIME_TICKS).into_iter().enumerate() {
        let Some(bar) = input.series.get(index) else { continue };
        let x = scales.x.x(index);
        out.push(Primitive::new(
            Layer::Grid,
            PrimitiveId::Guide(200 + slot as u32),
            Shape::Segment {
                from: Point::new(x, price.y),
                to: Point::new(x, axis.y),
                color: colors.grid,
                width: 1.0,
                dashed: false,
            },
        ));
        out.push(Primitive::new(
            Layer::Grid,
            PrimitiveId::Guide(300 + slot as u32),
            Shape::Text {
                at: Point::new(x, axis.y + axis.height / 2.0),
                text: format_time_label(bar.timestamp.value(), span_ms),
                color: colors.axis_text,
                align: TextAlign::Center,
            },
        ));
    }
    out
}

fn bar_color(bar: &Bar, input: &SceneInput<'_>) -> Color {
    if bar.is_up() { input.config.colors.bullish } else { input.config.colors.bearish }
}

fn volume(bars: &[Bar], input: &SceneInput<'_>) -> Vec<Primitive> {
    let scales = input.scales;
    let (lo, _) = scales.visible();
    let width = scales.x.body_width();
    let base = scales.volume.y(0.0);
    bars.iter()
        .enumerate()
        .map(|(offset, bar)| {
            let x = scales.x.x(lo + offset);
            let top = scales.volume.y(bar.ohlcv.volume.value());
            Primitive::new(
                Layer::Volume,
                PrimitiveId::Bar(bar.timestamp.value()),
                Shape::Rect {
                    rect: Rect::new(x - width / 2.0, top, width, base - top),
                    color: bar_color(bar, input).with_alpha(0.5),
                },
            )
        })
        .collect()
}

fn candle(index: usize, bar: &Bar, input: &SceneInput<'_>) -> Primitive {
    let scales = input.scales;
    let x = scales.x.x(index);
    let width = scales.x.body_width();
    let o = &bar.ohlcv;
    let open_y = scales.price.y(o.open.value());
    let close_y = scales.price.y(o.close.value());
    let top = open_y.min(close_y);
    // Doji bodies keep one visible pixel
    let height = (open_y - close_y).abs().max(1.0);
    Primitive::new(
        Layer::Candles,
        PrimitiveId::Bar(bar.timestamp.value()),
        Shape::Candle {
            x,
            body: Rect::new(x - width / 2.0, top, width, height),
            wick_top: scales.price.y(o.high.value()),
            wick_bottom: scales.price.y(o.low.value()),
            color: bar_color(bar, input),
        },
    )
}

fn candles(bars: &[Bar], input: &SceneInput<'_>) -> Vec<Primitive> {
    let (lo, _) = input.scales.visible();

    #[cfg(feature = "parallel")]
    if bars.len() >= PARALLEL_THRESHOLD {
        return bars.par_iter().enumerate().map(|(offset, bar)| candle(lo + offset, bar, input)).collect();
    }

    bars.iter().enumerate().map(|(offset, bar)| candle(lo + offset, bar, input)).collect()
}

fn polyline(view: &IndicatorView<'_>, slot: usize, input: &SceneInput<'_>, y: impl Fn(f64) -> f64) -> Vec<Point> {
    let (lo, hi) = input.scales.visible();
    points_in_range(view.points, lo, hi)
        .iter()
        .filter_map(|p| p.value.component(slot).map(|v| Point::new(input.scales.x.x(p.index), y(v))))
        .collect()
}

fn overlay(view: &IndicatorView<'_>, input: &SceneInput<'_>) -> Vec<Primitive> {
    let color = view.config.color();
    let price = input.scales.price;
    view.config
        .kind
        .line_names()
        .iter()
        .enumerate()
        .map(|(slot, name)| {
            let line_color = if *name == "upper" || *name == "lower" { color.with_alpha(0.6) } else { color };
            Primitive::new(
                Layer::Overlays,
                PrimitiveId::Series { key: view.key.clone(), line: slot as u8 },
                Shape::Polyline { points: polyline(view, slot, input, |v| price.y(v)), color: line_color, width: 1.5 },
            )
        })
        .collect()
}

fn oscillator(view: &IndicatorView<'_>, input: &SceneInput<'_>) -> Vec<Primitive> {
    let Some(panel) = input.scales.oscillator(view.key) else {
        return Vec::new();
    };
    let scale = panel.scale;
    let rect = panel.rect;
    let color = view.config.color();
    let id = |line: u8| PrimitiveId::Series { key: view.key.clone(), line };
    let guide = |line: u8, value: f64| {
        let y = scale.y(value);
        Primitive::new(
            Layer::Oscillators,
            id(line),
            Shape::Segment {
                from: Point::new(rect.x, y),
                to: Point::new(rect.right(), y),
                color: input.config.colors.grid,
                width: 1.0,
                dashed: true,
            },
        )
    };

    match view.config.kind {
        IndicatorKind::Macd { .. } => {
            let (lo, hi) = input.scales.visible();
            let width = input.scales.x.body_width();
            let zero = scale.y(0.0);
            let rects = points_in_range(view.points, lo, hi)
                .iter()
                .filter_map(|p| {
                    let y = scale.y(p.value.component(2)?);
                    let x = input.scales.x.x(p.index);
                    Some(Rect::new(x - width / 2.0, y.min(zero), width, (y - zero).abs()))
                })
                .collect();
            vec![
                guide(10, 0.0),
                Primitive::new(Layer::Oscillators, id(2), Shape::Columns { rects, color: color.with_alpha(0.4) }),
                Primitive::new(
                    Layer::Oscillators,
                    id(0),
                    Shape::Polyline { points: polyline(view, 0, input, |v| scale.y(v)), color, width: 1.5 },
                ),
                Primitive::new(
                    Layer::Oscillators,
                    id(1),
                    Shape::Polyline {
                        points: polyline(view, 1, input, |v| scale.y(v)),
                        color: input.config.colors.axis_text,
                        width: 1.0,
                    },
                ),
            ]
        }
        _ => vec![
            guide(10, 30.0),
            guide(11, 70.0),
            Primitive::new(
                Layer::Oscillators,
                id(0),
                Shape::Polyline { points: polyline(view, 0, input, |v| scale.y(v)), color, width: 1.5 },
            ),
        ],
    }
}

/// Crosshair lines, tooltip and brush selection; all non-interactive
fn cursor(input: &SceneInput<'_>) -> Vec<Primitive> {
    let scales = input.scales;
    let colors = &input.config.colors;
    let plot = scales.layout.plot();
    let mut out = Vec::new();

    if let Some((a, b)) = input.brush {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        out.push(Primitive::new(
            Layer::Crosshair,
            PrimitiveId::Cursor(0),
            Shape::Rect { rect: Rect::new(left, plot.y, right - left, plot.height), color: colors.brush },
        ));
    }

    let Some(crosshair) = input.crosshair else {
        return out;
    };
    let at = crosshair.position;
    let line = |id: usize, from: Point, to: Point| {
        Primitive::new(
            Layer::Crosshair,
            PrimitiveId::Cursor(id),
            Shape::Segment { from, to, color: colors.crosshair, width: 1.0, dashed: true },
        )
    };
    out.push(line(1, Point::new(at.x, plot.y), Point::new(at.x, plot.bottom())));
    out.push(line(2, Point::new(plot.x, at.y), Point::new(plot.right(), at.y)));

    let Some(content) = crosshair.index.and_then(|i| TooltipContent::build(input.series, input.engine, i)) else {
        return out;
    };
    let lines = content.lines();
    let width = input.config.tooltip_width;
    let height = TOOLTIP_LINE_HEIGHT * lines.len() as f64 + 8.0;
    let rect = tooltip_rect(at, width, height, &plot);
    out.push(Primitive::new(
        Layer::Crosshair,
        PrimitiveId::Cursor(3),
        Shape::Rect { rect, color: colors.tooltip_background },
    ));
    out.extend(lines.into_iter().enumerate().map(|(i, text)| {
        Primitive::new(
            Layer::Crosshair,
            PrimitiveId::Cursor(4 + i),
            Shape::Text {
                at: Point::new(rect.x + 8.0, rect.y + 4.0 + TOOLTIP_LINE_HEIGHT * (i as f64 + 0.5)),
                text,
                color: colors.tooltip_text,
                align: TextAlign::Left,
            },
        )
    }));
    out
}

/// Tooltip box right of the cursor, flipped left when it would overflow the plot
pub fn tooltip_rect(at: Point, width: f64, height: f64, plot: &Rect) -> Rect {
    let x = if at.x + TOOLTIP_OFFSET + width > plot.right() {
        at.x - TOOLTIP_OFFSET - width
    } else {
        at.x + TOOLTIP_OFFSET
    };
    let y = (at.y + TOOLTIP_OFFSET).min(plot.bottom() - height).max(plot.y);
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_flips_near_right_edge() {
        let plot = Rect::new(0.0, 0.0, 800.0, 600.0);
        let left = tooltip_rect(Point::new(100.0, 100.0), 180.0, 80.0, &plot);
        assert_eq!(left.x, 112.0);
        let flipped = tooltip_rect(Point::new(700.0, 100.0), 180.0, 80.0, &plot);
        assert_eq!(flipped.x, 508.0);
        let low = tooltip_rect(Point::new(100.0, 590.0), 180.0, 80.0, &plot);
        assert_eq!(low.bottom(), 600.0);
    }
}
