use crate::domain::chart::{Color, Point, Rect};
use crate::domain::indicators::IndicatorKey;
use serde::Serialize;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter};

/// Draw layers, back to front
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, StrumDisplay, EnumIter, AsRefStr, Serialize,
)]
pub enum Layer {
    Grid,
    Volume,
    Candles,
    Overlays,
    Oscillators,
    Crosshair,
}

/// Identity of a primitive within its layer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PrimitiveId {
    /// Per-bar geometry, keyed by bar timestamp
    Bar(u64),
    /// One component line of an indicator
    Series { key: IndicatorKey, line: u8 },
    /// Grid lines and axis labels
    Guide(u32),
    /// Crosshair, tooltip and brush parts
    Cursor(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PrimitiveKey {
    pub layer: Layer,
    pub id: PrimitiveId,
}

impl PrimitiveKey {
    pub fn new(layer: Layer, id: PrimitiveId) -> Self {
        Self { layer, id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Backend-neutral geometry in surface pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    /// Body spans open..close, wick spans high..low
    Candle { x: f64, body: Rect, wick_top: f64, wick_bottom: f64, color: Color },
    Rect { rect: Rect, color: Color },
    Columns { rects: Vec<Rect>, color: Color },
    Polyline { points: Vec<Point>, color: Color, width: f64 },
    Segment { from: Point, to: Point, color: Color, width: f64, dashed: bool },
    Text { at: Point, text: String, color: Color, align: TextAlign },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    pub key: PrimitiveKey,
    pub shape: Shape,
    /// Cursor decorations never take pointer hits from the bars beneath
    pub interactive: bool,
}

impl Primitive {
    pub fn new(layer: Layer, id: PrimitiveId, shape: Shape) -> Self {
        let interactive = !matches!(layer, Layer::Grid | Layer::Crosshair);
        Self { key: PrimitiveKey::new(layer, id), shape, interactive }
    }

    pub fn layer(&self) -> Layer {
        self.key.layer
    }
}
