use super::config::IndicatorKey;
use serde::{Deserialize, Serialize};

/// Value(s) of one indicator at one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Line(f64),
    Macd { macd: f64, signal: f64, histogram: f64 },
    Bands { upper: f64, middle: f64, lower: f64 },
}

impl IndicatorValue {
    /// Components in the same order as `IndicatorKind::line_names`
    pub fn components(&self) -> Vec<f64> {
        match *self {
            Self::Line(v) => vec![v],
            Self::Macd { macd, signal, histogram } => vec![macd, signal, histogram],
            Self::Bands { upper, middle, lower } => vec![upper, middle, lower],
        }
    }

    pub fn component(&self, slot: usize) -> Option<f64> {
        self.components().get(slot).copied()
    }

    pub fn max_abs(&self) -> f64 {
        self.components().into_iter().map(f64::abs).fold(0.0, f64::max)
    }
}

/// One indicator value anchored to a bar index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub index: usize,
    pub value: IndicatorValue,
}

/// Owned, serializable snapshot of a computed series.
///
/// This is also the schema for indicator series computed elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub key: IndicatorKey,
    pub offset: usize,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<&IndicatorValue> {
        value_at(&self.points, index)
    }
}

/// Lookup in a contiguous run of points; `None` before the warm-up offset
pub fn value_at(points: &[IndicatorPoint], index: usize) -> Option<&IndicatorValue> {
    let first = points.first()?.index;
    let slot = index.checked_sub(first)?;
    points.get(slot).map(|p| &p.value)
}

/// Points whose bar index lies in `[lo, hi]`
pub fn points_in_range(points: &[IndicatorPoint], lo: usize, hi: usize) -> &[IndicatorPoint] {
    let start = points.partition_point(|p| p.index < lo);
    let end = points.partition_point(|p| p.index <= hi);
    &points[start..end.max(start)]
}
