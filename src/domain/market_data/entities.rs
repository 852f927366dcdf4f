pub use super::value_objects::{OHLCV, Price, Timestamp, Volume};
use super::services::DataValidationService;
use crate::domain::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

/// Domain entity - one OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub ohlcv: OHLCV,
}

impl Bar {
    pub fn new(timestamp: Timestamp, ohlcv: OHLCV) -> Self {
        Self { timestamp, ohlcv }
    }

    /// Up bars are drawn with the bullish colour; a flat bar counts as up.
    pub fn is_up(&self) -> bool {
        self.ohlcv.close >= self.ohlcv.open
    }

    pub fn close(&self) -> f64 {
        self.ohlcv.close.value()
    }
}

/// How a streaming mutation changed the series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesChange {
    Appended,
    LastUpdated,
}

/// Domain entity - ascending, append-only bar series.
///
/// Only the trailing bar may be revised; anything before it is committed.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
    validator: DataValidationService,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from a batch, dropping every malformed bar.
    ///
    /// Returns the accepted series together with one error per rejected bar.
    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> (Self, Vec<ChartError>) {
        let mut series = Self::new();
        let mut rejected = Vec::new();
        for bar in bars {
            if let Err(e) = series.append(bar) {
                rejected.push(e);
            }
        }
        (series, rejected)
    }

    pub fn append(&mut self, bar: Bar) -> ChartResult<SeriesChange> {
        self.validator.validate_append(self.bars.last(), &bar)?;
        self.bars.push(bar);
        Ok(SeriesChange::Appended)
    }

    pub fn update_last(&mut self, bar: Bar) -> ChartResult<SeriesChange> {
        self.validator.validate_update(self.bars.last(), &bar)?;
        if let Some(last) = self.bars.last_mut() {
            *last = bar;
        }
        Ok(SeriesChange::LastUpdated)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::close).collect()
    }

    /// First index whose timestamp is at or after `ts`
    pub fn index_at_or_after(&self, ts: u64) -> usize {
        self.bars.partition_point(|b| b.timestamp.value() < ts)
    }

    /// Lowest low and highest high over the inclusive index range
    pub fn price_range(&self, lo: usize, hi: usize) -> Option<(f64, f64)> {
        let slice = self.slice(lo, hi)?;
        let mut min_price = f64::INFINITY;
        let mut max_price = f64::NEG_INFINITY;
        for bar in slice {
            min_price = min_price.min(bar.ohlcv.low.value());
            max_price = max_price.max(bar.ohlcv.high.value());
        }
        Some((min_price, max_price))
    }

    /// Largest volume over the inclusive index range
    pub fn max_volume(&self, lo: usize, hi: usize) -> Option<f64> {
        self.slice(lo, hi)
            .map(|s| s.iter().map(|b| b.ohlcv.volume.value()).fold(0.0, f64::max))
    }

    fn slice(&self, lo: usize, hi: usize) -> Option<&[Bar]> {
        if self.bars.is_empty() || lo > hi {
            return None;
        }
        let hi = hi.min(self.bars.len() - 1);
        self.bars.get(lo..=hi)
    }
}
