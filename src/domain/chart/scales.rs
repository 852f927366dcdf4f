//! Pixel mapping shared by all panels.
//!
//! Everything here is recomputed from scratch each frame; a [`ScaleSet`] holds
//! no state beyond what [`ScaleCoordinator::compute`] was given.

use super::layout::{PanelLayout, Rect};
use super::viewport::Viewport;
use crate::domain::indicators::{IndicatorEngine, IndicatorKey, IndicatorKind, Placement};
use crate::domain::indicators::series::points_in_range;
use crate::domain::market_data::BarSeries;
use serde::{Deserialize, Serialize};

/// Horizontal scale: one band per bar, shared by every panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    start: f64,
    span: f64,
    plot_x: f64,
    plot_width: f64,
    band_padding: f64,
    lo: usize,
    hi: usize,
}

impl BandScale {
    pub fn band_width(&self) -> f64 {
        if self.span > 0.0 { self.plot_width / self.span } else { 0.0 }
    }

    /// Candle body width after inter-band padding
    pub fn body_width(&self) -> f64 {
        self.band_width() * (1.0 - self.band_padding)
    }

    /// Centre pixel of bar `index`
    pub fn x(&self, index: usize) -> f64 {
        self.x_fractional(index as f64)
    }

    pub fn x_fractional(&self, position: f64) -> f64 {
        self.plot_x + (position + 0.5 - self.start) * self.band_width()
    }

    /// Bar whose centre is nearest to `px`, limited to the visible range
    pub fn index_at(&self, px: f64) -> Option<usize> {
        let band = self.band_width();
        if band <= 0.0 || px < self.plot_x || px > self.plot_x + self.plot_width {
            return None;
        }
        let raw = ((px - self.plot_x) / band + self.start - 0.5).round();
        Some((raw.max(0.0) as usize).clamp(self.lo, self.hi))
    }

    pub fn visible(&self) -> (usize, usize) {
        (self.lo, self.hi)
    }
}

/// Vertical linear scale; larger values are drawn higher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    pub min: f64,
    pub max: f64,
    pub top: f64,
    pub bottom: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), rect: &Rect) -> Self {
        Self { min: domain.0, max: domain.1, top: rect.y, bottom: rect.bottom() }
    }

    pub fn y(&self, value: f64) -> f64 {
        let extent = self.max - self.min;
        if extent <= 0.0 {
            return (self.top + self.bottom) / 2.0;
        }
        self.bottom - (value - self.min) / extent * (self.bottom - self.top)
    }

    pub fn value_at(&self, y: f64) -> f64 {
        let height = self.bottom - self.top;
        if height <= 0.0 {
            return self.min;
        }
        self.min + (self.bottom - y) / height * (self.max - self.min)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Subplot scale for one oscillator
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorScale {
    pub key: IndicatorKey,
    pub kind: IndicatorKind,
    pub rect: Rect,
    pub scale: LinearScale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSet {
    pub x: BandScale,
    pub price: LinearScale,
    pub volume: LinearScale,
    pub oscillators: Vec<OscillatorScale>,
    pub layout: PanelLayout,
}

impl ScaleSet {
    pub fn visible(&self) -> (usize, usize) {
        self.x.visible()
    }

    pub fn oscillator(&self, key: &IndicatorKey) -> Option<&OscillatorScale> {
        self.oscillators.iter().find(|o| &o.key == key)
    }
}

/// Knobs the scale computation reads from the chart configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOptions {
    /// Fraction of the visible price extent added above and below
    pub price_padding: f64,
    /// Fraction of each band left empty between candles
    pub band_padding: f64,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self { price_padding: 0.05, band_padding: 0.2 }
    }
}

pub struct ScaleCoordinator;

impl ScaleCoordinator {
    /// Scales for the current frame, or `None` when there is nothing to map
    pub fn compute(
        viewport: &Viewport,
        series: &BarSeries,
        engine: &IndicatorEngine,
        layout: &PanelLayout,
        options: &ScaleOptions,
    ) -> Option<ScaleSet> {
        let (lo, hi) = viewport.range()?;
        if layout.price.is_empty() {
            return None;
        }

        let x = BandScale {
            start: viewport.start(),
            span: viewport.span(),
            plot_x: layout.price.x,
            plot_width: layout.plot_width(),
            band_padding: options.band_padding.clamp(0.0, 0.95),
            lo,
            hi,
        };

        let (low, high) = series.price_range(lo, hi)?;
        let price = LinearScale::new(pad_domain(low, high, options.price_padding), &layout.price);

        let max_volume = series.max_volume(lo, hi).unwrap_or(0.0);
        let volume = LinearScale::new((0.0, if max_volume > 0.0 { max_volume } else { 1.0 }), &layout.volume);

        let oscillators = engine
            .visible_with(series.len(), Placement::Oscillator)
            .into_iter()
            .zip(layout.oscillators.iter())
            .map(|(view, rect)| {
                let domain = match view.config.kind {
                    IndicatorKind::Rsi { .. } => (0.0, 100.0),
                    _ => {
                        let extent = points_in_range(view.points, lo, hi)
                            .iter()
                            .map(|p| p.value.max_abs())
                            .fold(0.0, f64::max);
                        let extent = if extent > 0.0 { extent * (1.0 + options.price_padding) } else { 1.0 };
                        (-extent, extent)
                    }
                };
                OscillatorScale {
                    key: view.key.clone(),
                    kind: view.config.kind,
                    rect: *rect,
                    scale: LinearScale::new(domain, rect),
                }
            })
            .collect();

        Some(ScaleSet { x, price, volume, oscillators, layout: layout.clone() })
    }
}

/// Expand `[low, high]` by `padding` of its extent; a flat range gets a
/// small absolute margin so the domain is never empty
fn pad_domain(low: f64, high: f64, padding: f64) -> (f64, f64) {
    let extent = high - low;
    let pad = if extent > 0.0 {
        extent * padding
    } else {
        (high.abs() * padding).max(f64::EPSILON.sqrt())
    };
    (low - pad, high + pad)
}
