use crate::domain::chart::{Color, LayoutConfig, ScaleOptions, ZoomLimits};
use crate::domain::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

/// Palette for the base chart; indicator colours come from their configs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartColors {
    pub bullish: Color,
    pub bearish: Color,
    pub grid: Color,
    pub axis_text: Color,
    pub crosshair: Color,
    pub tooltip_background: Color,
    pub tooltip_text: Color,
    pub brush: Color,
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            bullish: Color::BULLISH,
            bearish: Color::BEARISH,
            grid: Color::GRID,
            axis_text: Color::AXIS_TEXT,
            crosshair: Color::CROSSHAIR,
            tooltip_background: Color::TOOLTIP_BG,
            tooltip_text: Color::WHITE,
            brush: Color::new(0.26, 0.65, 0.96, 0.25),
        }
    }
}

/// Session-wide tuning; every field has a default so partial JSON works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Visible bar count at which rendering switches to full redraws
    pub bulk_threshold: usize,
    /// Timeframe and brush animation length
    pub transition_ms: f64,
    /// Duration attached to diffed update ops
    pub update_transition_ms: f64,
    pub price_padding: f64,
    pub band_padding: f64,
    pub zoom: ZoomLimits,
    /// Zoom factor per wheel delta unit: `factor = exp(-delta * sensitivity)`
    pub wheel_sensitivity: f64,
    /// Bars panned per arrow-key press, as a fraction of the visible span
    pub key_pan_fraction: f64,
    pub key_zoom_factor: f64,
    /// Bars of indicator history computed per frame
    pub recompute_chunk_bars: usize,
    /// A wheel zoom gesture ends after this long without wheel input
    pub zoom_idle_ms: f64,
    /// Tooltip box width; it flips left of the cursor when it would overflow
    pub tooltip_width: f64,
    pub layout: LayoutConfig,
    pub colors: ChartColors,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bulk_threshold: 10_000,
            transition_ms: 300.0,
            update_transition_ms: 150.0,
            price_padding: 0.05,
            band_padding: 0.2,
            zoom: ZoomLimits::default(),
            wheel_sensitivity: 0.0015,
            key_pan_fraction: 0.1,
            key_zoom_factor: 1.25,
            recompute_chunk_bars: 5_000,
            zoom_idle_ms: 200.0,
            tooltip_width: 180.0,
            layout: LayoutConfig::default(),
            colors: ChartColors::default(),
        }
    }
}

impl ChartConfig {
    pub fn from_json(raw: &str) -> ChartResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ChartError::Config(format!("malformed chart config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChartResult<()> {
        let fail = |msg: &str| Err(ChartError::Config(msg.to_string()));
        if self.bulk_threshold == 0 {
            return fail("bulk_threshold must be positive");
        }
        if self.recompute_chunk_bars == 0 {
            return fail("recompute_chunk_bars must be positive");
        }
        if !(0.0..1.0).contains(&self.price_padding) {
            return fail("price_padding must be in [0, 1)");
        }
        if !(0.0..1.0).contains(&self.band_padding) {
            return fail("band_padding must be in [0, 1)");
        }
        if self.zoom.min_zoom < 1.0 || self.zoom.max_zoom < self.zoom.min_zoom {
            return fail("zoom bounds must satisfy 1 <= min_zoom <= max_zoom");
        }
        if self.zoom.min_visible_bars < 1.0 {
            return fail("min_visible_bars must be at least 1");
        }
        if self.transition_ms < 0.0 || self.update_transition_ms < 0.0 || self.zoom_idle_ms < 0.0 {
            return fail("durations must not be negative");
        }
        if self.key_zoom_factor <= 1.0 || self.wheel_sensitivity <= 0.0 {
            return fail("zoom steps must enlarge");
        }
        let layout = &self.layout;
        if layout.volume_ratio < 0.0 || layout.oscillator_ratio < 0.0 || layout.volume_ratio >= 0.8 {
            return fail("panel ratios out of range");
        }
        Ok(())
    }

    pub fn scale_options(&self) -> ScaleOptions {
        ScaleOptions { price_padding: self.price_padding, band_padding: self.band_padding }
    }
}
