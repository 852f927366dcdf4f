use super::value_objects::{Point, SurfaceSize};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Relative panel heights and fixed gutters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Share of the plot height given to the volume panel
    pub volume_ratio: f64,
    /// Share of the plot height given to each oscillator subplot
    pub oscillator_ratio: f64,
    /// Height of the time-axis strip, which doubles as the brush area
    pub time_axis_height: f64,
    /// Right-hand gutter for price labels
    pub price_axis_width: f64,
    pub panel_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            volume_ratio: 0.2,
            oscillator_ratio: 0.18,
            time_axis_height: 24.0,
            price_axis_width: 56.0,
            panel_gap: 4.0,
        }
    }
}

/// Split of the surface into independently scaled panels sharing one x axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelLayout {
    pub surface: SurfaceSize,
    pub price: Rect,
    pub volume: Rect,
    pub oscillators: Vec<Rect>,
    pub time_axis: Rect,
}

impl PanelLayout {
    pub fn split(surface: SurfaceSize, oscillator_count: usize, config: &LayoutConfig) -> Self {
        let width = (surface.width as f64 - config.price_axis_width).max(0.0);
        let plot_height = (surface.height as f64 - config.time_axis_height).max(0.0);

        // Oscillators may not squeeze the price panel below a third of the plot.
        let osc_total = (config.oscillator_ratio * oscillator_count as f64).min(0.5);
        let osc_ratio = if oscillator_count > 0 { osc_total / oscillator_count as f64 } else { 0.0 };
        let gap = config.panel_gap;
        let gaps = gap * (1 + oscillator_count) as f64;
        let usable = (plot_height - gaps).max(0.0);

        let volume_h = usable * config.volume_ratio;
        let osc_h = usable * osc_ratio;
        let price_h = (usable - volume_h - osc_h * oscillator_count as f64).max(0.0);

        let price = Rect::new(0.0, 0.0, width, price_h);
        let volume = Rect::new(0.0, price.bottom() + gap, width, volume_h);
        let mut cursor = volume.bottom();
        let oscillators = (0..oscillator_count)
            .map(|_| {
                let rect = Rect::new(0.0, cursor + gap, width, osc_h);
                cursor = rect.bottom();
                rect
            })
            .collect();
        let time_axis = Rect::new(0.0, plot_height, width, config.time_axis_height.min(surface.height as f64));

        Self { surface, price, volume, oscillators, time_axis }
    }

    /// Whole plotting area above the time axis
    pub fn plot(&self) -> Rect {
        Rect::new(self.price.x, self.price.y, self.price.width, self.time_axis.y)
    }

    pub fn plot_width(&self) -> f64 {
        self.price.width
    }

    pub fn in_plot(&self, p: Point) -> bool {
        self.plot().contains(p)
    }

    pub fn on_time_axis(&self, p: Point) -> bool {
        self.time_axis.contains(p)
    }
}
