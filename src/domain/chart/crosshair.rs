use super::scales::ScaleSet;
use super::value_objects::{Color, Point};
use crate::domain::indicators::IndicatorEngine;
use crate::domain::market_data::{BarSeries, OHLCV, Timestamp};
use serde::Serialize;

/// Pointer inspection state; absent while the pointer is outside the plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrosshairState {
    /// Nearest bar, `None` when the plot holds no bars
    pub index: Option<usize>,
    /// Pointer position, x snapped to the bar centre
    pub position: Point,
}

impl CrosshairState {
    /// Snap a pointer position to the nearest visible bar
    pub fn snap(scales: &ScaleSet, pointer: Point) -> Option<Self> {
        if !scales.layout.in_plot(pointer) {
            return None;
        }
        let index = scales.x.index_at(pointer.x);
        let x = index.map_or(pointer.x, |i| scales.x.x(i));
        Some(Self { index, position: Point::new(x, pointer.y) })
    }
}

/// One indicator line in the tooltip; `value` is `None` before warm-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipLine {
    pub label: String,
    pub color: Color,
    pub value: Option<Vec<f64>>,
}

impl TooltipLine {
    pub fn text(&self) -> String {
        match &self.value {
            Some(values) => {
                let parts: Vec<String> = values.iter().map(|v| format!("{:.2}", v)).collect();
                format!("{}: {}", self.label, parts.join(" / "))
            }
            None => format!("{}: unavailable", self.label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub index: usize,
    pub timestamp: Timestamp,
    pub ohlcv: OHLCV,
    pub indicators: Vec<TooltipLine>,
}

impl TooltipContent {
    /// OHLCV of bar `index` plus every visible indicator's value there
    pub fn build(series: &BarSeries, engine: &IndicatorEngine, index: usize) -> Option<Self> {
        let bar = series.get(index)?;
        let indicators = engine
            .configs()
            .filter(|c| c.visible)
            .map(|config| {
                let key = config.key();
                TooltipLine {
                    value: engine.value_at(&key, index).map(|v| v.components()),
                    label: key.to_string(),
                    color: config.color(),
                }
            })
            .collect();
        Some(Self { index, timestamp: bar.timestamp, ohlcv: bar.ohlcv, indicators })
    }

    pub fn lines(&self) -> Vec<String> {
        let o = &self.ohlcv;
        let mut lines = vec![
            crate::time_utils::format_datetime(self.timestamp.value()),
            format!("O {:.2}  H {:.2}", o.open.value(), o.high.value()),
            format!("L {:.2}  C {:.2}", o.low.value(), o.close.value()),
            format!("V {:.0}", o.volume.value()),
        ];
        lines.extend(self.indicators.iter().map(TooltipLine::text));
        lines
    }
}
