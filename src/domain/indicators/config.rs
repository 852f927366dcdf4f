use crate::domain::chart::value_objects::Color;
use crate::domain::errors::{ChartError, ChartResult};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

fn default_rsi_period() -> usize {
    14
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_bollinger_period() -> usize {
    20
}
fn default_bollinger_multiplier() -> f64 {
    2.0
}
fn default_visible() -> bool {
    true
}

/// Indicator family, used for keys and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum IndicatorFamily {
    Sma,
    Ema,
    Rsi,
    Macd,
    Bollinger,
}

/// Where an indicator is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Shares the price panel and its vertical scale
    Overlay,
    /// Gets its own subplot below the volume panel
    Oscillator,
}

/// Indicator kind with only the parameters that kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Sma {
        period: usize,
    },
    Ema {
        period: usize,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
    },
    Macd {
        #[serde(default = "default_macd_fast")]
        fast: usize,
        #[serde(default = "default_macd_slow")]
        slow: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
    },
    Bollinger {
        #[serde(default = "default_bollinger_period")]
        period: usize,
        #[serde(default = "default_bollinger_multiplier", alias = "stdDevMultiplier")]
        multiplier: f64,
    },
}

impl IndicatorKind {
    pub fn rsi() -> Self {
        Self::Rsi { period: default_rsi_period() }
    }

    pub fn macd() -> Self {
        Self::Macd { fast: default_macd_fast(), slow: default_macd_slow(), signal: default_macd_signal() }
    }

    pub fn bollinger() -> Self {
        Self::Bollinger { period: default_bollinger_period(), multiplier: default_bollinger_multiplier() }
    }

    pub fn family(&self) -> IndicatorFamily {
        match self {
            Self::Sma { .. } => IndicatorFamily::Sma,
            Self::Ema { .. } => IndicatorFamily::Ema,
            Self::Rsi { .. } => IndicatorFamily::Rsi,
            Self::Macd { .. } => IndicatorFamily::Macd,
            Self::Bollinger { .. } => IndicatorFamily::Bollinger,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            Self::Sma { .. } | Self::Ema { .. } | Self::Bollinger { .. } => Placement::Overlay,
            Self::Rsi { .. } | Self::Macd { .. } => Placement::Oscillator,
        }
    }

    /// Leading bars consumed before the first value is produced
    pub fn warmup_offset(&self) -> usize {
        match *self {
            Self::Sma { period } | Self::Ema { period } | Self::Bollinger { period, .. } => {
                period.saturating_sub(1)
            }
            Self::Rsi { period } => period,
            Self::Macd { slow, signal, .. } => slow.saturating_add(signal).saturating_sub(2),
        }
    }

    pub fn required_bars(&self) -> usize {
        self.warmup_offset().saturating_add(1)
    }

    pub fn validate(&self) -> ChartResult<()> {
        match *self {
            Self::Sma { period } | Self::Ema { period } | Self::Rsi { period } => {
                check_period("period", period)
            }
            Self::Macd { fast, slow, signal } => {
                check_period("fast", fast)?;
                check_period("slow", slow)?;
                check_period("signal", signal)?;
                if fast >= slow {
                    return Err(ChartError::invalid_parameter(format!(
                        "MACD fast period {} must be shorter than slow period {}",
                        fast, slow
                    )));
                }
                Ok(())
            }
            Self::Bollinger { period, multiplier } => {
                check_period("period", period)?;
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(ChartError::invalid_parameter(format!(
                        "Bollinger multiplier must be positive, got {}",
                        multiplier
                    )));
                }
                Ok(())
            }
        }
    }

    /// Canonical identity: two configs with the same key share one series
    pub fn key(&self) -> IndicatorKey {
        let family = self.family();
        let params = match *self {
            Self::Sma { period } | Self::Ema { period } | Self::Rsi { period } => period.to_string(),
            Self::Macd { fast, slow, signal } => format!("{},{},{}", fast, slow, signal),
            Self::Bollinger { period, multiplier } => format!("{},{}", period, multiplier),
        };
        IndicatorKey(format!("{}({})", family, params))
    }

    /// Names of the value components, in draw order
    pub fn line_names(&self) -> &'static [&'static str] {
        match self {
            Self::Sma { .. } | Self::Ema { .. } | Self::Rsi { .. } => &["value"],
            Self::Macd { .. } => &["macd", "signal", "histogram"],
            Self::Bollinger { .. } => &["upper", "middle", "lower"],
        }
    }

    fn default_color(&self) -> Color {
        match self {
            Self::Sma { .. } => Color::from_hex(0xf5c542),
            Self::Ema { .. } => Color::from_hex(0x42a5f5),
            Self::Rsi { .. } => Color::from_hex(0xab47bc),
            Self::Macd { .. } => Color::from_hex(0x26a69a),
            Self::Bollinger { .. } => Color::from_hex(0x8d6e63),
        }
    }
}

fn check_period(name: &str, period: usize) -> ChartResult<()> {
    if period == 0 {
        return Err(ChartError::invalid_parameter(format!("{} must be a positive period", name)));
    }
    Ok(())
}

/// Canonical `KIND(params)` identity of a computed series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorKey(String);

impl IndicatorKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One entry of the consumer's indicator list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(flatten)]
    pub kind: IndicatorKind,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub color: Option<Color>,
}

impl IndicatorConfig {
    pub fn new(kind: IndicatorKind) -> Self {
        Self { kind, visible: true, color: None }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn key(&self) -> IndicatorKey {
        self.kind.key()
    }

    pub fn color(&self) -> Color {
        self.color.unwrap_or_else(|| self.kind.default_color())
    }

    /// Parse a JSON array of configs; malformed entries are parameter errors
    pub fn list_from_json(raw: &str) -> ChartResult<Vec<IndicatorConfig>> {
        serde_json::from_str(raw)
            .map_err(|e| ChartError::invalid_parameter(format!("malformed indicator list: {}", e)))
    }
}
