//! Technical indicators derived from closing prices.

pub mod accumulators;
pub mod calculations;
pub mod config;
pub mod engine;
pub mod series;

pub use calculations::{BollingerOutput, MacdOutput, bollinger, ema, macd, rsi, sma};
pub use config::{IndicatorConfig, IndicatorFamily, IndicatorKey, IndicatorKind, Placement};
pub use engine::{ConfigDiff, IndicatorEngine, IndicatorStatus, IndicatorView, PumpReport};
pub use series::{IndicatorPoint, IndicatorSeries, IndicatorValue};
