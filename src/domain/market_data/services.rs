use super::entities::Bar;
use crate::domain::errors::{ChartError, ChartResult};

/// Domain service validating incoming bars before they reach a series
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidationService;

impl DataValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate a bar in isolation (prices and OHLC logic)
    pub fn validate_bar(&self, bar: &Bar) -> ChartResult<()> {
        let ts = bar.timestamp.value();
        let o = &bar.ohlcv;
        let fields = [
            ("open", o.open.value()),
            ("high", o.high.value()),
            ("low", o.low.value()),
            ("close", o.close.value()),
        ];

        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ChartError::data_integrity(ts, format!("{} price is not finite", name)));
            }
            if value <= 0.0 {
                return Err(ChartError::data_integrity(ts, format!("{} price must be positive", name)));
            }
        }

        let volume = o.volume.value();
        if !volume.is_finite() || volume < 0.0 {
            return Err(ChartError::data_integrity(ts, "volume must be finite and non-negative"));
        }

        if o.high.value() < o.low.value() {
            return Err(ChartError::data_integrity(ts, "high price cannot be lower than low price"));
        }
        if o.high.value() < o.open.value().max(o.close.value()) {
            return Err(ChartError::data_integrity(ts, "high price below open/close"));
        }
        if o.low.value() > o.open.value().min(o.close.value()) {
            return Err(ChartError::data_integrity(ts, "low price above open/close"));
        }

        Ok(())
    }

    /// Validate a bar that is about to be appended after `last`
    pub fn validate_append(&self, last: Option<&Bar>, bar: &Bar) -> ChartResult<()> {
        if let Some(last) = last {
            if bar.timestamp <= last.timestamp {
                return Err(ChartError::data_integrity(
                    bar.timestamp.value(),
                    format!("timestamp not after last committed bar {}", last.timestamp),
                ));
            }
        }
        self.validate_bar(bar)
    }

    /// Validate a bar that replaces the in-progress `last` bar
    pub fn validate_update(&self, last: Option<&Bar>, bar: &Bar) -> ChartResult<()> {
        match last {
            None => Err(ChartError::ProtocolViolation("update received for an empty series".into())),
            Some(last) if last.timestamp != bar.timestamp => Err(ChartError::ProtocolViolation(format!(
                "update targets {} but the last bar is {}",
                bar.timestamp, last.timestamp
            ))),
            Some(_) => self.validate_bar(bar),
        }
    }
}
