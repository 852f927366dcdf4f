//! Batch indicator functions over closing prices.

use super::accumulators::{
    BollingerAccumulator, EmaAccumulator, MacdAccumulator, RsiAccumulator, SmaAccumulator,
};
use super::config::IndicatorKind;
use super::series::IndicatorValue;
use crate::domain::errors::{ChartError, ChartResult};

/// MACD outputs; `signal_line[i]` and `histogram[i]` pair with `macd_line[i + signal - 1]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdOutput {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

fn ensure_enough(kind: &IndicatorKind, len: usize) -> ChartResult<()> {
    kind.validate()?;
    let required = kind.required_bars();
    if len < required {
        return Err(ChartError::InsufficientData { required, actual: len });
    }
    Ok(())
}

/// Simple moving average; `len - period + 1` values
pub fn sma(values: &[f64], period: usize) -> ChartResult<Vec<f64>> {
    ensure_enough(&IndicatorKind::Sma { period }, values.len())?;
    let mut acc = SmaAccumulator::new(period);
    Ok(values.iter().filter_map(|&x| acc.push(x)).collect())
}

/// Exponential moving average seeded with the SMA of the first window
pub fn ema(values: &[f64], period: usize) -> ChartResult<Vec<f64>> {
    ensure_enough(&IndicatorKind::Ema { period }, values.len())?;
    let mut acc = EmaAccumulator::new(period);
    Ok(values.iter().filter_map(|&x| acc.push(x)).collect())
}

/// Wilder RSI; `len - period` values, each in `[0, 100]`
pub fn rsi(values: &[f64], period: usize) -> ChartResult<Vec<f64>> {
    ensure_enough(&IndicatorKind::Rsi { period }, values.len())?;
    let mut acc = RsiAccumulator::new(period);
    Ok(values.iter().filter_map(|&x| acc.push(x)).collect())
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> ChartResult<MacdOutput> {
    ensure_enough(&IndicatorKind::Macd { fast, slow, signal }, values.len())?;
    let mut acc = MacdAccumulator::new(fast, slow, signal);
    let mut out = MacdOutput::default();
    for &x in values {
        let value = acc.push(x);
        if let Some(line) = acc.line() {
            out.macd_line.push(line);
        }
        if let Some(IndicatorValue::Macd { signal, histogram, .. }) = value {
            out.signal_line.push(signal);
            out.histogram.push(histogram);
        }
    }
    Ok(out)
}

pub fn bollinger(values: &[f64], period: usize, multiplier: f64) -> ChartResult<BollingerOutput> {
    ensure_enough(&IndicatorKind::Bollinger { period, multiplier }, values.len())?;
    let mut acc = BollingerAccumulator::new(period, multiplier);
    let mut out = BollingerOutput::default();
    for &x in values {
        if let Some(IndicatorValue::Bands { upper, middle, lower }) = acc.push(x) {
            out.upper.push(upper);
            out.middle.push(middle);
            out.lower.push(lower);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSES: [f64; 5] = [10.0, 11.0, 12.0, 13.0, 14.0];

    #[test]
    fn sma_scenario() {
        assert_eq!(sma(&CLOSES, 3).unwrap(), vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn ema_scenario() {
        assert_eq!(ema(&CLOSES, 3).unwrap(), vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn sma_errors() {
        assert!(matches!(sma(&CLOSES, 0), Err(ChartError::InvalidParameter(_))));
        assert_eq!(sma(&CLOSES, 6), Err(ChartError::InsufficientData { required: 6, actual: 5 }));
    }

    #[test]
    fn rsi_needs_one_more_bar_than_period() {
        assert!(matches!(rsi(&CLOSES, 5), Err(ChartError::InsufficientData { .. })));
        assert_eq!(rsi(&CLOSES, 4).unwrap(), vec![100.0]);
    }

    #[test]
    fn macd_rejects_fast_not_below_slow() {
        let closes: Vec<f64> = (0..60).map(f64::from).collect();
        assert!(matches!(macd(&closes, 26, 12, 9), Err(ChartError::InvalidParameter(_))));
    }

    #[test]
    fn macd_lengths_align_to_slow_series() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let out = macd(&closes, 12, 26, 9).unwrap();
        assert_eq!(out.macd_line.len(), 60 - 26 + 1);
        assert_eq!(out.signal_line.len(), out.macd_line.len() - 9 + 1);
        assert_eq!(out.histogram.len(), out.signal_line.len());

        let fast = ema(&closes, 12).unwrap();
        let slow = ema(&closes, 26).unwrap();
        for (i, line) in out.macd_line.iter().enumerate() {
            assert!((line - (fast[i + 14] - slow[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_middle_is_sma_and_bands_symmetric() {
        let out = bollinger(&CLOSES, 3, 2.0).unwrap();
        assert_eq!(out.middle, sma(&CLOSES, 3).unwrap());
        let sd = (2.0f64 / 3.0).sqrt();
        assert!((out.upper[0] - (11.0 + 2.0 * sd)).abs() < 1e-12);
        assert!((out.lower[0] - (11.0 - 2.0 * sd)).abs() < 1e-12);
    }
}
