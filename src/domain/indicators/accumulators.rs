//! Streaming accumulators: one `push` per bar, O(period) at worst.
//!
//! The batch functions in `calculations` are folds over these same types, so
//! an incremental append yields exactly what a full recomputation yields.

use super::config::IndicatorKind;
use super::series::IndicatorValue;
use std::collections::VecDeque;

/// Trailing window of the last `period` values
#[derive(Debug, Clone)]
struct Window {
    period: usize,
    values: VecDeque<f64>,
}

impl Window {
    fn new(period: usize) -> Self {
        Self { period, values: VecDeque::new() }
    }

    fn push(&mut self, x: f64) -> bool {
        self.values.push_back(x);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
        self.is_full()
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.period as f64
    }

    /// Population standard deviation around `mean`
    fn std_dev(&self, mean: f64) -> f64 {
        let variance =
            self.values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / self.period as f64;
        variance.sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct SmaAccumulator {
    window: Window,
}

impl SmaAccumulator {
    pub fn new(period: usize) -> Self {
        Self { window: Window::new(period) }
    }

    pub fn push(&mut self, x: f64) -> Option<f64> {
        self.window.push(x).then(|| self.window.mean())
    }
}

/// EMA seeded with the SMA of the first `period` values
#[derive(Debug, Clone)]
pub struct EmaAccumulator {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    seen: usize,
    current: Option<f64>,
}

impl EmaAccumulator {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            current: None,
        }
    }

    pub fn push(&mut self, x: f64) -> Option<f64> {
        let next = match self.current {
            Some(prev) => (x - prev) * self.multiplier + prev,
            None => {
                self.seed_sum += x;
                self.seen += 1;
                if self.seen < self.period {
                    return None;
                }
                self.seed_sum / self.period as f64
            }
        };
        self.current = Some(next);
        self.current
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

/// RSI with Wilder smoothing of average gain and loss
#[derive(Debug, Clone)]
pub struct RsiAccumulator {
    period: usize,
    prev_close: Option<f64>,
    deltas_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    averages: Option<(f64, f64)>,
}

impl RsiAccumulator {
    pub fn new(period: usize) -> Self {
        Self { period, prev_close: None, deltas_seen: 0, gain_sum: 0.0, loss_sum: 0.0, averages: None }
    }

    pub fn push(&mut self, x: f64) -> Option<f64> {
        let prev = self.prev_close.replace(x)?;
        let delta = x - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        let p = self.period as f64;

        let (avg_gain, avg_loss) = match self.averages {
            Some((g, l)) => ((g * (p - 1.0) + gain) / p, (l * (p - 1.0) + loss) / p),
            None => {
                self.gain_sum += gain;
                self.loss_sum += loss;
                self.deltas_seen += 1;
                if self.deltas_seen < self.period {
                    return None;
                }
                (self.gain_sum / p, self.loss_sum / p)
            }
        };
        self.averages = Some((avg_gain, avg_loss));
        Some(relative_strength(avg_gain, avg_loss))
    }
}

fn relative_strength(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct MacdAccumulator {
    fast: EmaAccumulator,
    slow: EmaAccumulator,
    signal: EmaAccumulator,
    line: Option<f64>,
}

impl MacdAccumulator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: EmaAccumulator::new(fast),
            slow: EmaAccumulator::new(slow),
            signal: EmaAccumulator::new(signal),
            line: None,
        }
    }

    pub fn push(&mut self, x: f64) -> Option<IndicatorValue> {
        let fast = self.fast.push(x);
        let slow = self.slow.push(x);
        // The fast EMA is ready first; pairing by bar index trims its lead.
        let line = match (fast, slow) {
            (Some(f), Some(s)) => f - s,
            _ => return None,
        };
        self.line = Some(line);
        let signal = self.signal.push(line)?;
        Some(IndicatorValue::Macd { macd: line, signal, histogram: line - signal })
    }

    /// MACD line value of the most recent push, available before the signal warms up
    pub fn line(&self) -> Option<f64> {
        self.line
    }
}

#[derive(Debug, Clone)]
pub struct BollingerAccumulator {
    window: Window,
    multiplier: f64,
}

impl BollingerAccumulator {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self { window: Window::new(period), multiplier }
    }

    pub fn push(&mut self, x: f64) -> Option<IndicatorValue> {
        if !self.window.push(x) {
            return None;
        }
        let middle = self.window.mean();
        let half_width = self.multiplier * self.window.std_dev(middle);
        Some(IndicatorValue::Bands { upper: middle + half_width, middle, lower: middle - half_width })
    }
}

/// Accumulator for any indicator kind, dispatched exhaustively
#[derive(Debug, Clone)]
pub enum IndicatorState {
    Sma(SmaAccumulator),
    Ema(EmaAccumulator),
    Rsi(RsiAccumulator),
    Macd(MacdAccumulator),
    Bollinger(BollingerAccumulator),
}

impl IndicatorState {
    pub fn for_kind(kind: &IndicatorKind) -> Self {
        match *kind {
            IndicatorKind::Sma { period } => Self::Sma(SmaAccumulator::new(period)),
            IndicatorKind::Ema { period } => Self::Ema(EmaAccumulator::new(period)),
            IndicatorKind::Rsi { period } => Self::Rsi(RsiAccumulator::new(period)),
            IndicatorKind::Macd { fast, slow, signal } => {
                Self::Macd(MacdAccumulator::new(fast, slow, signal))
            }
            IndicatorKind::Bollinger { period, multiplier } => {
                Self::Bollinger(BollingerAccumulator::new(period, multiplier))
            }
        }
    }

    pub fn push(&mut self, close: f64) -> Option<IndicatorValue> {
        match self {
            Self::Sma(acc) => acc.push(close).map(IndicatorValue::Line),
            Self::Ema(acc) => acc.push(close).map(IndicatorValue::Line),
            Self::Rsi(acc) => acc.push(close).map(IndicatorValue::Line),
            Self::Macd(acc) => acc.push(close),
            Self::Bollinger(acc) => acc.push(close),
        }
    }
}
