use super::accumulators::IndicatorState;
use super::config::{IndicatorConfig, IndicatorKey, IndicatorKind, Placement};
use super::series::{IndicatorPoint, IndicatorSeries, IndicatorValue, value_at};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::BarSeries;
use crate::{log_debug, log_info, log_warn};
use std::collections::HashSet;

const COMPONENT: LogComponent = LogComponent::Domain("IndicatorEngine");

/// Progress of one indicator's series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorStatus {
    /// Chunked computation still catching up with the series
    Pending { done: usize, total: usize },
    Ready,
    /// Caught up, but the series is shorter than the warm-up
    Insufficient { required: usize, actual: usize },
}

/// Accumulator plus produced points for one key.
///
/// `snapshot` holds the state from before the last consumed bar so an
/// in-progress bar can be revised without replaying history.
#[derive(Debug, Clone)]
struct IndicatorRuntime {
    state: IndicatorState,
    snapshot: Option<IndicatorState>,
    points: Vec<IndicatorPoint>,
    consumed: usize,
    last_emitted: bool,
}

impl IndicatorRuntime {
    fn new(kind: &IndicatorKind) -> Self {
        Self {
            state: IndicatorState::for_kind(kind),
            snapshot: None,
            points: Vec::new(),
            consumed: 0,
            last_emitted: false,
        }
    }

    fn feed(&mut self, close: f64, keep_snapshot: bool) {
        self.snapshot = keep_snapshot.then(|| self.state.clone());
        let index = self.consumed;
        self.last_emitted = match self.state.push(close) {
            Some(value) => {
                self.points.push(IndicatorPoint { index, value });
                true
            }
            None => false,
        };
        self.consumed += 1;
    }

    /// Replace the value produced by the last consumed bar
    fn revise_last(&mut self, close: f64) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };
        self.state = snapshot;
        if self.last_emitted {
            self.points.pop();
        }
        self.consumed -= 1;
        self.feed(close, true);
        true
    }
}

#[derive(Debug, Clone)]
struct IndicatorEntry {
    config: IndicatorConfig,
    key: IndicatorKey,
    generation: u64,
    runtime: IndicatorRuntime,
    warned: bool,
}

impl IndicatorEntry {
    fn status(&self, series_len: usize) -> IndicatorStatus {
        if self.runtime.consumed < series_len {
            IndicatorStatus::Pending { done: self.runtime.consumed, total: series_len }
        } else if self.runtime.points.is_empty() {
            IndicatorStatus::Insufficient { required: self.config.kind.required_bars(), actual: series_len }
        } else {
            IndicatorStatus::Ready
        }
    }
}

/// Result of applying a new configuration list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDiff {
    pub added: Vec<IndicatorKey>,
    pub removed: Vec<IndicatorKey>,
    pub retained: Vec<IndicatorKey>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of one chunk of background computation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PumpReport {
    pub processed: usize,
    pub completed: Vec<IndicatorKey>,
    pub warnings: Vec<ChartError>,
}

impl PumpReport {
    pub fn made_progress(&self) -> bool {
        self.processed > 0 || !self.completed.is_empty()
    }
}

/// Ready indicator handed to scales and rendering
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView<'a> {
    pub key: &'a IndicatorKey,
    pub config: &'a IndicatorConfig,
    pub points: &'a [IndicatorPoint],
}

/// Owns every derived indicator series.
///
/// Computations are advanced cooperatively by [`IndicatorEngine::pump`]; a
/// key never has more than one computation in flight.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    entries: Vec<IndicatorEntry>,
    next_generation: u64,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active configuration list.
    ///
    /// Any invalid config rejects the whole list and leaves the previous one active.
    pub fn set_configs(&mut self, configs: &[IndicatorConfig]) -> ChartResult<ConfigDiff> {
        for config in configs {
            config.kind.validate()?;
        }

        let mut seen = HashSet::new();
        let mut previous = std::mem::take(&mut self.entries);
        let mut diff = ConfigDiff::default();

        for config in configs {
            let key = config.key();
            if !seen.insert(key.clone()) {
                log_debug!(COMPONENT, "duplicate indicator {} merged", key);
                continue;
            }
            match previous.iter().position(|e| e.key == key) {
                Some(pos) => {
                    let mut entry = previous.swap_remove(pos);
                    entry.config = *config;
                    diff.retained.push(key);
                    self.entries.push(entry);
                }
                None => {
                    let entry = self.fresh_entry(*config, key.clone());
                    diff.added.push(key);
                    self.entries.push(entry);
                }
            }
        }

        for dropped in previous {
            if dropped.runtime.consumed > 0 {
                log_debug!(COMPONENT, "dropping {} (generation {})", dropped.key, dropped.generation);
            }
            diff.removed.push(dropped.key);
        }

        log_info!(
            COMPONENT,
            "indicators: +{} -{} ={}",
            diff.added.len(),
            diff.removed.len(),
            diff.retained.len()
        );
        Ok(diff)
    }

    /// Restart the computation for `key`, superseding any in-flight one
    pub fn request_recompute(&mut self, key: &IndicatorKey) -> bool {
        let generation = self.bump_generation();
        match self.entries.iter_mut().find(|e| &e.key == key) {
            Some(entry) => {
                if entry.runtime.consumed > 0 {
                    log_debug!(
                        COMPONENT,
                        "{} generation {} superseded by {}",
                        key,
                        entry.generation,
                        generation
                    );
                }
                entry.runtime = IndicatorRuntime::new(&entry.config.kind);
                entry.generation = generation;
                entry.warned = false;
                true
            }
            None => false,
        }
    }

    /// Drop all series and in-flight computations
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// A bar was appended to `series`: extend every caught-up indicator by one value
    pub fn on_bar_appended(&mut self, series: &BarSeries) {
        let Some(close) = series.last().map(|b| b.close()) else {
            return;
        };
        let last_index = series.len() - 1;
        for entry in &mut self.entries {
            if entry.runtime.consumed == last_index {
                entry.runtime.feed(close, true);
            }
        }
    }

    /// The trailing bar of `series` was revised in place
    pub fn on_last_updated(&mut self, series: &BarSeries) {
        let Some(close) = series.last().map(|b| b.close()) else {
            return;
        };
        let len = series.len();
        let mut stale = Vec::new();
        for entry in &mut self.entries {
            if entry.runtime.consumed == len && !entry.runtime.revise_last(close) {
                stale.push(entry.key.clone());
            }
        }
        for key in stale {
            log_warn!(COMPONENT, "no snapshot to revise {}, recomputing", key);
            self.request_recompute(&key);
        }
    }

    /// Advance pending computations by at most `budget` bars in total
    pub fn pump(&mut self, series: &BarSeries, budget: usize) -> PumpReport {
        let len = series.len();
        let bars = series.bars();
        let mut report = PumpReport::default();
        let mut remaining = budget;

        for entry in &mut self.entries {
            let was_pending = entry.runtime.consumed < len;
            while remaining > 0 && entry.runtime.consumed < len {
                let index = entry.runtime.consumed;
                entry.runtime.feed(bars[index].close(), index + 1 == len);
                remaining -= 1;
                report.processed += 1;
            }

            if was_pending && entry.runtime.consumed == len {
                report.completed.push(entry.key.clone());
            }

            match entry.status(len) {
                IndicatorStatus::Insufficient { required, actual } if !entry.warned => {
                    entry.warned = true;
                    log_warn!(COMPONENT, "{} omitted: needs {} bars, have {}", entry.key, required, actual);
                    report.warnings.push(ChartError::InsufficientData { required, actual });
                }
                IndicatorStatus::Ready => entry.warned = false,
                _ => {}
            }

            if remaining == 0 {
                break;
            }
        }
        report
    }

    pub fn has_pending(&self, series_len: usize) -> bool {
        self.entries.iter().any(|e| e.runtime.consumed < series_len)
    }

    pub fn status(&self, key: &IndicatorKey, series_len: usize) -> Option<IndicatorStatus> {
        self.entry(key).map(|e| e.status(series_len))
    }

    pub fn configs(&self) -> impl Iterator<Item = &IndicatorConfig> {
        self.entries.iter().map(|e| &e.config)
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndicatorKey> {
        self.entries.iter().map(|e| &e.key)
    }

    /// Indicators with a complete series and `visible` set, in config order
    pub fn visible(&self, series_len: usize) -> impl Iterator<Item = IndicatorView<'_>> {
        self.entries
            .iter()
            .filter(move |e| e.config.visible && e.status(series_len) == IndicatorStatus::Ready)
            .map(|e| IndicatorView { key: &e.key, config: &e.config, points: &e.runtime.points })
    }

    pub fn visible_with(&self, series_len: usize, placement: Placement) -> Vec<IndicatorView<'_>> {
        self.visible(series_len).filter(|v| v.config.kind.placement() == placement).collect()
    }

    /// Value at a bar index; `None` before the warm-up offset or while pending
    pub fn value_at(&self, key: &IndicatorKey, index: usize) -> Option<IndicatorValue> {
        self.entry(key).and_then(|e| value_at(&e.runtime.points, index).copied())
    }

    pub fn series(&self, key: &IndicatorKey) -> Option<IndicatorSeries> {
        self.entry(key).map(|e| IndicatorSeries {
            key: e.key.clone(),
            offset: e.config.kind.warmup_offset(),
            points: e.runtime.points.clone(),
        })
    }

    fn entry(&self, key: &IndicatorKey) -> Option<&IndicatorEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    fn fresh_entry(&mut self, config: IndicatorConfig, key: IndicatorKey) -> IndicatorEntry {
        IndicatorEntry {
            runtime: IndicatorRuntime::new(&config.kind),
            generation: self.bump_generation(),
            config,
            key,
            warned: false,
        }
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{Bar, OHLCV, Timestamp};

    fn series(closes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(Timestamp::from(i as u64 * 60_000), OHLCV::flat(c, 1.0)));
        BarSeries::from_bars(bars).0
    }

    fn sma(period: usize) -> IndicatorConfig {
        IndicatorConfig::new(IndicatorKind::Sma { period })
    }

    #[test]
    fn pump_respects_budget() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut engine = IndicatorEngine::new();
        engine.set_configs(&[sma(2)]).unwrap();
        let key = sma(2).key();

        let report = engine.pump(&s, 4);
        assert_eq!(report.processed, 4);
        assert_eq!(engine.status(&key, s.len()), Some(IndicatorStatus::Pending { done: 4, total: 6 }));

        let report = engine.pump(&s, 100);
        assert_eq!(report.completed, vec![key.clone()]);
        assert_eq!(engine.status(&key, s.len()), Some(IndicatorStatus::Ready));
        assert_eq!(engine.value_at(&key, 5), Some(IndicatorValue::Line(5.5)));
        assert_eq!(engine.value_at(&key, 0), None);
    }

    #[test]
    fn invalid_config_keeps_previous_set() {
        let mut engine = IndicatorEngine::new();
        engine.set_configs(&[sma(3)]).unwrap();
        let bad = IndicatorConfig::new(IndicatorKind::Macd { fast: 30, slow: 10, signal: 9 });
        assert!(engine.set_configs(&[sma(5), bad]).is_err());
        let keys: Vec<_> = engine.keys().cloned().collect();
        assert_eq!(keys, vec![sma(3).key()]);
    }

    #[test]
    fn duplicate_configs_share_one_series() {
        let mut engine = IndicatorEngine::new();
        let diff = engine.set_configs(&[sma(3), sma(3).hidden()]).unwrap();
        assert_eq!(diff.added.len(), 1);
        assert_eq!(engine.keys().count(), 1);
    }

    #[test]
    fn retained_key_keeps_its_series() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        let mut engine = IndicatorEngine::new();
        engine.set_configs(&[sma(2)]).unwrap();
        engine.pump(&s, usize::MAX);

        let diff = engine.set_configs(&[sma(2).hidden(), sma(3)]).unwrap();
        assert_eq!(diff.retained, vec![sma(2).key()]);
        assert_eq!(diff.added, vec![sma(3).key()]);
        assert!(engine.has_pending(s.len()));
        assert_eq!(engine.status(&sma(2).key(), s.len()), Some(IndicatorStatus::Ready));
        assert_eq!(engine.visible(s.len()).count(), 0);
    }

    #[test]
    fn insufficient_data_warns_once_then_recovers() {
        let mut s = series(&[1.0, 2.0]);
        let mut engine = IndicatorEngine::new();
        engine.set_configs(&[sma(3)]).unwrap();

        let first = engine.pump(&s, 10);
        assert_eq!(first.warnings, vec![ChartError::InsufficientData { required: 3, actual: 2 }]);
        assert!(engine.pump(&s, 10).warnings.is_empty());

        s.append(Bar::new(Timestamp::from(120_000), OHLCV::flat(3.0, 1.0))).unwrap();
        engine.on_bar_appended(&s);
        assert_eq!(engine.status(&sma(3).key(), s.len()), Some(IndicatorStatus::Ready));
        assert_eq!(engine.value_at(&sma(3).key(), 2), Some(IndicatorValue::Line(2.0)));
    }

    #[test]
    fn recompute_supersedes_in_flight_work() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut engine = IndicatorEngine::new();
        engine.set_configs(&[sma(2)]).unwrap();
        engine.pump(&s, 3);
        assert!(engine.request_recompute(&sma(2).key()));
        assert_eq!(
            engine.status(&sma(2).key(), s.len()),
            Some(IndicatorStatus::Pending { done: 0, total: 5 })
        );
    }

    #[test]
    fn huge_periods_report_insufficient_data() {
        let s = series(&[1.0, 2.0, 3.0]);
        let mut engine = IndicatorEngine::new();
        let huge_macd = IndicatorConfig::new(IndicatorKind::Macd { fast: 12, slow: usize::MAX, signal: 9 });
        engine.set_configs(&[sma(usize::MAX), huge_macd]).unwrap();

        let report = engine.pump(&s, usize::MAX);
        assert_eq!(
            report.warnings,
            vec![
                ChartError::InsufficientData { required: usize::MAX, actual: 3 },
                ChartError::InsufficientData { required: usize::MAX - 1, actual: 3 },
            ]
        );
        assert_eq!(engine.value_at(&sma(usize::MAX).key(), 2), None);
    }
}
