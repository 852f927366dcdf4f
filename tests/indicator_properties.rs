use price_chart_core::domain::indicators::{
    IndicatorConfig, IndicatorEngine, IndicatorKind, IndicatorValue, macd, rsi,
};
use price_chart_core::domain::market_data::{Bar, BarSeries, OHLCV, Timestamp};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn prices(raw: &[u16]) -> Vec<f64> {
    raw.iter().map(|&v| 1.0 + v as f64 / 10.0).collect()
}

fn series_of(closes: &[f64]) -> BarSeries {
    BarSeries::from_bars(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(Timestamp::from(i as u64 * 60_000), OHLCV::flat(c, 1.0))),
    )
    .0
}

fn kinds() -> Vec<IndicatorKind> {
    vec![
        IndicatorKind::Sma { period: 4 },
        IndicatorKind::Ema { period: 5 },
        IndicatorKind::Rsi { period: 3 },
        IndicatorKind::Macd { fast: 2, slow: 4, signal: 3 },
        IndicatorKind::Bollinger { period: 4, multiplier: 2.0 },
    ]
}

fn close_enough(a: &IndicatorValue, b: &IndicatorValue) -> bool {
    let (a, b) = (a.components(), b.components());
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-9)
}

#[test]
fn rsi_of_monotonic_series() {
    let rising: Vec<f64> = (1..=20).map(f64::from).collect();
    assert!(rsi(&rising, 14).unwrap().iter().all(|&v| v == 100.0));
    let falling: Vec<f64> = rising.iter().rev().copied().collect();
    assert!(rsi(&falling, 14).unwrap().iter().all(|&v| v == 0.0));
}

#[quickcheck]
fn rsi_stays_within_bounds(raw: Vec<u16>, period: u8) -> TestResult {
    let period = period as usize % 20 + 1;
    let values = prices(&raw);
    if values.len() <= period {
        return TestResult::discard();
    }
    let out = rsi(&values, period).unwrap();
    TestResult::from_bool(out.len() == values.len() - period && out.iter().all(|v| (0.0..=100.0).contains(v)))
}

#[quickcheck]
fn macd_histogram_is_line_minus_signal(raw: Vec<u16>, fast: u8, extra: u8, signal: u8) -> TestResult {
    let fast = fast as usize % 12 + 1;
    let slow = fast + extra as usize % 12 + 1;
    let signal = signal as usize % 9 + 1;
    let values = prices(&raw);
    if values.len() < slow + signal - 1 {
        return TestResult::discard();
    }
    let out = macd(&values, fast, slow, signal).unwrap();
    let aligned = &out.macd_line[signal - 1..];
    let holds = out.histogram.len() == out.signal_line.len()
        && aligned.len() == out.signal_line.len()
        && out
            .histogram
            .iter()
            .zip(aligned.iter().zip(&out.signal_line))
            .all(|(h, (m, s))| (h - (m - s)).abs() < 1e-9);
    TestResult::from_bool(holds)
}

#[quickcheck]
fn incremental_append_matches_recompute(raw: Vec<u16>, next: u16) -> TestResult {
    let values = prices(&raw);
    if values.is_empty() {
        return TestResult::discard();
    }
    let configs: Vec<IndicatorConfig> = kinds().into_iter().map(IndicatorConfig::new).collect();

    let mut live_series = series_of(&values);
    let mut live = IndicatorEngine::new();
    live.set_configs(&configs).unwrap();
    live.pump(&live_series, usize::MAX);

    let appended = Bar::new(
        Timestamp::from(values.len() as u64 * 60_000),
        OHLCV::flat(1.0 + next as f64 / 10.0, 1.0),
    );
    live_series.append(appended).unwrap();
    live.on_bar_appended(&live_series);

    let mut batch = IndicatorEngine::new();
    batch.set_configs(&configs).unwrap();
    batch.pump(&live_series, usize::MAX);

    let same = kinds().iter().all(|kind| {
        let key = kind.key();
        match (live.series(&key), batch.series(&key)) {
            (Some(a), Some(b)) => {
                a.points.len() == b.points.len()
                    && a.points.iter().zip(&b.points).all(|(p, q)| p.index == q.index && close_enough(&p.value, &q.value))
            }
            _ => false,
        }
    });
    TestResult::from_bool(same)
}

#[quickcheck]
fn revising_last_bar_matches_recompute(raw: Vec<u16>, revised: u16) -> TestResult {
    let values = prices(&raw);
    if values.len() < 2 {
        return TestResult::discard();
    }
    let configs: Vec<IndicatorConfig> = kinds().into_iter().map(IndicatorConfig::new).collect();

    let mut live_series = series_of(&values);
    let mut live = IndicatorEngine::new();
    live.set_configs(&configs).unwrap();
    live.pump(&live_series, usize::MAX);

    let last_ts = live_series.last().unwrap().timestamp;
    live_series.update_last(Bar::new(last_ts, OHLCV::flat(1.0 + revised as f64 / 10.0, 2.0))).unwrap();
    live.on_last_updated(&live_series);

    let mut batch = IndicatorEngine::new();
    batch.set_configs(&configs).unwrap();
    batch.pump(&live_series, usize::MAX);

    let same = kinds().iter().all(|kind| {
        let key = kind.key();
        match (live.series(&key), batch.series(&key)) {
            (Some(a), Some(b)) => {
                a.points.len() == b.points.len()
                    && a.points.iter().zip(&b.points).all(|(p, q)| close_enough(&p.value, &q.value))
            }
            _ => false,
        }
    });
    TestResult::from_bool(same)
}

#[test]
fn extreme_periods_are_insufficient_not_fatal() {
    let closes = [10.0, 11.0, 12.0];
    let configs = IndicatorConfig::list_from_json(r#"[{"kind":"SMA","period":18446744073709551615}]"#).unwrap();
    let series = series_of(&closes);
    let mut engine = IndicatorEngine::new();
    engine.set_configs(&configs).unwrap();
    let report = engine.pump(&series, usize::MAX);
    assert_eq!(report.warnings.len(), 1);
    assert!(engine.visible(series.len()).next().is_none());

    assert!(matches!(
        macd(&closes, 12, usize::MAX, 9),
        Err(price_chart_core::domain::errors::ChartError::InsufficientData { .. })
    ));
    assert!(matches!(
        rsi(&closes, usize::MAX),
        Err(price_chart_core::domain::errors::ChartError::InsufficientData { .. })
    ));
}
