use price_chart_core::domain::errors::ChartError;
use price_chart_core::domain::indicators::{ema, sma};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

const CLOSES: [f64; 5] = [10.0, 11.0, 12.0, 13.0, 14.0];

fn prices(raw: &[u16]) -> Vec<f64> {
    raw.iter().map(|&v| 1.0 + v as f64 / 10.0).collect()
}

#[test]
fn sma_of_five_closes() {
    assert_eq!(sma(&CLOSES, 3).unwrap(), vec![11.0, 12.0, 13.0]);
}

#[test]
fn ema_seeded_with_sma() {
    assert_eq!(ema(&CLOSES, 3).unwrap(), vec![11.0, 12.0, 13.0]);
}

#[test]
fn moving_average_short_input() {
    assert_eq!(sma(&CLOSES[..2], 3), Err(ChartError::InsufficientData { required: 3, actual: 2 }));
    assert!(matches!(ema(&[], 5), Err(ChartError::InsufficientData { .. })));
}

#[test]
fn zero_period_is_rejected() {
    assert!(matches!(sma(&CLOSES, 0), Err(ChartError::InvalidParameter(_))));
}

#[quickcheck]
fn sma_has_one_value_per_full_window(raw: Vec<u16>, period: u8) -> TestResult {
    let period = period as usize % 30 + 1;
    let values = prices(&raw);
    if values.len() < period {
        return TestResult::discard();
    }
    let out = sma(&values, period).unwrap();
    if out.len() != values.len() - period + 1 {
        return TestResult::failed();
    }
    let means_match = out.iter().enumerate().all(|(i, v)| {
        let window = &values[i..i + period];
        let mean = window.iter().sum::<f64>() / period as f64;
        (v - mean).abs() < 1e-9
    });
    TestResult::from_bool(means_match)
}

#[quickcheck]
fn ema_follows_recurrence(raw: Vec<u16>, period: u8) -> TestResult {
    let period = period as usize % 30 + 1;
    let values = prices(&raw);
    if values.len() < period {
        return TestResult::discard();
    }
    let out = ema(&values, period).unwrap();
    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    if (out[0] - seed).abs() > 1e-9 {
        return TestResult::failed();
    }
    let holds = out.windows(2).enumerate().all(|(i, pair)| {
        let close = values[period + i];
        let expected = (close - pair[0]) * k + pair[0];
        (pair[1] - expected).abs() < 1e-9
    });
    TestResult::from_bool(holds)
}
