use price_chart_core::domain::errors::ChartError;
use price_chart_core::domain::indicators::{IndicatorConfig, IndicatorEngine, IndicatorKind};
use price_chart_core::domain::market_data::{Bar, BarSeries, OHLCV, Price, StreamEvent, Timestamp, Volume};

fn bar(ts: u64, close: f64) -> Bar {
    Bar::new(Timestamp::from(ts), OHLCV::flat(close, 10.0))
}

fn closes(series: &BarSeries) -> Vec<f64> {
    series.bars().iter().map(|b| b.close()).collect()
}

#[test]
fn batch_load_drops_malformed_bars() {
    let broken = Bar::new(
        Timestamp::from(120_000),
        OHLCV::new(Price::from(5.0), Price::from(4.0), Price::from(3.0), Price::from(5.0), Volume::from(1.0)),
    );
    let (series, rejected) = BarSeries::from_bars(vec![bar(60_000, 1.0), broken, bar(180_000, 2.0)]);
    assert_eq!(series.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(rejected[0], ChartError::DataIntegrity { timestamp: 120_000, .. }));
}

#[test]
fn out_of_order_bar_leaves_indicators_untouched() {
    let (mut series, _) = BarSeries::from_bars((1..=5u64).map(|i| bar(i * 60_000, 9.0 + i as f64)));
    let sma = IndicatorConfig::new(IndicatorKind::Sma { period: 3 });
    let mut engine = IndicatorEngine::new();
    engine.set_configs(&[sma]).unwrap();
    engine.pump(&series, usize::MAX);
    let before = engine.series(&sma.key()).unwrap();

    let late = series.append(bar(120_000, 99.0));
    assert!(matches!(late, Err(ChartError::DataIntegrity { timestamp: 120_000, .. })));
    assert_eq!(series.len(), 5);
    assert_eq!(closes(&series), vec![10.0, 11.0, 12.0, 13.0, 14.0]);

    assert_eq!(engine.series(&sma.key()).unwrap(), before);
    assert_eq!(before.points.iter().map(|p| p.value.components()[0]).collect::<Vec<_>>(), vec![11.0, 12.0, 13.0]);
}

#[test]
fn update_must_target_last_bar() {
    let (mut series, _) = BarSeries::from_bars(vec![bar(60_000, 1.0), bar(120_000, 2.0)]);
    assert!(series.update_last(bar(60_000, 5.0)).is_err());
    assert!(series.update_last(bar(120_000, 5.0)).is_ok());
    assert_eq!(series.last().map(|b| b.close()), Some(5.0));
}

#[test]
fn unknown_stream_type_is_protocol_violation() {
    let raw = r#"{"type":"delete","bar":{"timestamp":1,"open":1,"high":1,"low":1,"close":1,"volume":1}}"#;
    assert!(matches!(StreamEvent::from_json(raw), Err(ChartError::ProtocolViolation(_))));
}

#[test]
fn stream_update_parses() {
    let raw = r#"{"type":"update","bar":{"timestamp":60000,"open":1.0,"high":1.5,"low":0.5,"close":1.2,"volume":3.0}}"#;
    let event = StreamEvent::from_json(raw).unwrap();
    assert!(matches!(event, StreamEvent::Update { .. }));
    assert_eq!(event.bar().ohlcv.volume.value(), 3.0);
}
