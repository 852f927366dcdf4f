use price_chart_core::config::ChartConfig;
use price_chart_core::domain::chart::{
    PanelLayout, ScaleCoordinator, ScaleSet, SurfaceSize, Viewport, ZoomLimits,
};
use price_chart_core::domain::indicators::IndicatorEngine;
use price_chart_core::domain::market_data::{Bar, BarSeries, OHLCV, Timestamp};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

const LEN: usize = 400;

fn series() -> BarSeries {
    BarSeries::from_bars(
        (0..LEN as u64).map(|i| Bar::new(Timestamp::from(i * 60_000), OHLCV::flat(100.0 + (i % 17) as f64, 5.0))),
    )
    .0
}

fn scales(vp: &Viewport, series: &BarSeries) -> ScaleSet {
    let config = ChartConfig::default();
    let layout = PanelLayout::split(SurfaceSize::new(856, 624), 0, &config.layout);
    ScaleCoordinator::compute(vp, series, &IndicatorEngine::new(), &layout, &config.scale_options()).unwrap()
}

/// Zoom anchored on the centre of bar `index`; returns its pixel before and after
fn zoom_on_bar(vp: &mut Viewport, series: &BarSeries, index: usize, factor: f64) -> (f64, f64) {
    let before = scales(vp, series);
    let p = before.x.x(index);
    let plot = before.layout.plot();
    vp.zoom_at(factor, (p - plot.x) / plot.width);
    let after = scales(vp, series);
    (p, after.x.x(index))
}

#[quickcheck]
fn zoom_in_keeps_bar_under_pointer(offset: u8, factor: u8) -> TestResult {
    let series = series();
    let mut vp = Viewport::with_window(LEN, 100.0, 200.0, ZoomLimits::default());
    let index = 100 + offset as usize % 200;
    let factor = 1.0 + factor as f64 / 64.0;
    let (before, after) = zoom_on_bar(&mut vp, &series, index, factor);
    TestResult::from_bool((before - after).abs() < 1.0)
}

#[quickcheck]
fn unclamped_zoom_out_keeps_bar_under_pointer(offset: u8, factor: u8) -> TestResult {
    let series = series();
    let mut vp = Viewport::with_window(LEN, 150.0, 50.0, ZoomLimits::default());
    let index = 150 + offset as usize % 50;
    let factor = 1.0 / (1.0 + factor as f64 / 128.0);
    let (before, after) = zoom_on_bar(&mut vp, &series, index, factor);
    let clamped = vp.start() <= 0.0 || vp.start() + vp.span() >= LEN as f64;
    if clamped {
        return TestResult::discard();
    }
    TestResult::from_bool((before - after).abs() < 1.0)
}

#[test]
fn zoom_at_right_edge_keeps_live_bar_visible() {
    let series = series();
    let mut vp = Viewport::new(LEN, ZoomLimits::default());
    let (before, after) = zoom_on_bar(&mut vp, &series, LEN - 1, 4.0);
    assert!((before - after).abs() < 1.0);
    assert_eq!(vp.range().map(|r| r.1), Some(LEN - 1));
}
