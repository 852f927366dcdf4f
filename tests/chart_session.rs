use price_chart_core::application::{
    ChartEvent, ChartSession, InputEvent, RenderTarget, TimeframeSource, ViewportState,
};
use price_chart_core::config::ChartConfig;
use price_chart_core::domain::chart::{SurfaceSize, Timeframe};
use price_chart_core::domain::errors::ChartError;
use price_chart_core::domain::indicators::{IndicatorConfig, IndicatorKind};
use price_chart_core::domain::market_data::{Bar, OHLCV, Price, StreamEvent, Timestamp, Volume};
use price_chart_core::infrastructure::{HeadlessTarget, ManualFrameScheduler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const HOUR: u64 = 60 * 60 * 1000;
const SIZE: SurfaceSize = SurfaceSize { width: 856, height: 624 };

fn bar(i: u64) -> Bar {
    Bar::new(Timestamp::from(i * HOUR), OHLCV::flat(100.0 + (i % 7) as f64, 10.0))
}

fn session_with(len: u64, size: SurfaceSize) -> (ChartSession, ManualFrameScheduler) {
    let scheduler = ManualFrameScheduler::new();
    let bars = (0..len).map(bar).collect();
    let session = ChartSession::create(ChartConfig::default(), bars, size, Box::new(scheduler.clone())).unwrap();
    (session, scheduler)
}

fn record(session: &mut ChartSession) -> Rc<RefCell<Vec<ChartEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    session.subscribe(move |e: &ChartEvent| sink.borrow_mut().push(e.clone())).unwrap();
    events
}

#[test]
fn first_tick_renders_and_reports_viewport() {
    let (mut session, scheduler) = session_with(100, SIZE);
    let events = record(&mut session);
    assert!(scheduler.is_pending());

    let mut target = HeadlessTarget::new();
    let report = session.tick(0.0, &mut target).unwrap();
    assert!(report.rendered);
    assert_eq!(target.presented(), 1);
    assert!(!session.is_dirty());

    let events = events.borrow();
    let domain = events.iter().find_map(|e| match e {
        ChartEvent::ViewportChange { domain } => Some(*domain),
        _ => None,
    });
    let domain = domain.expect("viewport change");
    assert_eq!((domain.range.start_index, domain.range.end_index), (0, 99));
}

#[test]
fn mutations_between_frames_render_once() {
    let (mut session, scheduler) = session_with(100, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    scheduler.fire();
    let requested = scheduler.requested();

    for i in 100..105 {
        session.apply_stream_event(StreamEvent::Append { bar: bar(i) }).unwrap();
    }
    assert_eq!(scheduler.requested(), requested + 1);
    assert_eq!(session.series().len(), 105);

    let report = session.tick(16.0, &mut target).unwrap();
    assert!(report.rendered);
    assert_eq!(target.presented(), 2);

    let idle = session.tick(32.0, &mut target).unwrap();
    assert!(!idle.rendered);
    assert_eq!(target.presented(), 2);
}

#[test]
fn zero_sized_surface_pauses_rendering() {
    let (mut session, _) = session_with(50, SurfaceSize::new(0, 0));
    let mut target = HeadlessTarget::new();

    let report = session.tick(0.0, &mut target).unwrap();
    assert!(report.paused);
    assert!(!report.rendered);
    assert_eq!(target.presented(), 0);

    session.resize(SIZE).unwrap();
    assert!(session.tick(16.0, &mut target).unwrap().rendered);
    assert_eq!(target.presented(), 1);
}

#[test]
fn fed_events_are_merged_on_tick() {
    let (mut session, _) = session_with(10, SIZE);
    let feed = session.feed().unwrap();
    feed.unbounded_send(StreamEvent::Append { bar: bar(10) }).unwrap();
    let revised = Bar::new(Timestamp::from(10 * HOUR), OHLCV::flat(120.0, 30.0));
    feed.unbounded_send(StreamEvent::Update { bar: revised }).unwrap();
    assert_eq!(session.series().len(), 10);

    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    assert_eq!(session.series().len(), 11);
    assert_eq!(session.series().last().map(|b| b.close()), Some(120.0));
}

#[test]
fn rejected_data_surfaces_as_warnings() {
    let scheduler = ManualFrameScheduler::new();
    let broken = Bar::new(
        Timestamp::from(5 * HOUR),
        OHLCV::new(Price::from(f64::NAN), Price::from(1.0), Price::from(1.0), Price::from(1.0), Volume::from(1.0)),
    );
    let mut bars: Vec<Bar> = (0..5).map(bar).collect();
    bars.push(broken);
    let mut session = ChartSession::create(ChartConfig::default(), bars, SIZE, Box::new(scheduler)).unwrap();
    let events = record(&mut session);

    let late = session.apply_stream_event(StreamEvent::Append { bar: bar(2) });
    assert!(matches!(late, Err(ChartError::DataIntegrity { .. })));
    let garbage = session.apply_stream_json(r#"{"type":"remove"}"#);
    assert!(matches!(garbage, Err(ChartError::ProtocolViolation(_))));

    session.set_indicators(&[IndicatorConfig::new(IndicatorKind::Sma { period: 50 })]).unwrap();
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();

    let warnings: Vec<ChartError> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            ChartEvent::Warning { error } => Some(error.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(warnings.len(), 4);
    assert!(matches!(warnings[0], ChartError::DataIntegrity { .. }));
    assert!(matches!(warnings[1], ChartError::ProtocolViolation(_)));
    assert!(matches!(warnings[2], ChartError::DataIntegrity { timestamp, .. } if timestamp == 5 * HOUR));
    assert_eq!(warnings[3], ChartError::InsufficientData { required: 50, actual: 5 });
}

#[test]
fn invalid_indicator_list_is_rejected() {
    let (mut session, _) = session_with(10, SIZE);
    let result = session.set_indicators_json(r#"[{"kind":"MACD","fast":26,"slow":12}]"#);
    assert!(matches!(result, Err(ChartError::InvalidParameter(_))));
    assert_eq!(session.engine().keys().count(), 0);
}

#[test]
fn preset_timeframe_animates_to_range() {
    let (mut session, _) = session_with(100, SIZE);
    let events = record(&mut session);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();

    assert!(session.set_timeframe(Timeframe::OneDay, 10.0).unwrap());
    assert!(matches!(session.state(), ViewportState::Transitioning(_)));
    assert!(events.borrow().iter().any(|e| matches!(
        e,
        ChartEvent::TimeframeChange { range, source: TimeframeSource::Preset(Timeframe::OneDay) }
            if range.start_index == 75 && range.end_index == 99
    )));

    session.tick(160.0, &mut target).unwrap();
    assert!(matches!(session.state(), ViewportState::Transitioning(_)));
    session.tick(310.0, &mut target).unwrap();
    assert!(matches!(session.state(), ViewportState::Idle));
    assert_eq!(session.viewport().range(), Some((75, 99)));
}

#[test]
fn timeframe_is_refused_while_panning() {
    let (mut session, _) = session_with(100, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();

    session.handle_input(InputEvent::PointerDown { x: 400.0, y: 300.0 }, 5.0).unwrap();
    assert!(matches!(session.state(), ViewportState::Panning { .. }));
    assert!(!session.set_timeframe(Timeframe::OneDay, 6.0).unwrap());
    session.handle_input(InputEvent::PointerUp { x: 400.0, y: 300.0 }, 7.0).unwrap();
    assert!(session.set_timeframe(Timeframe::OneDay, 8.0).unwrap());
}

#[test]
fn wheel_zoom_then_drag_pans() {
    let (mut session, _) = session_with(200, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();

    session.handle_input(InputEvent::Wheel { x: 400.0, y: 300.0, delta_y: -500.0 }, 10.0).unwrap();
    assert!(session.viewport().span() < 200.0);
    assert!(matches!(session.state(), ViewportState::Zooming { .. }));
    session.tick(300.0, &mut target).unwrap();
    assert!(matches!(session.state(), ViewportState::Idle));

    let start = session.viewport().start();
    session.handle_input(InputEvent::PointerDown { x: 400.0, y: 300.0 }, 310.0).unwrap();
    session.handle_input(InputEvent::PointerMove { x: 500.0, y: 300.0 }, 320.0).unwrap();
    assert!(session.viewport().start() < start);
    session.handle_input(InputEvent::PointerUp { x: 500.0, y: 300.0 }, 330.0).unwrap();
    assert!(matches!(session.state(), ViewportState::Idle));
}

#[test]
fn streaming_during_pan_leaves_window_alone() {
    let (mut session, _) = session_with(200, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    session.handle_input(InputEvent::Wheel { x: 400.0, y: 300.0, delta_y: -500.0 }, 10.0).unwrap();
    session.tick(300.0, &mut target).unwrap();

    session.handle_input(InputEvent::PointerDown { x: 400.0, y: 300.0 }, 310.0).unwrap();
    let before = (session.viewport().start(), session.viewport().span());
    session.apply_stream_event(StreamEvent::Append { bar: bar(200) }).unwrap();
    assert_eq!((session.viewport().start(), session.viewport().span()), before);
    assert_eq!(session.viewport().len(), 201);
}

#[test]
fn streaming_during_wheel_zoom_leaves_window_alone() {
    let (mut session, _) = session_with(200, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    session.handle_input(InputEvent::Wheel { x: 400.0, y: 300.0, delta_y: -500.0 }, 10.0).unwrap();
    assert!(matches!(session.state(), ViewportState::Zooming { .. }));

    let before = (session.viewport().start(), session.viewport().span());
    session.apply_stream_event(StreamEvent::Append { bar: bar(200) }).unwrap();
    session.apply_stream_event(StreamEvent::Update { bar: bar(200) }).unwrap();
    assert_eq!((session.viewport().start(), session.viewport().span()), before);
    assert_eq!(session.viewport().len(), 201);
    assert!(matches!(session.state(), ViewportState::Zooming { .. }));
}

#[test]
fn streaming_during_brush_leaves_window_alone() {
    let (mut session, _) = session_with(100, SIZE);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    session.handle_input(InputEvent::PointerDown { x: 100.0, y: 610.0 }, 5.0).unwrap();
    session.handle_input(InputEvent::PointerMove { x: 300.0, y: 610.0 }, 6.0).unwrap();
    assert!(matches!(session.state(), ViewportState::Brushing { .. }));

    // The full view is pinned to the live edge, but only an idle window follows
    assert_eq!(session.viewport().range(), Some((0, 99)));
    session.apply_stream_event(StreamEvent::Append { bar: bar(100) }).unwrap();
    assert_eq!(session.viewport().range(), Some((0, 99)));
    assert_eq!(session.viewport().len(), 101);
    assert!(matches!(session.state(), ViewportState::Brushing { .. }));
}

#[test]
fn idle_window_pinned_right_follows_new_bars() {
    let (mut session, _) = session_with(100, SIZE);
    session.apply_stream_event(StreamEvent::Append { bar: bar(100) }).unwrap();
    assert_eq!(session.viewport().range(), Some((1, 100)));
}

#[test]
fn crosshair_follows_pointer_until_leave() {
    let (mut session, _) = session_with(100, SIZE);
    let events = record(&mut session);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    events.borrow_mut().clear();

    session.handle_input(InputEvent::PointerMove { x: 404.0, y: 300.0 }, 5.0).unwrap();
    session.handle_input(InputEvent::PointerLeave, 6.0).unwrap();

    let moves: Vec<Option<usize>> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            ChartEvent::CrosshairMove { crosshair } => Some(crosshair.and_then(|c| c.index)),
            _ => None,
        })
        .collect();
    assert_eq!(moves, vec![Some(50), None]);
}

#[test]
fn brushing_time_axis_selects_range() {
    let (mut session, _) = session_with(100, SIZE);
    let events = record(&mut session);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();

    session.handle_input(InputEvent::PointerDown { x: 100.0, y: 610.0 }, 5.0).unwrap();
    assert!(matches!(session.state(), ViewportState::Brushing { .. }));
    session.handle_input(InputEvent::PointerMove { x: 300.0, y: 610.0 }, 6.0).unwrap();
    session.handle_input(InputEvent::PointerUp { x: 300.0, y: 610.0 }, 7.0).unwrap();

    let brushed = events.borrow().iter().find_map(|e| match e {
        ChartEvent::TimeframeChange { range, source: TimeframeSource::Brush } => Some(*range),
        _ => None,
    });
    let range = brushed.expect("brush selection");
    assert_eq!((range.start_index, range.end_index), (12, 37));
    assert!(matches!(session.state(), ViewportState::Transitioning(_)));
}

#[test]
fn tiny_brush_is_ignored() {
    let (mut session, _) = session_with(100, SIZE);
    let events = record(&mut session);
    let mut target = HeadlessTarget::new();
    session.tick(0.0, &mut target).unwrap();
    events.borrow_mut().clear();

    session.handle_input(InputEvent::PointerDown { x: 100.0, y: 610.0 }, 5.0).unwrap();
    session.handle_input(InputEvent::PointerUp { x: 102.0, y: 610.0 }, 6.0).unwrap();
    assert!(!events.borrow().iter().any(|e| matches!(e, ChartEvent::TimeframeChange { .. })));
    assert!(matches!(session.state(), ViewportState::Idle));
}

struct Guard(Rc<Cell<bool>>);

impl Drop for Guard {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn destroy_releases_everything() {
    let (mut session, scheduler) = session_with(100, SIZE);
    let events = record(&mut session);
    let dropped = Rc::new(Cell::new(false));
    session.attach_listener(Guard(dropped.clone())).unwrap();
    let feed = session.feed().unwrap();
    assert!(scheduler.is_pending());

    let mut target = HeadlessTarget::new();
    session.destroy(Some(&mut target as &mut dyn RenderTarget)).unwrap();

    assert!(dropped.get());
    assert_eq!(scheduler.cancelled(), 1);
    assert!(!scheduler.is_pending());
    assert_eq!(session.subscriber_count(), 0);
    assert_eq!(session.listener_count(), 0);
    assert_eq!(session.engine().keys().count(), 0);
    assert!(target.scene().is_empty());
    assert!(feed.unbounded_send(StreamEvent::Append { bar: bar(100) }).is_err());
    assert!(events.borrow().is_empty());

    assert_eq!(session.tick(0.0, &mut target).unwrap_err(), ChartError::SessionDestroyed);
    assert_eq!(session.resize(SIZE).unwrap_err(), ChartError::SessionDestroyed);
    assert!(matches!(session.feed(), Err(ChartError::SessionDestroyed)));
    assert!(matches!(session.destroy(None), Err(ChartError::SessionDestroyed)));
}
