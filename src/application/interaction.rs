//! Pointer, wheel, pinch and keyboard input translated into viewport
//! mutations and consumer-facing intents.

use super::events::{ChartEvent, TimeRange, TimeframeSource};
use super::state_machine::{Gesture, ViewportState, ViewportStateMachine};
use crate::config::ChartConfig;
use crate::domain::chart::{CrosshairState, Point, ScaleSet, Timeframe, Viewport};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::BarSeries;
use crate::log_debug;
use serde::Deserialize;
use strum::{AsRefStr, EnumString};

const COMPONENT: LogComponent = LogComponent::Application("InteractionController");

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    #[strum(serialize = "+", serialize = "=")]
    ZoomIn,
    #[strum(serialize = "-", serialize = "_")]
    ZoomOut,
    Escape,
}

/// Input in surface pixels, already stripped of DOM specifics
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave,
    /// Positive `delta_y` scrolls down, which zooms out
    Wheel { x: f64, y: f64, delta_y: f64 },
    /// `scale` is the ratio to the previous pinch distance
    Pinch { x: f64, y: f64, scale: f64 },
    PinchEnd,
    #[serde(skip)]
    Key(Key),
}

/// Side effects of one input event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionOutcome {
    pub events: Vec<ChartEvent>,
    pub viewport_changed: bool,
    pub needs_redraw: bool,
}

impl InteractionOutcome {
    fn redraw() -> Self {
        Self { needs_redraw: true, ..Self::default() }
    }

    fn moved(moved: bool) -> Self {
        Self { viewport_changed: moved, needs_redraw: moved, ..Self::default() }
    }
}

/// What the controller reads besides its own state
pub struct InteractionContext<'a> {
    pub series: &'a BarSeries,
    pub scales: Option<&'a ScaleSet>,
    pub config: &'a ChartConfig,
    pub now_ms: f64,
}

/// Owns crosshair state; mutates the viewport only through the state machine
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    crosshair: Option<CrosshairState>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crosshair(&self) -> Option<&CrosshairState> {
        self.crosshair.as_ref()
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y), machine, ctx),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y), machine, ctx),
            InputEvent::PointerUp { x, .. } => self.pointer_up(x, machine, ctx),
            InputEvent::PointerLeave => self.pointer_leave(machine),
            InputEvent::Wheel { x, y, delta_y } => {
                let factor = (-delta_y * ctx.config.wheel_sensitivity).exp();
                self.zoom(Point::new(x, y), factor, machine, ctx)
            }
            InputEvent::Pinch { x, y, scale } => self.zoom(Point::new(x, y), scale, machine, ctx),
            InputEvent::PinchEnd => {
                machine.end(Gesture::Zoom);
                InteractionOutcome::default()
            }
            InputEvent::Key(key) => self.key(key, machine, ctx),
        }
    }

    /// Re-snap the crosshair after scales changed under a still pointer
    pub fn refresh_crosshair(&mut self, scales: &ScaleSet) -> Option<ChartEvent> {
        let current = self.crosshair?;
        let next = CrosshairState::snap(scales, current.position);
        self.set_crosshair(next)
    }

    fn pointer_down(
        &mut self,
        p: Point,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        let Some(scales) = ctx.scales else {
            return InteractionOutcome::default();
        };
        let gesture = if scales.layout.on_time_axis(p) {
            Gesture::Brush
        } else if scales.layout.in_plot(p) {
            Gesture::Pan
        } else {
            return InteractionOutcome::default();
        };
        let before = *machine.viewport();
        if machine.begin(gesture, p.x, ctx.now_ms) {
            log_debug!(COMPONENT, "{} started at {:.1}", gesture, p.x);
        }
        let mut outcome = InteractionOutcome::moved(before != *machine.viewport());
        if gesture == Gesture::Brush {
            outcome.needs_redraw = true;
        }
        outcome
    }

    fn pointer_move(
        &mut self,
        p: Point,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        let Some(scales) = ctx.scales else {
            return InteractionOutcome::default();
        };
        match *machine.state() {
            ViewportState::Panning { .. } => {
                let before = *machine.viewport();
                machine.drag_to(p.x, scales.layout.plot_width());
                InteractionOutcome::moved(before != *machine.viewport())
            }
            ViewportState::Brushing { .. } => {
                let plot = scales.layout.plot();
                machine.brush_to(p.x.clamp(plot.x, plot.right()));
                InteractionOutcome::redraw()
            }
            _ => {
                let next = CrosshairState::snap(scales, p);
                let mut outcome = InteractionOutcome::default();
                if let Some(event) = self.set_crosshair(next) {
                    outcome.events.push(event);
                    outcome.needs_redraw = true;
                }
                outcome
            }
        }
    }

    fn pointer_up(
        &mut self,
        x: f64,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        match *machine.state() {
            ViewportState::Panning { .. } => {
                machine.drag_to(x, ctx.scales.map_or(0.0, |s| s.layout.plot_width()));
                machine.end(Gesture::Pan);
                InteractionOutcome::redraw()
            }
            ViewportState::Brushing { anchor_x, .. } => {
                machine.end(Gesture::Brush);
                let mut outcome = InteractionOutcome::redraw();
                let Some(scales) = ctx.scales else {
                    return outcome;
                };
                let plot = scales.layout.plot();
                let end_x = x.clamp(plot.x, plot.right());
                if (end_x - anchor_x).abs() < scales.x.band_width() {
                    log_debug!(COMPONENT, "brush narrower than one bar ignored");
                    return outcome;
                }
                let (Some(a), Some(b)) = (scales.x.index_at(anchor_x), scales.x.index_at(end_x)) else {
                    return outcome;
                };
                if let Some(range) = TimeRange::from_indices(ctx.series, a, b) {
                    let target = viewport_for(machine.viewport(), &range);
                    outcome.viewport_changed = machine.start_transition(target, ctx.now_ms);
                    outcome.events.push(ChartEvent::TimeframeChange { range, source: TimeframeSource::Brush });
                }
                outcome
            }
            _ => InteractionOutcome::default(),
        }
    }

    fn pointer_leave(&mut self, machine: &mut ViewportStateMachine) -> InteractionOutcome {
        let mut outcome = InteractionOutcome::default();
        if machine.end(Gesture::Pan) || machine.end(Gesture::Brush) {
            outcome.needs_redraw = true;
        }
        if let Some(event) = self.set_crosshair(None) {
            outcome.events.push(event);
            outcome.needs_redraw = true;
        }
        outcome
    }

    fn zoom(
        &mut self,
        p: Point,
        factor: f64,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        let Some(scales) = ctx.scales else {
            return InteractionOutcome::default();
        };
        if !scales.layout.in_plot(p) || !machine.begin(Gesture::Zoom, p.x, ctx.now_ms) {
            return InteractionOutcome::default();
        }
        let plot = scales.layout.plot();
        let ratio = if plot.width > 0.0 { (p.x - plot.x) / plot.width } else { 0.5 };
        let before = *machine.viewport();
        machine.zoom_step(factor, ratio, ctx.now_ms);
        InteractionOutcome::moved(before != *machine.viewport())
    }

    fn key(
        &mut self,
        key: Key,
        machine: &mut ViewportStateMachine,
        ctx: &InteractionContext<'_>,
    ) -> InteractionOutcome {
        let config = ctx.config;
        let before = *machine.viewport();
        let applied = match key {
            Key::Escape => {
                let cancelled = machine.end(Gesture::Brush);
                return InteractionOutcome { needs_redraw: cancelled, ..InteractionOutcome::default() };
            }
            Key::ArrowLeft | Key::ArrowRight => {
                let sign = if key == Key::ArrowLeft { -1.0 } else { 1.0 };
                machine.apply_discrete(ctx.now_ms, |vp| vp.pan_bars(sign * config.key_pan_fraction * vp.span()))
            }
            Key::ZoomIn => machine.apply_discrete(ctx.now_ms, |vp| vp.zoom_at(config.key_zoom_factor, 0.5)),
            Key::ZoomOut => machine.apply_discrete(ctx.now_ms, |vp| vp.zoom_at(1.0 / config.key_zoom_factor, 0.5)),
        };
        InteractionOutcome::moved(applied && before != *machine.viewport())
    }

    fn set_crosshair(&mut self, next: Option<CrosshairState>) -> Option<ChartEvent> {
        if self.crosshair == next {
            return None;
        }
        self.crosshair = next;
        Some(ChartEvent::CrosshairMove { crosshair: next })
    }
}

/// Target window for a preset timeframe, measured back from the newest bar
pub fn timeframe_range(series: &BarSeries, timeframe: Timeframe) -> Option<TimeRange> {
    let last = series.last()?;
    let end_index = series.len() - 1;
    let start_index = match timeframe.span_ms() {
        Some(span) => series.index_at_or_after(last.timestamp.value().saturating_sub(span)).min(end_index),
        None => 0,
    };
    TimeRange::from_indices(series, start_index, end_index)
}

/// Viewport showing `range`, derived from the current one
pub fn viewport_for(current: &Viewport, range: &TimeRange) -> Viewport {
    let mut target = *current;
    target.show_range(range.start_index, range.end_index);
    target
}
