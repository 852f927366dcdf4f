use crate::domain::chart::Viewport;
use crate::domain::logging::LogComponent;
use crate::log_debug;
use derive_more::Display;

const COMPONENT: LogComponent = LogComponent::Application("ViewportStateMachine");

/// User gestures that own the viewport while active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Gesture {
    Pan,
    Zoom,
    Brush,
}

/// Animated move between two viewports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Viewport,
    pub to: Viewport,
    pub started_ms: f64,
    pub duration_ms: f64,
}

impl Transition {
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn viewport_at(&self, now_ms: f64) -> Viewport {
        self.from.lerp(&self.to, ease_in_out_cubic(self.progress(now_ms)))
    }
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 { 4.0 * t * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0 }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportState {
    Idle,
    Panning { last_x: f64 },
    Zooming { last_input_ms: f64 },
    Brushing { anchor_x: f64, current_x: f64 },
    Transitioning(Transition),
}

impl ViewportState {
    pub fn gesture(&self) -> Option<Gesture> {
        match self {
            Self::Panning { .. } => Some(Gesture::Pan),
            Self::Zooming { .. } => Some(Gesture::Zoom),
            Self::Brushing { .. } => Some(Gesture::Brush),
            Self::Idle | Self::Transitioning(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Panning { .. } => "Panning",
            Self::Zooming { .. } => "Zooming",
            Self::Brushing { .. } => "Brushing",
            Self::Transitioning(_) => "Transitioning",
        }
    }
}

/// Sole owner of the viewport; arbitrates gestures and animations
#[derive(Debug, Clone)]
pub struct ViewportStateMachine {
    state: ViewportState,
    viewport: Viewport,
    transition_ms: f64,
    zoom_idle_ms: f64,
}

impl ViewportStateMachine {
    pub fn new(viewport: Viewport, transition_ms: f64, zoom_idle_ms: f64) -> Self {
        Self { state: ViewportState::Idle, viewport, transition_ms, zoom_idle_ms }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_idle(&self) -> bool {
        self.state == ViewportState::Idle
    }

    /// Enter a gesture state.
    ///
    /// A running transition is snapped to its current value first. Returns
    /// false when a different gesture already owns the viewport.
    pub fn begin(&mut self, gesture: Gesture, x: f64, now_ms: f64) -> bool {
        if let ViewportState::Transitioning(transition) = self.state {
            self.viewport = transition.viewport_at(now_ms);
            self.state = ViewportState::Idle;
            log_debug!(COMPONENT, "transition snapped for {}", gesture);
        }
        match (self.state, gesture) {
            (ViewportState::Idle, _) => {}
            (ViewportState::Zooming { .. }, Gesture::Zoom) => {}
            (current, _) => {
                log_debug!(COMPONENT, "{} refused while {}", gesture, current.name());
                return false;
            }
        }
        self.state = match gesture {
            Gesture::Pan => ViewportState::Panning { last_x: x },
            Gesture::Zoom => ViewportState::Zooming { last_input_ms: now_ms },
            Gesture::Brush => ViewportState::Brushing { anchor_x: x, current_x: x },
        };
        true
    }

    /// Leave `gesture`; no-op if it is not the active one
    pub fn end(&mut self, gesture: Gesture) -> bool {
        if self.state.gesture() == Some(gesture) {
            self.state = ViewportState::Idle;
            true
        } else {
            false
        }
    }

    /// Run a discrete mutation (keyboard pan or zoom) from Idle
    pub fn apply_discrete(&mut self, now_ms: f64, mutate: impl FnOnce(&mut Viewport)) -> bool {
        if let ViewportState::Transitioning(transition) = self.state {
            self.viewport = transition.viewport_at(now_ms);
            self.state = ViewportState::Idle;
        }
        if !self.is_idle() {
            return false;
        }
        mutate(&mut self.viewport);
        true
    }

    /// Drag update while panning; returns the horizontal delta applied
    pub fn drag_to(&mut self, x: f64, plot_width: f64) -> Option<f64> {
        let ViewportState::Panning { last_x } = &mut self.state else {
            return None;
        };
        let dx = x - *last_x;
        *last_x = x;
        self.viewport.pan_pixels(dx, plot_width);
        Some(dx)
    }

    /// Zoom step while zooming; also keeps the gesture alive
    pub fn zoom_step(&mut self, factor: f64, anchor_ratio: f64, now_ms: f64) -> bool {
        let ViewportState::Zooming { last_input_ms } = &mut self.state else {
            return false;
        };
        *last_input_ms = now_ms;
        self.viewport.zoom_at(factor, anchor_ratio);
        true
    }

    pub fn brush_to(&mut self, x: f64) -> bool {
        let ViewportState::Brushing { current_x, .. } = &mut self.state else {
            return false;
        };
        *current_x = x;
        true
    }

    /// Animate to `target` from wherever the viewport currently is.
    ///
    /// Refused while a pointer gesture owns the viewport; an idle-timeout zoom
    /// is ended instead.
    pub fn start_transition(&mut self, mut target: Viewport, now_ms: f64) -> bool {
        let from = match self.state {
            ViewportState::Panning { .. } | ViewportState::Brushing { .. } => return false,
            ViewportState::Transitioning(t) => t.viewport_at(now_ms),
            ViewportState::Idle | ViewportState::Zooming { .. } => self.viewport,
        };
        target.resize_data(self.viewport.len(), false);
        self.viewport = from;
        self.state = ViewportState::Transitioning(Transition {
            from,
            to: target,
            started_ms: now_ms,
            duration_ms: self.transition_ms,
        });
        true
    }

    /// Advance time-driven states; true when the viewport moved
    pub fn tick(&mut self, now_ms: f64) -> bool {
        match self.state {
            ViewportState::Transitioning(transition) => {
                let next = transition.viewport_at(now_ms);
                let moved = next != self.viewport;
                self.viewport = next;
                if transition.progress(now_ms) >= 1.0 {
                    self.viewport = transition.to;
                    self.state = ViewportState::Idle;
                }
                moved
            }
            ViewportState::Zooming { last_input_ms } if now_ms - last_input_ms >= self.zoom_idle_ms => {
                self.state = ViewportState::Idle;
                false
            }
            _ => false,
        }
    }

    /// Series length changed; only an idle window pinned to the live edge moves
    pub fn on_data_len(&mut self, len: usize) {
        let follow = self.is_idle() && self.viewport.is_pinned_right();
        self.viewport.resize_data(len, follow);
        if let ViewportState::Transitioning(t) = &mut self.state {
            t.from.resize_data(len, false);
            t.to.resize_data(len, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::ZoomLimits;

    fn machine() -> ViewportStateMachine {
        ViewportStateMachine::new(Viewport::new(100, ZoomLimits::default()), 300.0, 200.0)
    }

    #[test]
    fn gestures_are_exclusive() {
        let mut sm = machine();
        assert!(sm.begin(Gesture::Pan, 10.0, 0.0));
        assert!(!sm.begin(Gesture::Brush, 10.0, 0.0));
        assert!(!sm.begin(Gesture::Zoom, 10.0, 0.0));
        assert!(sm.end(Gesture::Pan));
        assert!(sm.is_idle());
    }

    #[test]
    fn zoom_ends_after_idle_timeout() {
        let mut sm = machine();
        assert!(sm.begin(Gesture::Zoom, 0.0, 1000.0));
        assert!(sm.begin(Gesture::Zoom, 0.0, 1100.0));
        sm.tick(1150.0);
        assert!(!sm.is_idle());
        sm.tick(1200.0);
        assert!(sm.is_idle());
    }

    #[test]
    fn transition_eases_to_target() {
        let mut sm = machine();
        let target = Viewport::with_window(100, 50.0, 50.0, ZoomLimits::default());
        assert!(sm.start_transition(target, 0.0));
        sm.tick(150.0);
        let mid = *sm.viewport();
        assert!((mid.start() - 25.0).abs() < 1e-9);
        sm.tick(300.0);
        assert_eq!(*sm.viewport(), target);
        assert!(sm.is_idle());
    }

    #[test]
    fn gesture_snaps_running_transition() {
        let mut sm = machine();
        let target = Viewport::with_window(100, 50.0, 50.0, ZoomLimits::default());
        sm.start_transition(target, 0.0);
        assert!(sm.begin(Gesture::Pan, 0.0, 150.0));
        assert!((sm.viewport().start() - 25.0).abs() < 1e-9);
        assert_eq!(sm.state().name(), "Panning");
    }

    #[test]
    fn merge_during_gesture_leaves_window() {
        let mut sm = machine();
        sm.begin(Gesture::Pan, 0.0, 0.0);
        let before = (sm.viewport().start(), sm.viewport().span());
        sm.on_data_len(101);
        assert_eq!((sm.viewport().start(), sm.viewport().span()), before);
    }
}
