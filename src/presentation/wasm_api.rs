//! JavaScript bridge. Only translates DOM input and JSON; all behaviour lives
//! in the application layer.

use crate::application::{ChartEvent, ChartSession, FrameScheduler, InputEvent, Key, RenderTarget};
use crate::config::ChartConfig;
use crate::domain::chart::{SurfaceSize, Timeframe};
use crate::domain::errors::ChartError;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::Bar;
use crate::infrastructure::rendering::CanvasTarget;
use crate::presentation::lock_host;
use crate::{log_error, log_info, log_warn};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::render::{AnimationFrame, request_animation_frame};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent, WheelEvent};

const COMPONENT: LogComponent = LogComponent::Presentation("WasmChart");

/// Wheel delta per unit of pinch scale for ctrl+wheel trackpad pinches
const PINCH_SENSITIVITY: f64 = 0.01;

fn js_error(error: ChartError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn now_ms() -> f64 {
    web_sys::window().and_then(|w| w.performance()).map(|p| p.now()).unwrap_or_else(js_sys::Date::now)
}

struct ChartHost {
    session: ChartSession,
    target: CanvasTarget,
}

type FrameCallback = Rc<dyn Fn(f64)>;

/// `requestAnimationFrame` scheduler; the callback is bound once the host exists
#[derive(Clone, Default)]
struct AnimationFrameScheduler {
    frame: Rc<RefCell<Option<AnimationFrame>>>,
    on_frame: Rc<RefCell<Option<FrameCallback>>>,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) {
        let Some(callback) = self.on_frame.borrow().clone() else {
            return;
        };
        let handle = request_animation_frame(move |timestamp| callback(timestamp));
        *self.frame.borrow_mut() = Some(handle);
    }

    fn cancel_frame(&mut self) {
        // Dropping the handle cancels the request
        self.frame.borrow_mut().take();
        self.on_frame.borrow_mut().take();
    }
}

fn run_frame(host: &Weak<RefCell<ChartHost>>, now: f64) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let Ok(mut host) = host.try_borrow_mut() else {
        log_warn!(COMPONENT, "frame skipped: chart busy");
        return;
    };
    let ChartHost { session, target } = &mut *host;
    target.advance(now);
    match session.tick(now, target) {
        Ok(_) if target.is_animating() => {
            target.repaint();
            // Retained tweens outlive the frame that started them
            let _ = session.request_animation();
        }
        Ok(_) => {}
        Err(e) => log_error!(COMPONENT, "tick failed: {}", e),
    }
}

fn forward_input(host: &Weak<RefCell<ChartHost>>, input: InputEvent) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let Ok(mut host) = host.try_borrow_mut() else {
        return;
    };
    if let Err(e) = host.session.handle_input(input, now_ms()) {
        log_warn!(COMPONENT, "input dropped: {}", e);
    }
}

/// DOM listeners live as long as the session; destroy drops them
fn attach_listeners(host: &Rc<RefCell<ChartHost>>, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let mut guards = Vec::new();

    let pointer = |kind: &'static str| {
        let weak = Rc::downgrade(host);
        EventListener::new(canvas, kind, move |event| {
            let Some(event) = event.dyn_ref::<PointerEvent>() else {
                return;
            };
            let (x, y) = (event.offset_x() as f64, event.offset_y() as f64);
            let input = match kind {
                "pointerdown" => InputEvent::PointerDown { x, y },
                "pointermove" => InputEvent::PointerMove { x, y },
                "pointerup" => InputEvent::PointerUp { x, y },
                _ => InputEvent::PointerLeave,
            };
            forward_input(&weak, input);
        })
    };
    for kind in ["pointerdown", "pointermove", "pointerup", "pointerleave"] {
        guards.push(pointer(kind));
    }

    let weak = Rc::downgrade(host);
    let options = EventListenerOptions::enable_prevent_default();
    guards.push(EventListener::new_with_options(canvas, "wheel", options, move |event| {
        let Some(event) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        event.prevent_default();
        let (x, y) = (event.offset_x() as f64, event.offset_y() as f64);
        let input = if event.ctrl_key() {
            InputEvent::Pinch { x, y, scale: (-event.delta_y() * PINCH_SENSITIVITY).exp() }
        } else {
            InputEvent::Wheel { x, y, delta_y: event.delta_y() }
        };
        forward_input(&weak, input);
    }));

    let weak = Rc::downgrade(host);
    guards.push(EventListener::new(canvas, "keydown", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if let Ok(key) = Key::from_str(&event.key()) {
            forward_input(&weak, InputEvent::Key(key));
        }
    }));

    let mut host = lock_host(host).map_err(js_error)?;
    for guard in guards {
        host.session.attach_listener(guard).map_err(js_error)?;
    }
    Ok(())
}

/// Interactive chart bound to one `<canvas>` element
#[wasm_bindgen]
pub struct WasmChart {
    host: Rc<RefCell<ChartHost>>,
}

#[wasm_bindgen]
impl WasmChart {
    /// `bars_json` is an array of `{timestamp, open, high, low, close, volume}`
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, bars_json: &str, config_json: Option<String>) -> Result<WasmChart, JsValue> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(canvas_id))
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| JsValue::from_str(&format!("canvas #{} not found", canvas_id)))?;

        let config = match config_json {
            Some(raw) => ChartConfig::from_json(&raw).map_err(js_error)?,
            None => ChartConfig::default(),
        };
        let bars: Vec<Bar> = serde_json::from_str(bars_json)
            .map_err(|e| JsValue::from_str(&format!("malformed bars: {}", e)))?;

        let size = SurfaceSize::new(canvas.width(), canvas.height());
        let target = CanvasTarget::from_canvas(canvas.clone()).map_err(js_error)?;
        let scheduler = AnimationFrameScheduler::default();
        let session = ChartSession::create(config, bars, size, Box::new(scheduler.clone())).map_err(js_error)?;

        let host = Rc::new(RefCell::new(ChartHost { session, target }));
        let weak = Rc::downgrade(&host);
        *scheduler.on_frame.borrow_mut() = Some(Rc::new(move |now| run_frame(&weak, now)));
        // The first frame was requested before the callback was bound
        let mut kick = scheduler;
        kick.request_frame();

        attach_listeners(&host, &canvas)?;
        log_info!(COMPONENT, "chart mounted on #{}", canvas_id);
        Ok(Self { host })
    }

    /// Replace the indicator list; `configs_json` is an array of indicator configs
    #[wasm_bindgen(js_name = setIndicators)]
    pub fn set_indicators(&self, configs_json: &str) -> Result<(), JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        host.session.set_indicators_json(configs_json).map(|_| ()).map_err(js_error)
    }

    /// Merge one `{"type": "append" | "update", "bar": {...}}` message
    pub fn push(&self, event_json: &str) -> Result<(), JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        host.session.apply_stream_json(event_json).map(|_| ()).map_err(js_error)
    }

    /// Animate to a preset such as `1W` or `ALL`
    #[wasm_bindgen(js_name = setTimeframe)]
    pub fn set_timeframe(&self, label: &str) -> Result<bool, JsValue> {
        let timeframe = Timeframe::from_str(label)
            .map_err(|_| js_error(ChartError::invalid_parameter(format!("unknown timeframe {}", label))))?;
        let mut host = lock_host(&self.host).map_err(js_error)?;
        host.session.set_timeframe(timeframe, now_ms()).map_err(js_error)
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<(), JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        let size = SurfaceSize::new(width, height);
        host.target.resize(size);
        host.session.resize(size).map_err(js_error)
    }

    /// Register `callback(eventJson)`; returns an id for `unsubscribe`
    pub fn subscribe(&self, callback: js_sys::Function) -> Result<f64, JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        let id = host
            .session
            .subscribe(move |event: &ChartEvent| match serde_json::to_string(event) {
                Ok(json) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        log_warn!(COMPONENT, "subscriber threw: {:?}", e);
                    }
                }
                Err(e) => log_warn!(COMPONENT, "event not serializable: {}", e),
            })
            .map_err(js_error)?;
        Ok(id as f64)
    }

    pub fn unsubscribe(&self, id: f64) -> Result<bool, JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        host.session.unsubscribe(id as u64).map_err(js_error)
    }

    /// Detach listeners, cancel the pending frame and drop all draw state
    pub fn destroy(&self) -> Result<(), JsValue> {
        let mut host = lock_host(&self.host).map_err(js_error)?;
        let ChartHost { session, target } = &mut *host;
        session.destroy(Some(target as &mut dyn RenderTarget)).map_err(js_error)
    }
}
