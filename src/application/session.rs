use super::events::{
    ChartEvent, EventDispatcher, InMemoryEventDispatcher, SubscriptionId, TimeframeSource, ViewportDomain,
};
use super::interaction::{InputEvent, InteractionContext, InteractionController, timeframe_range, viewport_for};
use super::render_pipeline::{FrameStats, RenderMode, RenderPipeline, RenderTarget, SceneInput};
use super::state_machine::{ViewportState, ViewportStateMachine};
use crate::config::ChartConfig;
use crate::domain::chart::{PanelLayout, ScaleCoordinator, ScaleSet, SurfaceSize, Timeframe, Viewport};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::indicators::{ConfigDiff, IndicatorConfig, IndicatorEngine, Placement};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Bar, BarSeries, SeriesChange, StreamEvent};
use crate::{log_debug, log_info, log_warn};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::any::Any;

const COMPONENT: LogComponent = LogComponent::Application("ChartSession");

/// Source of animation-frame callbacks
pub trait FrameScheduler {
    /// Ask for one `tick` on the next frame
    fn request_frame(&mut self);
    /// Drop a requested frame that has not fired yet
    fn cancel_frame(&mut self);
}

/// Result of one `tick`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub rendered: bool,
    /// Surface is zero-sized; nothing was drawn
    pub paused: bool,
    pub mode: Option<RenderMode>,
    pub stats: FrameStats,
    pub indicators_pending: bool,
}

/// One interactive chart: data, indicators, viewport and draw state.
///
/// Mutations mark the session dirty and request a frame; `tick` renders at
/// most once however many mutations arrived since the previous frame.
pub struct ChartSession {
    config: ChartConfig,
    series: BarSeries,
    engine: IndicatorEngine,
    machine: ViewportStateMachine,
    interaction: InteractionController,
    pipeline: RenderPipeline,
    dispatcher: InMemoryEventDispatcher,
    scheduler: Box<dyn FrameScheduler>,
    listeners: Vec<Box<dyn Any>>,
    inbox: UnboundedReceiver<StreamEvent>,
    inbox_tx: UnboundedSender<StreamEvent>,
    size: SurfaceSize,
    scales: Option<ScaleSet>,
    last_domain: Option<ViewportDomain>,
    pending_warnings: Vec<ChartError>,
    frame_requested: bool,
    dirty: bool,
    destroyed: bool,
}

impl ChartSession {
    /// Build a session over an initial batch; malformed bars are dropped and
    /// reported as warnings on the first frame.
    pub fn create(
        config: ChartConfig,
        bars: Vec<Bar>,
        size: SurfaceSize,
        scheduler: Box<dyn FrameScheduler>,
    ) -> ChartResult<Self> {
        config.validate()?;
        let (series, rejected) = BarSeries::from_bars(bars);
        if !rejected.is_empty() {
            log_warn!(COMPONENT, "{} malformed bars dropped on load", rejected.len());
        }
        let viewport = Viewport::new(series.len(), config.zoom);
        let (inbox_tx, inbox) = mpsc::unbounded();
        log_info!(COMPONENT, "session created: {} bars, {}x{}", series.len(), size.width, size.height);

        let mut session = Self {
            machine: ViewportStateMachine::new(viewport, config.transition_ms, config.zoom_idle_ms),
            pipeline: RenderPipeline::new(config.bulk_threshold, config.update_transition_ms),
            interaction: InteractionController::new(),
            engine: IndicatorEngine::new(),
            dispatcher: InMemoryEventDispatcher::new(),
            listeners: Vec::new(),
            scales: None,
            last_domain: None,
            pending_warnings: rejected,
            frame_requested: false,
            dirty: false,
            destroyed: false,
            config,
            series,
            scheduler,
            inbox,
            inbox_tx,
            size,
        };
        session.invalidate();
        Ok(session)
    }

    pub fn set_indicators(&mut self, configs: &[IndicatorConfig]) -> ChartResult<ConfigDiff> {
        self.ensure_alive()?;
        let diff = self.engine.set_configs(configs)?;
        self.invalidate();
        Ok(diff)
    }

    pub fn set_indicators_json(&mut self, raw: &str) -> ChartResult<ConfigDiff> {
        self.ensure_alive()?;
        let configs = IndicatorConfig::list_from_json(raw)?;
        self.set_indicators(&configs)
    }

    /// Merge one streaming event into the series and every caught-up indicator.
    ///
    /// The viewport is not touched during a gesture; scales catch up on the next frame.
    pub fn apply_stream_event(&mut self, event: StreamEvent) -> ChartResult<SeriesChange> {
        self.ensure_alive()?;
        let result = match event {
            StreamEvent::Append { bar } => self.series.append(bar),
            StreamEvent::Update { bar } => self.series.update_last(bar),
        };
        let change = match result {
            Ok(change) => change,
            Err(error) => {
                log_warn!(COMPONENT, "stream event rejected: {}", error);
                self.dispatcher.publish(&ChartEvent::Warning { error: error.clone() });
                return Err(error);
            }
        };
        match change {
            SeriesChange::Appended => {
                self.engine.on_bar_appended(&self.series);
                self.machine.on_data_len(self.series.len());
            }
            SeriesChange::LastUpdated => self.engine.on_last_updated(&self.series),
        }
        self.invalidate();
        Ok(change)
    }

    pub fn apply_stream_json(&mut self, raw: &str) -> ChartResult<SeriesChange> {
        self.ensure_alive()?;
        match StreamEvent::from_json(raw) {
            Ok(event) => self.apply_stream_event(event),
            Err(error) => {
                self.dispatcher.publish(&ChartEvent::Warning { error: error.clone() });
                Err(error)
            }
        }
    }

    /// Sender for producers without access to the session; drained every tick
    pub fn feed(&self) -> ChartResult<UnboundedSender<StreamEvent>> {
        self.ensure_alive()?;
        Ok(self.inbox_tx.clone())
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: f64) -> ChartResult<()> {
        self.ensure_alive()?;
        if self.scales.is_none() {
            self.scales = self.compute_scales();
        }
        let ctx = InteractionContext {
            series: &self.series,
            scales: self.scales.as_ref(),
            config: &self.config,
            now_ms,
        };
        let outcome = self.interaction.handle(event, &mut self.machine, &ctx);
        for event in &outcome.events {
            self.dispatcher.publish(event);
        }
        if outcome.needs_redraw || outcome.viewport_changed || !self.machine.is_idle() {
            self.invalidate();
        }
        Ok(())
    }

    /// Animate to a preset range measured back from the newest bar.
    ///
    /// Returns false when a pointer gesture currently owns the viewport.
    pub fn set_timeframe(&mut self, timeframe: Timeframe, now_ms: f64) -> ChartResult<bool> {
        self.ensure_alive()?;
        let Some(range) = timeframe_range(&self.series, timeframe) else {
            return Ok(false);
        };
        let target = viewport_for(self.machine.viewport(), &range);
        if !self.machine.start_transition(target, now_ms) {
            log_debug!(COMPONENT, "timeframe {} refused during {}", timeframe, self.machine.state().name());
            return Ok(false);
        }
        self.dispatcher.publish(&ChartEvent::TimeframeChange { range, source: TimeframeSource::Preset(timeframe) });
        self.invalidate();
        Ok(true)
    }

    pub fn resize(&mut self, size: SurfaceSize) -> ChartResult<()> {
        self.ensure_alive()?;
        if size == self.size {
            return Ok(());
        }
        self.size = size;
        self.scales = None;
        if !size.is_drawable() {
            log_info!(COMPONENT, "{}", ChartError::SurfaceUnavailable { width: size.width, height: size.height });
        }
        self.invalidate();
        Ok(())
    }

    pub fn subscribe<F>(&mut self, handler: F) -> ChartResult<SubscriptionId>
    where
        F: FnMut(&ChartEvent) + 'static,
    {
        self.ensure_alive()?;
        Ok(self.dispatcher.subscribe(handler))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> ChartResult<bool> {
        self.ensure_alive()?;
        Ok(self.dispatcher.unsubscribe(id))
    }

    /// Keep a listener registration (e.g. a DOM event guard) alive until destroy
    pub fn attach_listener<G: 'static>(&mut self, guard: G) -> ChartResult<()> {
        self.ensure_alive()?;
        self.listeners.push(Box::new(guard));
        Ok(())
    }

    /// Ask for another frame without invalidating, e.g. while backend tweens run
    pub fn request_animation(&mut self) -> ChartResult<()> {
        self.ensure_alive()?;
        self.request_frame();
        Ok(())
    }

    /// One animation frame: drain the inbox, advance animations and indicator
    /// work, then render once if anything changed.
    pub fn tick(&mut self, now_ms: f64, target: &mut dyn RenderTarget) -> ChartResult<TickReport> {
        self.ensure_alive()?;
        self.frame_requested = false;
        let mut report = TickReport::default();

        while let Ok(event) = self.inbox.try_recv() {
            // Rejections were already surfaced as warnings
            let _ = self.apply_stream_event(event);
        }
        for error in std::mem::take(&mut self.pending_warnings) {
            self.dispatcher.publish(&ChartEvent::Warning { error });
        }

        if self.machine.tick(now_ms) {
            self.dirty = true;
        }

        let pump = self.engine.pump(&self.series, self.config.recompute_chunk_bars);
        if pump.made_progress() {
            self.dirty = true;
        }
        for error in pump.warnings {
            self.dispatcher.publish(&ChartEvent::Warning { error });
        }
        report.indicators_pending = self.engine.has_pending(self.series.len());

        if !self.size.is_drawable() {
            report.paused = true;
        } else if self.dirty {
            self.render(target, &mut report);
        }

        if report.indicators_pending || !self.machine.is_idle() {
            self.request_frame();
        }
        Ok(report)
    }

    /// Release every listener, subscription, pending frame and retained primitive
    pub fn destroy(&mut self, target: Option<&mut dyn RenderTarget>) -> ChartResult<()> {
        self.ensure_alive()?;
        self.destroyed = true;
        self.dispatcher.clear();
        self.listeners.clear();
        if self.frame_requested {
            self.scheduler.cancel_frame();
            self.frame_requested = false;
        }
        self.engine.clear();
        self.pipeline.clear(target);
        self.inbox.close();
        self.scales = None;
        log_info!(COMPONENT, "session destroyed");
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn viewport(&self) -> &Viewport {
        self.machine.viewport()
    }

    pub fn state(&self) -> &ViewportState {
        self.machine.state()
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn scales(&self) -> Option<&ScaleSet> {
        self.scales.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.len()
    }

    fn render(&mut self, target: &mut dyn RenderTarget, report: &mut TickReport) {
        let Some(scales) = self.compute_scales() else {
            self.dirty = false;
            return;
        };
        if let Some(event) = self.interaction.refresh_crosshair(&scales) {
            self.dispatcher.publish(&event);
        }
        let brush = match *self.machine.state() {
            ViewportState::Brushing { anchor_x, current_x } => Some((anchor_x, current_x)),
            _ => None,
        };
        let input = SceneInput {
            series: &self.series,
            engine: &self.engine,
            scales: &scales,
            crosshair: self.interaction.crosshair(),
            brush,
            config: &self.config,
        };
        report.stats = self.pipeline.render(&input, target);
        report.mode = self.pipeline.mode();
        report.rendered = true;
        self.scales = Some(scales);
        self.dirty = false;

        let domain = ViewportDomain::of(self.machine.viewport(), &self.series);
        if domain != self.last_domain {
            self.last_domain = domain;
            if let Some(domain) = domain {
                self.dispatcher.publish(&ChartEvent::ViewportChange { domain });
            }
        }
    }

    fn compute_scales(&self) -> Option<ScaleSet> {
        if !self.size.is_drawable() {
            return None;
        }
        let oscillators = self.engine.visible_with(self.series.len(), Placement::Oscillator).len();
        let layout = PanelLayout::split(self.size, oscillators, &self.config.layout);
        ScaleCoordinator::compute(
            self.machine.viewport(),
            &self.series,
            &self.engine,
            &layout,
            &self.config.scale_options(),
        )
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.request_frame();
    }

    fn request_frame(&mut self) {
        if !self.frame_requested {
            self.frame_requested = true;
            self.scheduler.request_frame();
        }
    }

    fn ensure_alive(&self) -> ChartResult<()> {
        if self.destroyed { Err(ChartError::SessionDestroyed) } else { Ok(()) }
    }
}
