//! Single owner of all draw state.
//!
//! Each frame the scene is rebuilt from scratch and either diffed against the
//! retained keyed set (sparse data) or emitted as a full redraw (dense data).

pub mod diff;
pub mod primitives;
pub mod scene;
pub mod surface;

pub use diff::{RetainedOp, diff};
pub use primitives::{Layer, Primitive, PrimitiveId, PrimitiveKey, Shape, TextAlign};
pub use scene::{SceneInput, build_scene};
pub use surface::{ImmediateSurface, RenderTarget, RetainedSurface};

use crate::domain::chart::SurfaceSize;
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_info};
use derive_more::Display;
use std::collections::BTreeMap;

const COMPONENT: LogComponent = LogComponent::Application("RenderPipeline");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RenderMode {
    Diffed,
    Bulk,
}

/// Output of one frame, before it is issued to a target
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Diffed {
        /// Bulk drawing left pixels on the immediate surface
        clear_immediate: bool,
        size: SurfaceSize,
        ops: Vec<RetainedOp>,
    },
    Bulk {
        /// Leaving diffed mode drops the retained scene
        clear_retained: bool,
        size: SurfaceSize,
        commands: Vec<Primitive>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Ops or draw commands issued
    pub primitives: usize,
    pub enters: usize,
    pub updates: usize,
    pub exits: usize,
}

pub struct RenderPipeline {
    retained: BTreeMap<PrimitiveKey, Primitive>,
    mode: Option<RenderMode>,
    bulk_threshold: usize,
    update_ms: f64,
}

impl RenderPipeline {
    pub fn new(bulk_threshold: usize, update_ms: f64) -> Self {
        Self { retained: BTreeMap::new(), mode: None, bulk_threshold, update_ms }
    }

    pub fn mode_for(&self, visible_count: usize) -> RenderMode {
        if visible_count >= self.bulk_threshold { RenderMode::Bulk } else { RenderMode::Diffed }
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    /// Build the next frame and update the retained keyed set
    pub fn frame(&mut self, input: &SceneInput<'_>) -> Frame {
        let (lo, hi) = input.scales.visible();
        let mode = self.mode_for(hi - lo + 1);
        let previous = self.mode.replace(mode);
        if previous != Some(mode) {
            log_info!(COMPONENT, "render mode {} ({} visible bars)", mode, hi - lo + 1);
        }
        let scene = build_scene(input);

        match mode {
            RenderMode::Diffed => {
                let ops = diff(&self.retained, &scene, self.update_ms);
                self.retained = scene.into_iter().map(|p| (p.key.clone(), p)).collect();
                Frame::Diffed {
                    clear_immediate: previous == Some(RenderMode::Bulk),
                    size: input.scales.layout.surface,
                    ops,
                }
            }
            RenderMode::Bulk => {
                let clear_retained = !self.retained.is_empty();
                self.retained.clear();
                Frame::Bulk { clear_retained, size: input.scales.layout.surface, commands: scene }
            }
        }
    }

    /// Build a frame and issue it to `target`
    pub fn render(&mut self, input: &SceneInput<'_>, target: &mut dyn RenderTarget) -> FrameStats {
        let frame = self.frame(input);
        let stats = Self::issue(&frame, target);
        log_debug!(
            COMPONENT,
            "frame: {} primitives, +{} ~{} -{}",
            stats.primitives,
            stats.enters,
            stats.updates,
            stats.exits
        );
        stats
    }

    pub fn issue(frame: &Frame, target: &mut dyn RenderTarget) -> FrameStats {
        let mut stats = FrameStats::default();
        match frame {
            Frame::Diffed { clear_immediate, size, ops } => {
                if *clear_immediate {
                    target.immediate().clear(*size);
                }
                let retained = target.retained();
                for op in ops {
                    match op {
                        RetainedOp::Enter { .. } => stats.enters += 1,
                        RetainedOp::Update { .. } => stats.updates += 1,
                        RetainedOp::Exit { .. } => stats.exits += 1,
                    }
                    retained.apply(op);
                }
                stats.primitives = ops.len();
            }
            Frame::Bulk { clear_retained, size, commands } => {
                if *clear_retained {
                    target.retained().clear_retained();
                }
                let immediate = target.immediate();
                immediate.clear(*size);
                for primitive in commands {
                    immediate.draw(primitive);
                }
                stats.primitives = commands.len();
            }
        }
        target.present();
        stats
    }

    /// Forget all retained primitives and clear the target's retained scene
    pub fn clear(&mut self, target: Option<&mut dyn RenderTarget>) {
        self.retained.clear();
        self.mode = None;
        if let Some(target) = target {
            target.retained().clear_retained();
        }
    }
}
