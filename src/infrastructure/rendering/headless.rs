use super::gpu_structures::InstanceBuffer;
use super::retained_scene::RetainedScene;
use crate::application::render_pipeline::{ImmediateSurface, RenderTarget, RetainedSurface};

/// Off-screen target: bulk frames land in instance buffers, diffed frames in
/// a retained scene. Used natively and in tests.
#[derive(Default)]
pub struct HeadlessTarget {
    instances: InstanceBuffer,
    scene: RetainedScene,
    presented: usize,
}

impl HeadlessTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    pub fn scene(&self) -> &RetainedScene {
        &self.scene
    }

    /// Advance retained animations to `now_ms`
    pub fn advance(&mut self, now_ms: f64) {
        self.scene.advance(now_ms);
    }

    /// Frames presented so far
    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderTarget for HeadlessTarget {
    fn immediate(&mut self) -> &mut dyn ImmediateSurface {
        &mut self.instances
    }

    fn retained(&mut self) -> &mut dyn RetainedSurface {
        &mut self.scene
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}
