//! Drawing backends for the render pipeline.

#[cfg(feature = "render")]
pub mod canvas_renderer;
pub mod gpu_structures;
pub mod headless;
pub mod retained_scene;

#[cfg(feature = "render")]
pub use canvas_renderer::CanvasTarget;
pub use gpu_structures::{InstanceBuffer, LineVertex, RectInstance, SurfaceUniforms, TextRun};
pub use headless::HeadlessTarget;
pub use retained_scene::{RenderedPrimitive, RetainedScene, TweenKind};
