//! Orchestration over the domain: viewport arbitration, input handling,
//! frame production and the session that ties them together.

pub mod events;
pub mod interaction;
pub mod render_pipeline;
pub mod session;
pub mod state_machine;

pub use events::{ChartEvent, EventDispatcher, InMemoryEventDispatcher, SubscriptionId, TimeRange, TimeframeSource, ViewportDomain};
pub use interaction::{InputEvent, InteractionController, Key};
pub use render_pipeline::{Frame, FrameStats, RenderMode, RenderPipeline, RenderTarget};
pub use session::{ChartSession, FrameScheduler, TickReport};
pub use state_machine::{Gesture, ViewportState, ViewportStateMachine};
