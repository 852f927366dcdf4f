pub mod rendering;
pub mod scheduler;
pub mod services;

pub use rendering::HeadlessTarget;
pub use scheduler::ManualFrameScheduler;
pub use services::{BrowserTimeProvider, ConsoleLogger, MemoryLogger};
