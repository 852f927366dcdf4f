//! Market data aggregate: bars, the append-only series, validation and stream events.

pub mod entities;
pub mod events;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use events::StreamEvent;
pub use services::DataValidationService;
pub use value_objects::*;
