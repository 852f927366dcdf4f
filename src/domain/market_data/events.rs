use super::entities::Bar;
use crate::domain::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

/// Streaming mutation delivered by the data feed.
///
/// Wire form: `{"type": "append", "bar": {...}}` or `{"type": "update", "bar": {...}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Append { bar: Bar },
    Update { bar: Bar },
}

impl StreamEvent {
    pub fn bar(&self) -> &Bar {
        match self {
            StreamEvent::Append { bar } | StreamEvent::Update { bar } => bar,
        }
    }

    /// Parse a wire message; unknown event types are protocol violations.
    pub fn from_json(raw: &str) -> ChartResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ChartError::ProtocolViolation(format!("malformed stream event: {}", e)))
    }
}
