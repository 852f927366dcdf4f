use derive_more::Display;

/// Every recoverable failure the chart core reports.
///
/// None of these are fatal: they are returned to the caller or surfaced as
/// warning events, never raised inside the render loop.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ChartError {
    #[display(fmt = "Insufficient data: need {} bars, got {}", required, actual)]
    InsufficientData { required: usize, actual: usize },

    #[display(fmt = "Invalid parameter: {}", _0)]
    InvalidParameter(String),

    #[display(fmt = "Data integrity error at {}: {}", timestamp, reason)]
    DataIntegrity { timestamp: u64, reason: String },

    #[display(fmt = "Protocol violation: {}", _0)]
    ProtocolViolation(String),

    #[display(fmt = "Render surface unavailable ({}x{})", width, height)]
    SurfaceUnavailable { width: u32, height: u32 },

    #[display(fmt = "Chart session already destroyed")]
    SessionDestroyed,

    #[display(fmt = "Configuration error: {}", _0)]
    Config(String),

    /// A call arrived while the chart was still dispatching, e.g. from inside a subscriber
    #[display(fmt = "Chart is busy dispatching; retry after the current handler returns")]
    Busy,
}

impl std::error::Error for ChartError {}

impl ChartError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        ChartError::InvalidParameter(msg.into())
    }

    pub fn data_integrity(timestamp: u64, reason: impl Into<String>) -> Self {
        ChartError::DataIntegrity { timestamp, reason: reason.into() }
    }

    /// Warnings are reported to the consumer; everything else is returned.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ChartError::InsufficientData { .. }
                | ChartError::DataIntegrity { .. }
                | ChartError::ProtocolViolation(_)
        )
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(error: serde_json::Error) -> Self {
        ChartError::ProtocolViolation(error.to_string())
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
