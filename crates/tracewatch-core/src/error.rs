//! Error types for Tracewatch

use thiserror::Error;

/// Result type alias using Tracewatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tracewatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credential or connection setup failure
    #[error("Initialization failed: {0}")]
    Init(String),

    /// Transport or auth failure while querying the trace backend
    #[error("Trace backend error: {0}")]
    Backend(String),

    /// Single-trace lookup miss
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: String,
        /// Identifier that missed
        id: String,
    },

    /// Malformed receiver or proxy configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Webhook POST transport or non-success-status failure
    #[error("Alert delivery failed: {0}")]
    Delivery(String),

    /// Backend returned data violating an invariant (e.g. a trace with no spans)
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// Caller-supplied query is malformed
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a data integrity error
    pub fn data_integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
