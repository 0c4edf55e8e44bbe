use thiserror::Error;

/// Failures raised by the graph query layer.
///
/// `NotFound` is the only variant callers may translate into a "missing
/// resource" outcome; everything else is a server-side failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous result: expected one row, got {rows} ({context})")]
    Ambiguous { rows: usize, context: String },

    #[error("Decode error on property `{property}`: {reason}")]
    Decode { property: String, reason: String },

    #[error("Transient error: {0}")]
    Transient(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn decode(property: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Decode {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
