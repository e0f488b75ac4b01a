/// Crate-wide result alias.
pub type LectioResult<T> = Result<T, LectioError>;

/// Error taxonomy for layout, rendering, encoding and orchestration.
///
/// Every failure is local to one content item. Only [`LectioError::Transient`] is ever retried,
/// and only for upstream generation calls (see [`crate::retry`]).
#[derive(thiserror::Error, Debug)]
pub enum LectioError {
    /// Missing images/audio, unusable drawing surface, empty audio. Never retried.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Invalid configuration or malformed input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Rate limiting or overload reported by an upstream generation service.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// Upstream failure that retrying will not fix.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Codec unsupported, capture stream broken, encoder process failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Runtime failure while preparing or painting frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LectioError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// `true` for errors an upstream retry policy may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// `true` for precondition violations (fail-fast, never retried).
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
