/// Result alias that carries the custom [`RingVizError`] type.
pub type Result<T> = std::result::Result<T, RingVizError>;

/// Common error type for the core crate.
///
/// The model itself never fails — invalid mutations degrade to silent
/// no-ops — so the variants here cover the shared-access layer and the
/// snapshot export path only.
#[derive(Debug, thiserror::Error)]
pub enum RingVizError {
    /// Free-form failure, primarily a poisoned model lock surfacing to the
    /// caller as a readable message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl RingVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
