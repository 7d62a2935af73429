/// Convenience alias for results produced by this crate.
pub type BlendixResult<T> = Result<T, BlendixError>;

/// Errors surfaced by operator construction and validation.
///
/// The scanline compose paths themselves are total functions over valid
/// buffers; buffer-shape violations there are programmer errors and panic
/// rather than returning a variant of this type.
#[derive(thiserror::Error, Debug)]
pub enum BlendixError {
    /// A constructor argument was outside its documented domain.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other error, preserved with its source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlendixError {
    /// Build a [`BlendixError::Validation`] from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
