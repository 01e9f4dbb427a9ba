/// Convenience result type used across fadegif.
pub type FadeGifResult<T> = Result<T, FadeGifError>;

/// Top-level error taxonomy used by the library APIs.
#[derive(thiserror::Error, Debug)]
pub enum FadeGifError {
    /// Invalid caller-provided arguments or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Input bytes could not be decoded as a supported image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The GIF encoder rejected a frame or failed to write.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FadeGifError {
    /// Build a [`FadeGifError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FadeGifError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FadeGifError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` when the error was caused by the caller's input rather than the host.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Decode(_))
    }
}

impl From<gif::EncodingError> for FadeGifError {
    fn from(err: gif::EncodingError) -> Self {
        Self::Encode(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
