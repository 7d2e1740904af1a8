use thiserror::Error;

/// Reasons a frame cannot be decoded into a structured record.
///
/// # Examples
/// ```text
/// use pingshark_core::analysis::decode::DecodeError;
///
/// let err = DecodeError::UnsupportedLinktype(147);
/// assert!(err.to_string().contains("147"));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packet slice error: {0}")]
    Slice(String),
    #[error("unsupported link type {0}")]
    UnsupportedLinktype(i32),
}
