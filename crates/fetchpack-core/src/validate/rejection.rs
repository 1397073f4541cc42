//! Reasons a URL or response is refused by the validation policy.

/// Why the policy refused a URL or a response.
///
/// The `Display` text is what ends up in a file's `reason` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("file extension not allowed: {0}")]
    ExtensionNotAllowed(String),
    #[error("invalid type: {0}")]
    ContentTypeNotAllowed(String),
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

impl Rejection {
    pub fn is_size(&self) -> bool {
        matches!(self, Rejection::TooLarge { .. })
    }
}
