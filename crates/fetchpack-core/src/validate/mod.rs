//! URL and response validation policy.
//!
//! A single `ValidationPolicy` is built from config and shared (behind an
//! `Arc`) by the attach path and the archiver. Extension checks on the URL are
//! an early rejection only; the response content type decides what gets packed.

mod mime;
mod rejection;

pub use mime::{canonical_extensions, default_file_name, normalize_content_type};
pub use rejection::Rejection;

use crate::url_model;

/// URL schemes a job may fetch from.
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Immutable acceptance rules for candidate URLs and fetched responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
    max_file_size: u64,
}

impl ValidationPolicy {
    /// Build a policy. Extensions are normalized to lower case with a leading
    /// dot (`"PDF"` → `".pdf"`); content types are lower-cased and stripped of
    /// parameters. An empty list disables that check.
    pub fn new<E, C>(allowed_extensions: E, allowed_content_types: C, max_file_size: u64) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        let allowed_content_types = allowed_content_types
            .into_iter()
            .map(|c| normalize_content_type(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            allowed_extensions,
            allowed_content_types,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Checks scheme (http/https only) and, when an extension allow-list is
    /// configured, the extension of the last path segment. URLs whose path
    /// has no extension pass the extension check.
    pub fn check_url(&self, raw: &str) -> Result<(), Rejection> {
        let parsed =
            url::Url::parse(raw.trim()).map_err(|_| Rejection::InvalidUrl(raw.to_string()))?;
        if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Rejection::UnsupportedScheme(parsed.scheme().to_string()));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(Rejection::InvalidUrl(raw.to_string()));
        }
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }
        let ext = url_model::filename_from_url_path(raw.trim())
            .and_then(|name| url_model::extension_of(&name));
        match ext {
            Some(ext) if !self.allowed_extensions.contains(&ext) => {
                Err(Rejection::ExtensionNotAllowed(ext))
            }
            _ => Ok(()),
        }
    }

    pub fn accept_url(&self, raw: &str) -> bool {
        self.check_url(raw).is_ok()
    }

    /// Checks a response's declared `Content-Type` against the allow-list.
    /// A missing header is rejected whenever an allow-list is configured.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<(), Rejection> {
        if self.allowed_content_types.is_empty() {
            return Ok(());
        }
        let normalized = content_type.map(normalize_content_type).unwrap_or_default();
        if self.allowed_content_types.contains(&normalized) {
            Ok(())
        } else {
            Err(Rejection::ContentTypeNotAllowed(
                content_type.unwrap_or_default().trim().to_string(),
            ))
        }
    }

    /// Checks a byte count (declared or actually received) against the cap.
    pub fn check_size(&self, size: u64) -> Result<(), Rejection> {
        if size > self.max_file_size {
            Err(Rejection::TooLarge {
                size,
                limit: self.max_file_size,
            })
        } else {
            Ok(())
        }
    }

    /// Content type first, then declared size. An absent `Content-Length`
    /// passes here; the streamed byte count is capped separately.
    pub fn check_response(
        &self,
        content_type: Option<&str>,
        declared_size: Option<u64>,
    ) -> Result<(), Rejection> {
        self.check_content_type(content_type)?;
        match declared_size {
            Some(size) => self.check_size(size),
            None => Ok(()),
        }
    }

    pub fn accept_response(&self, content_type: Option<&str>, declared_size: Option<u64>) -> bool {
        self.check_response(content_type, declared_size).is_ok()
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_ascii_lowercase()))
}
