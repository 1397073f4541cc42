//! URL modeling and archive entry naming.
//!
//! Derives safe, flat entry names from URL paths, corrected to the extension
//! the response's content type calls for.

mod path;
mod sanitize;

pub use path::{extension_of, filename_from_url_path, stem_of};
pub use sanitize::sanitize_entry_name;

use std::collections::HashSet;

use crate::validate::{canonical_extensions, default_file_name};

/// Derives the zip entry name for a fetched URL.
///
/// Uses the last path segment of `url` (query stripped, sanitized). If the
/// content type has canonical extensions and the name's extension is not one
/// of them, the extension is replaced. Empty or reserved names fall back to a
/// per-type default.
///
/// # Examples
///
/// - `derive_entry_name("https://x/a.pdf?sig=1", "application/pdf")` → `"a.pdf"`
/// - `derive_entry_name("https://x/photo.png", "image/jpeg")` → `"photo.jpeg"`
/// - `derive_entry_name("https://x/", "application/pdf")` → `"document.pdf"`
pub fn derive_entry_name(url: &str, content_type: &str) -> String {
    let fallback = default_file_name(content_type);
    let name = match filename_from_url_path(url).map(|n| sanitize_entry_name(&n)) {
        Some(n) if !n.is_empty() && n != "." && n != ".." => n,
        _ => return fallback.to_string(),
    };

    let allowed = canonical_extensions(content_type);
    if allowed.is_empty() {
        return name;
    }
    match extension_of(&name) {
        Some(ext) if allowed.contains(&ext.as_str()) => name,
        _ => {
            let stem = stem_of(&name);
            if stem.is_empty() {
                fallback.to_string()
            } else {
                format!("{}{}", stem, allowed[0])
            }
        }
    }
}

/// Returns `candidate`, or `stem-N.ext` with the smallest `N >= 1` not in `taken`.
pub fn unique_entry_name(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    let stem = stem_of(candidate);
    let ext = &candidate[stem.len()..];
    (1u32..)
        .map(|n| format!("{}-{}{}", stem, n, ext))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}
