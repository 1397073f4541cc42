//! Archive entry name sanitization.

/// Longest entry name we emit, in bytes.
const NAME_MAX: usize = 255;

/// Sanitizes a candidate name for use as a flat zip entry.
///
/// - Replaces path separators, NUL, control characters, whitespace and the
///   characters common extractors refuse (`: * ? " < > |`) with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots, spaces and underscores
/// - Limits length to 255 bytes on a char boundary
pub fn sanitize_entry_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let unsafe_char = matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            || c.is_control()
            || c.is_whitespace();
        let replacement = if unsafe_char { '_' } else { c };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
