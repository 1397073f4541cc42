//! Parse HTTP response header lines into a `ResponseHead`.

use super::ResponseHead;

/// Parse collected header lines. With redirects libcurl reports every header
/// block it saw; each status line starts a fresh head so only the final
/// response's headers survive.
pub(crate) fn parse_head(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead {
                status: line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|code| code.parse::<u32>().ok()),
                ..ResponseHead::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("content-type") {
                head.content_type = Some(value.to_string());
            }
        }
    }

    head
}
