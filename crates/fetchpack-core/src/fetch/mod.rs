//! Time- and size-bounded HTTP GET streamed into a sink.
//!
//! Uses the curl crate (libcurl). The response head is checked against the
//! validation policy before the first body byte reaches the sink, and the
//! body is cut off as soon as it grows past the byte cap. Runs in the
//! current thread; call from `spawn_blocking` if used from async code.

mod error;
mod parse;

pub use error::{classify_curl_error, FailureReason, NetworkErrorKind};

use std::cell::RefCell;
use std::io;
use std::str;
use std::time::Duration;

use crate::validate::ValidationPolicy;

/// Longest time spent establishing a connection, bounded by the overall timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: u32 = 10;

/// Key headers of the final response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    /// Raw `Content-Type` value, parameters included.
    pub content_type: Option<String>,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
}

/// Destination of an accepted response body.
pub trait BodySink {
    /// Called exactly once, after the head passed validation and before any
    /// body bytes (also for an empty body).
    fn begin(&mut self, head: &ResponseHead) -> io::Result<()>;

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Whole-transfer timeout (connect + headers + body).
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

enum Phase {
    AwaitingBody,
    Streaming,
    Failed(FailureReason),
}

/// Status first, then content type and declared size.
fn admit(head: &ResponseHead, policy: &ValidationPolicy) -> Result<(), FailureReason> {
    match head.status {
        Some(code) if (200..300).contains(&code) => {}
        Some(code) => return Err(FailureReason::HttpStatus(code)),
        None => return Err(FailureReason::HttpStatus(0)),
    }
    policy.check_response(head.content_type.as_deref(), head.content_length)?;
    Ok(())
}

/// GETs `url` and streams an accepted body into `sink`.
///
/// Returns the number of body bytes written. Every failure is a
/// `FailureReason`; if it happens after `begin`, the sink holds a partial
/// body the caller must discard.
pub fn fetch_into<S: BodySink>(
    url: &str,
    opts: &FetchOptions,
    policy: &ValidationPolicy,
    sink: &mut S,
) -> Result<u64, FailureReason> {
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let mut phase = Phase::AwaitingBody;
    let mut received: u64 = 0;

    let mut easy = curl::easy::Easy::new();
    let net = |e: curl::Error| FailureReason::network(&e);
    easy.url(url).map_err(net)?;
    easy.get(true).map_err(net)?;
    easy.follow_location(true).map_err(net)?;
    easy.max_redirections(MAX_REDIRECTS).map_err(net)?;
    easy.connect_timeout(CONNECT_TIMEOUT.min(opts.timeout))
        .map_err(net)?;
    easy.timeout(opts.timeout).map_err(net)?;
    easy.useragent(concat!("fetchpack/", env!("CARGO_PKG_VERSION")))
        .map_err(net)?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.borrow_mut().push(s.trim_end().to_string());
                }
                true
            })
            .map_err(net)?;
        transfer
            .write_function(|data| {
                if let Phase::AwaitingBody = phase {
                    let head = parse::parse_head(&headers.borrow());
                    if let Err(reason) = admit(&head, policy) {
                        phase = Phase::Failed(reason);
                        return Ok(0);
                    }
                    if let Err(e) = sink.begin(&head) {
                        phase = Phase::Failed(FailureReason::Archive(e.to_string()));
                        return Ok(0);
                    }
                    phase = Phase::Streaming;
                }
                if !matches!(phase, Phase::Streaming) {
                    return Ok(0);
                }
                received += data.len() as u64;
                if let Err(rejection) = policy.check_size(received) {
                    phase = Phase::Failed(rejection.into());
                    return Ok(0); // abort transfer
                }
                match sink.write_chunk(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        phase = Phase::Failed(FailureReason::Archive(e.to_string()));
                        Ok(0)
                    }
                }
            })
            .map_err(net)?;
        transfer.perform()
    };

    match (perform_result, phase) {
        (_, Phase::Failed(reason)) => Err(reason),
        (Err(e), _) => Err(FailureReason::network(&e)),
        (Ok(()), Phase::Streaming) => Ok(received),
        (Ok(()), Phase::AwaitingBody) => {
            // Empty body: the write callback never ran.
            let mut head = parse::parse_head(&headers.borrow());
            if head.status.is_none() {
                head.status = easy.response_code().ok();
            }
            admit(&head, policy)?;
            sink.begin(&head)
                .map_err(|e| FailureReason::Archive(e.to_string()))?;
            Ok(0)
        }
    }
}
