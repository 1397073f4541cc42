//! Per-file failure reasons and curl error classification.

use std::fmt;

use crate::validate::Rejection;

/// Broad class of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Connect or transfer exceeded the fetch timeout.
    Timeout,
    /// DNS, refused connection, reset, empty reply.
    Connection,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Timeout => f.write_str("timeout"),
            NetworkErrorKind::Connection => f.write_str("connection"),
            NetworkErrorKind::Other => f.write_str("other"),
        }
    }
}

/// Why one URL did not make it into the archive. Never fatal to the job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// Refused by the validation policy (scheme, extension, type, size).
    #[error("{0}")]
    Rejected(#[from] Rejection),
    #[error("network error ({kind}): {detail}")]
    Network {
        kind: NetworkErrorKind,
        detail: String,
    },
    #[error("HTTP {0}")]
    HttpStatus(u32),
    /// Writing the entry into the container failed.
    #[error("archive error: {0}")]
    Archive(String),
}

impl FailureReason {
    pub fn network(e: &curl::Error) -> Self {
        FailureReason::Network {
            kind: classify_curl_error(e),
            detail: e.description().to_string(),
        }
    }

    pub fn is_size(&self) -> bool {
        matches!(self, FailureReason::Rejected(r) if r.is_size())
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> NetworkErrorKind {
    if e.is_operation_timedout() {
        return NetworkErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return NetworkErrorKind::Connection;
    }
    NetworkErrorKind::Other
}
