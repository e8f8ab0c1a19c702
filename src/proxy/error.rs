//! Pipeline failures and the fixed-shape 500 they turn into.

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

/// Content type of error responses. The stray spaces are kept so existing
/// clients matching on the exact label keep working.
pub const ERROR_CONTENT_TYPE: &str = "text / html";

/// Failures that stop a request from being relayed.
///
/// An upstream answering with a 4xx/5xx status is not among them; that
/// response is relayed like any other.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The outbound request could not be built or its body not written.
    #[error("failed to build upstream request: {0}")]
    Translation(String),

    /// No HTTP response was obtained from upstream at all.
    #[error("upstream unreachable: {0}")]
    Forward(String),

    /// Anything that failed after upstream answered.
    #[error("failed to relay upstream response: {0}")]
    Relay(String),
}

impl ProxyError {
    pub fn translation(e: impl std::fmt::Display) -> Self {
        Self::Translation(e.to_string())
    }

    pub fn forward(e: impl std::fmt::Display) -> Self {
        Self::Forward(e.to_string())
    }

    pub fn relay(e: impl std::fmt::Display) -> Self {
        Self::Relay(e.to_string())
    }
}

/// Text used both as the error response body and its log line.
pub fn describe_failure(request: &Request, url: &str, error: &ProxyError) -> String {
    format!(
        "relay - Exception processing request from {} - {} {}: {}",
        request.remote(),
        request.method,
        url,
        error
    )
}

/// Overwrites `res` with a 500 whose body is `detail`.
///
/// Anything the relay already placed on the response is discarded; nothing
/// reaches the client before the pipeline finishes, so the reset is safe.
pub fn write_error_response(res: &mut Response, detail: &str) {
    *res = Response::new(StatusCode::INTERNAL_SERVER_ERROR);
    res.body = detail.as_bytes().to_vec();
    res.content_length = Some(res.body.len() as u64);
    res.content_type = Some(ERROR_CONTENT_TYPE.to_string());
}
