use std::fmt;

use crate::http::cookie::Cookie;
use crate::http::headers::HeaderMap;

/// HTTP status code.
///
/// Any three-digit code is representable so upstream statuses can be
/// relayed verbatim; the common ones have named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 201 Created
    pub const CREATED: StatusCode = StatusCode(201);
    /// 204 No Content
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    /// 304 Not Modified
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 404 Not Found
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Accepts codes in `100..=999`.
    ///
    /// # Example
    ///
    /// ```
    /// # use relay::http::response::StatusCode;
    /// assert_eq!(StatusCode::from_u16(404), Some(StatusCode::NOT_FOUND));
    /// assert_eq!(StatusCode::from_u16(42), None);
    /// ```
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=999).contains(&code).then_some(StatusCode(code))
    }

    /// Returns the numeric HTTP status code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Statuses that never carry a body (1xx, 204, 304).
    pub fn is_bodyless(&self) -> bool {
        (100..200).contains(&self.0) || self.0 == 204 || self.0 == 304
    }

    /// Returns the standard HTTP reason phrase for this status code, or an
    /// empty string for codes without one.
    ///
    /// # Example
    ///
    /// ```
    /// # use relay::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            410 => "Gone",
            413 => "Payload Too Large",
            415 => "Unsupported Media Type",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A response on its way to the client.
///
/// Framing-related values live in dedicated fields rather than in
/// `headers`: the writer renders `Content-Type`, `Content-Length`,
/// `Set-Cookie` and `Connection` from them.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Reason text; the status' standard phrase when `None`
    pub reason: Option<String>,
    /// Generic headers
    pub headers: HeaderMap,
    /// Media type, rendered as `Content-Type`
    pub content_type: Option<String>,
    /// Charset label forced onto `Content-Type`
    pub content_encoding: Option<String>,
    /// Explicit `Content-Length`; the body size when `None`
    pub content_length: Option<u64>,
    /// Cookies to set, one `Set-Cookie` each
    pub cookies: Vec<Cookie>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::OK)
///     .content_type("application/json")
///     .body(b"{}".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Appends a header. Duplicates are kept.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.append(key, value);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response.content_type = Some(content_type.into());
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.response.cookies.push(cookie);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.response.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Content-Length is pinned to the body size.
    pub fn build(mut self) -> Response {
        self.response.content_length = Some(self.response.body.len() as u64);
        self.response
    }
}

impl Response {
    /// An empty response with no headers, length taken from the body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: HeaderMap::new(),
            content_type: None,
            content_encoding: None,
            content_length: None,
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BAD_REQUEST)
            .content_type("text/plain")
            .body(b"400 Bad Request".to_vec())
            .build()
    }

    /// Reason text for the status line.
    pub fn reason(&self) -> &str {
        self.reason
            .as_deref()
            .unwrap_or_else(|| self.status.reason_phrase())
    }

    /// Value of `Content-Length` as it will be written.
    pub fn effective_content_length(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }

    /// `Content-Type` as it will be written, with the charset label applied.
    pub fn effective_content_type(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?;
        let Some(charset) = self.content_encoding.as_deref() else {
            return Some(content_type.to_string());
        };
        let label = format!("charset={}", charset);
        let mut params: Vec<&str> = content_type
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.to_ascii_lowercase().starts_with("charset="))
            .collect();
        if params.is_empty() {
            return Some(content_type.to_string());
        }
        params.push(&label);
        Some(params.join("; "))
    }
}
