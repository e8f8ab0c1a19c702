//! Builds the upstream request from the client's request.

use url::Url;

use crate::http::cookie::{self, Cookie};
use crate::http::request::{Method, Request};
use crate::proxy::error::ProxyError;
use crate::proxy::mapping::ProxyMapping;

/// Everything needed to send one request upstream.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    /// Always requested.
    pub keep_alive: bool,
    /// Always off: some origins stall waiting for a `100 Continue` they
    /// never send.
    pub expect_continue: bool,
    /// Client cookies, re-homed to the upstream host.
    pub cookies: Vec<Cookie>,
    /// `None` when the client declared no body.
    pub body: Option<Vec<u8>>,
}

impl OutgoingRequest {
    /// Host the outbound cookies are bound to.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `Host` header value, with the port when it is not the default.
    pub fn host_header(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }

    /// Origin-form request target: path plus query.
    pub fn target(&self) -> String {
        let mut target = self.url.path().to_string();
        if target.is_empty() {
            target.push('/');
        }
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    /// Serializes the request line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();

        buffer.extend_from_slice(
            format!("{} {} HTTP/1.1\r\n", self.method, self.target()).as_bytes(),
        );
        buffer.extend_from_slice(format!("Host: {}\r\n", self.host_header()).as_bytes());
        if let Some(user_agent) = &self.user_agent {
            buffer.extend_from_slice(format!("User-Agent: {}\r\n", user_agent).as_bytes());
        }
        if let Some(content_type) = &self.content_type {
            buffer.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        let connection = if self.keep_alive { "keep-alive" } else { "close" };
        buffer.extend_from_slice(format!("Connection: {}\r\n", connection).as_bytes());
        if self.expect_continue {
            buffer.extend_from_slice(b"Expect: 100-continue\r\n");
        }
        if !self.cookies.is_empty() {
            buffer.extend_from_slice(
                format!("Cookie: {}\r\n", cookie::cookie_header(&self.cookies)).as_bytes(),
            );
        }
        match &self.body {
            Some(body) => buffer
                .extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes()),
            None if self.method.expects_body() => {
                buffer.extend_from_slice(b"Content-Length: 0\r\n")
            }
            None => {}
        }

        // End of headers
        buffer.extend_from_slice(b"\r\n");

        if let Some(body) = &self.body {
            buffer.extend_from_slice(body);
        }

        buffer
    }
}

/// Derives the upstream request for `request`.
///
/// `inbound_url` is the absolute URL the client addressed. The body is
/// decoded as UTF-8 (invalid sequences replaced) and re-encoded.
pub fn translate(
    request: &Request,
    inbound_url: &str,
    mapping: &ProxyMapping,
) -> Result<OutgoingRequest, ProxyError> {
    let redirected = mapping.rewrite(inbound_url);
    let url = Url::parse(&redirected)
        .map_err(|e| ProxyError::translation(format!("invalid upstream URL {:?}: {}", redirected, e)))?;

    if url.scheme() != "http" {
        return Err(ProxyError::translation(format!(
            "unsupported upstream scheme {:?}",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ProxyError::translation(format!("upstream URL {:?} has no host", redirected)))?
        .to_string();

    let cookies = request
        .cookies()
        .iter()
        .map(|c| c.rehomed(&host))
        .collect();

    let body = request
        .has_body()
        .then(|| String::from_utf8_lossy(&request.body).into_owned().into_bytes());

    tracing::trace!(
        method = %request.method,
        from = %inbound_url,
        to = %url,
        "Translated request"
    );

    Ok(OutgoingRequest {
        method: request.method.clone(),
        url,
        user_agent: request.user_agent().map(str::to_string),
        content_type: request.content_type().map(str::to_string),
        keep_alive: true,
        expect_continue: false,
        cookies,
        body,
    })
}
