//! Upstream connection and request forwarding
//!
//! This module connects to the upstream server, sends the translated
//! request and reads back the response head. The body is left on the wire
//! behind an [`UpstreamBody`] reader so the relay can drain it.

use crate::http::cookie::Cookie;
use crate::http::headers::HeaderMap;
use crate::http::parser::{self, ParseError};
use crate::http::request::Method;
use crate::http::response::StatusCode;
use crate::proxy::error::ProxyError;
use crate::proxy::translate::OutgoingRequest;
use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default buffer size for reading the response head
const BUFFER_SIZE: usize = 8192;

/// Largest response head accepted from upstream
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Transport default covering connect through the response head.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Response obtained from upstream, body still unread.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// Cookies from every `Set-Cookie` header. Malformed ones are logged
    /// and skipped.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all("Set-Cookie")
            .filter_map(|raw| match Cookie::parse_set_cookie(raw) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed upstream cookie");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Size,
    Data(u64),
    DataEnd,
    Trailers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Length(u64),
    Chunked(ChunkState),
    UntilClose,
    Done,
}

/// Reader over an upstream response body.
///
/// Decodes the framing upstream chose (Content-Length, chunked, or
/// close-delimited) and reports end of body with `Ok(0)`. The connection is
/// closed when the reader is dropped.
#[derive(Debug)]
pub struct UpstreamBody {
    stream: TcpStream,
    buffer: BytesMut,
    framing: Framing,
}

impl UpstreamBody {
    fn new(stream: TcpStream, buffer: BytesMut, framing: Framing) -> Self {
        Self {
            stream,
            buffer,
            framing,
        }
    }

    /// Reads the next piece of body into `out`. Returns 0 once the body is
    /// exhausted.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            match self.framing {
                Framing::Done => return Ok(0),
                Framing::Length(0) => self.framing = Framing::Done,
                Framing::Length(remaining) => {
                    let limit = out.len().min(clamp(remaining));
                    let n = self.read_raw(&mut out[..limit]).await?;
                    if n == 0 {
                        anyhow::bail!("Connection closed before complete body received");
                    }
                    self.framing = Framing::Length(remaining - n as u64);
                    return Ok(n);
                }
                Framing::UntilClose => {
                    let n = self.read_raw(out).await?;
                    if n == 0 {
                        self.framing = Framing::Done;
                    }
                    return Ok(n);
                }
                Framing::Chunked(ChunkState::Size) => {
                    let line = self.read_line().await?;
                    let size = parser::parse_chunk_size(&line)
                        .map_err(|e| anyhow::anyhow!("Invalid chunk size line: {:?}", e))?;
                    self.framing = if size == 0 {
                        Framing::Chunked(ChunkState::Trailers)
                    } else {
                        Framing::Chunked(ChunkState::Data(size as u64))
                    };
                }
                Framing::Chunked(ChunkState::Data(remaining)) => {
                    let limit = out.len().min(clamp(remaining));
                    let n = self.read_raw(&mut out[..limit]).await?;
                    if n == 0 {
                        anyhow::bail!("Connection closed inside a chunk");
                    }
                    let left = remaining - n as u64;
                    self.framing = if left == 0 {
                        Framing::Chunked(ChunkState::DataEnd)
                    } else {
                        Framing::Chunked(ChunkState::Data(left))
                    };
                    return Ok(n);
                }
                Framing::Chunked(ChunkState::DataEnd) => {
                    let line = self.read_line().await?;
                    if !line.is_empty() {
                        anyhow::bail!("Chunk data not followed by CRLF");
                    }
                    self.framing = Framing::Chunked(ChunkState::Size);
                }
                Framing::Chunked(ChunkState::Trailers) => {
                    // Trailer fields are dropped; an empty line ends the body
                    let line = self.read_line().await?;
                    if line.is_empty() {
                        self.framing = Framing::Done;
                    }
                }
            }
        }
    }

    /// Reads buffered bytes first, then the socket.
    async fn read_raw(&mut self, out: &mut [u8]) -> Result<usize> {
        if !self.buffer.is_empty() {
            let n = self.buffer.len().min(out.len());
            out[..n].copy_from_slice(&self.buffer[..n]);
            self.buffer.advance(n);
            return Ok(n);
        }
        Ok(self.stream.read(out).await?)
    }

    /// Reads one CRLF-terminated line, returned without the terminator.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(end) = parser::find_crlf(&self.buffer) {
                let line = self.buffer.split_to(end).to_vec();
                self.buffer.advance(2);
                return Ok(line);
            }
            if self.buffer.len() > MAX_HEAD_SIZE {
                anyhow::bail!("Chunk framing line too long");
            }
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                anyhow::bail!("Connection closed inside chunked body");
            }
        }
    }
}

fn clamp(remaining: u64) -> usize {
    usize::try_from(remaining).unwrap_or(usize::MAX)
}

/// Sends requests upstream, one connection per request.
#[derive(Debug, Clone)]
pub struct Forwarder {
    /// Connect plus response-head deadline
    timeout: Duration,
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forwarder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Forward a request and wait for the upstream response head.
    ///
    /// Any status upstream answers with, 4xx and 5xx included, is a
    /// successful forward. Only failing to get a response at all is an
    /// error.
    pub async fn send(&self, request: &OutgoingRequest) -> Result<UpstreamResponse, ProxyError> {
        let addr = format!(
            "{}:{}",
            request.host(),
            request.url.port_or_known_default().unwrap_or(80)
        );

        tracing::debug!(
            upstream = %addr,
            method = %request.method,
            url = %request.url,
            "Forwarding request upstream"
        );

        match timeout(self.timeout, self.exchange(&addr, request)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::forward(format!(
                "no response from {} within {:?}",
                addr, self.timeout
            ))),
        }
    }

    async fn exchange(
        &self,
        addr: &str,
        request: &OutgoingRequest,
    ) -> Result<UpstreamResponse, ProxyError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))
            .map_err(|e| ProxyError::forward(format!("{:#}", e)))?;

        tracing::trace!(upstream = %addr, "Connected to upstream");

        // A failed write means the request body never made it out
        stream
            .write_all(&request.to_bytes())
            .await
            .context("Failed to write request to upstream")
            .map_err(|e| ProxyError::translation(format!("{:#}", e)))?;
        stream
            .flush()
            .await
            .map_err(ProxyError::translation)?;

        tracing::trace!("Request sent to upstream");

        self.read_response(stream, &request.method)
            .await
            .map_err(|e| ProxyError::forward(format!("{:#}", e)))
    }

    /// Read the response head; the body stays on the stream.
    async fn read_response(&self, mut stream: TcpStream, method: &Method) -> Result<UpstreamResponse> {
        let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

        loop {
            match parser::parse_response_head(&buffer) {
                Ok((head, consumed)) => {
                    buffer.advance(consumed);

                    // Interim responses carry no final answer
                    if head.status.as_u16() / 100 == 1 && head.status.as_u16() != 101 {
                        continue;
                    }

                    let framing = body_framing(method, head.status, &head.headers)?;
                    return Ok(UpstreamResponse {
                        status: head.status,
                        reason: head.reason,
                        headers: head.headers,
                        body: UpstreamBody::new(stream, buffer, framing),
                    });
                }
                Err(ParseError::Incomplete) => {}
                Err(e) => anyhow::bail!("Invalid response from upstream: {:?}", e),
            }

            // Prevent unbounded header growth
            if buffer.len() > MAX_HEAD_SIZE {
                anyhow::bail!("Response headers too large");
            }

            let n = stream.read_buf(&mut buffer).await?;
            if n == 0 {
                anyhow::bail!("Connection closed before complete response received");
            }
        }
    }
}

/// Picks how the body is delimited, per RFC 7230 section 3.3.3.
fn body_framing(method: &Method, status: StatusCode, headers: &HeaderMap) -> Result<Framing> {
    if *method == Method::HEAD || status.is_bodyless() {
        return Ok(Framing::Done);
    }
    let chunked = headers
        .get("Transfer-Encoding")
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    if chunked {
        return Ok(Framing::Chunked(ChunkState::Size));
    }
    match headers.get("Content-Length") {
        Some(cl) => {
            let len = cl
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid Content-Length {:?}", cl))?;
            Ok(Framing::Length(len))
        }
        None => Ok(Framing::UntilClose),
    }
}
