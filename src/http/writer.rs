use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes the status line and head of `resp`, followed by the body
/// unless `include_body` is false (HEAD requests).
pub fn serialize_response(resp: &Response, keep_alive: bool, include_body: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.reason()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Generic headers
    buf.extend_from_slice(resp.headers.to_string().as_bytes());

    // Fields the response owns
    if let Some(content_type) = resp.effective_content_type() {
        buf.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    buf.extend_from_slice(
        format!("Content-Length: {}\r\n", resp.effective_content_length()).as_bytes(),
    );
    for cookie in &resp.cookies {
        buf.extend_from_slice(format!("Set-Cookie: {}\r\n", cookie).as_bytes());
    }
    let connection = if keep_alive { "keep-alive" } else { "close" };
    buf.extend_from_slice(format!("Connection: {}\r\n", connection).as_bytes());

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    if include_body {
        buf.extend_from_slice(&resp.body);
    }

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response, keep_alive: bool, include_body: bool) -> Self {
        Self {
            buffer: serialize_response(response, keep_alive, include_body),
            written: 0,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
