use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::proxy::ProxyHandler;

/// Largest request head plus body buffered before the client is refused.
const MAX_REQUEST_SIZE: usize = 64 * 1024 * 1024;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<ProxyHandler>,
    buffer: Vec<u8>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, handler: Arc<ProxyHandler>) -> Self {
        Self {
            stream,
            peer,
            handler,
            buffer: Vec::with_capacity(4096),
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match self.read_request().await {
                        Ok(Some(mut req)) => {
                            req.remote_addr = Some(self.peer);
                            self.state = ConnectionState::Processing(req);
                        }
                        Ok(None) => {
                            self.state = ConnectionState::Closed;
                        }
                        Err(e) => {
                            // Malformed request → answer 400 and hang up
                            tracing::warn!(peer = %self.peer, error = %e, "Rejecting request");
                            let writer = ResponseWriter::new(&Response::bad_request(), false, true);
                            self.state = ConnectionState::Writing(writer, false);
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let mut response = Response::new(StatusCode::OK);
                    let outcome = self.handler.handle(req, &mut response).await;
                    tracing::debug!(peer = %self.peer, relayed = outcome.is_relayed(), "Request handled");

                    let keep_alive = req.keep_alive();
                    let include_body = req.method != Method::HEAD;
                    let writer = ResponseWriter::new(&response, keep_alive, include_body);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    // Remove consumed bytes
                    self.buffer.drain(..consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    // Malformed request → protocol error
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            if self.buffer.len() > MAX_REQUEST_SIZE {
                return Err(anyhow::anyhow!("request exceeds {} bytes", MAX_REQUEST_SIZE));
            }

            // Read more data
            let mut temp = [0u8; 4096];
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }
}
