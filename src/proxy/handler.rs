//! Request pipeline: translate, forward, relay, log.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::proxy::error::{self, ProxyError};
use crate::proxy::forward::Forwarder;
use crate::proxy::log::RequestLog;
use crate::proxy::mapping::ProxyMapping;
use crate::proxy::relay;
use crate::proxy::translate;

/// Where a request is in the pipeline.
///
/// ```text
/// Received → Translating → Forwarding → Forwarded → Relaying → Logged → Done
///                              └→ ForwardFailed ─┐
///   (any failure) ───────────────────────────────┴→ ErrorRelaying → Logged → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Translating,
    Forwarding,
    Forwarded,
    ForwardFailed,
    Relaying,
    ErrorRelaying,
    Logged,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a request ended.
#[derive(Debug)]
pub enum Outcome {
    /// Upstream's response was relayed with this status.
    Relayed(StatusCode),
    /// The request failed at `stage` and a 500 was produced instead.
    Failed { stage: Stage, error: ProxyError },
}

impl Outcome {
    pub fn is_relayed(&self) -> bool {
        matches!(self, Outcome::Relayed(_))
    }
}

/// Relays requests from the listen prefix to the target prefix.
///
/// Holds nothing mutable; one instance serves any number of concurrent
/// requests.
#[derive(Clone)]
pub struct ProxyHandler {
    mapping: ProxyMapping,
    forwarder: Forwarder,
    log: Option<Arc<dyn RequestLog>>,
}

impl fmt::Debug for ProxyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandler")
            .field("mapping", &self.mapping)
            .field("forwarder", &self.forwarder)
            .field("log", &self.log.is_some())
            .finish()
    }
}

impl ProxyHandler {
    /// Create a new proxy handler
    pub fn new(mapping: ProxyMapping, log: Option<Arc<dyn RequestLog>>) -> Self {
        Self {
            mapping,
            forwarder: Forwarder::new(),
            log,
        }
    }

    pub fn mapping(&self) -> &ProxyMapping {
        &self.mapping
    }

    /// Handles one request, leaving the answer in `res`.
    ///
    /// `res` always ends up holding either upstream's response or a 500
    /// describing the failure, and exactly one access line is logged.
    pub async fn handle(&self, request: &Request, res: &mut Response) -> Outcome {
        let url = request.absolute_url(host_of(self.mapping.listen_prefix()));
        let mut stage = Stage::Received;

        let outcome = match self.process(request, &url, res, &mut stage).await {
            Ok(()) => {
                self.emit(&format!(
                    "relay - request from {} - {} {} / response {} {}",
                    request.remote(),
                    request.method,
                    url,
                    res.status,
                    res.reason()
                ));
                Outcome::Relayed(res.status)
            }
            Err(error) => {
                tracing::warn!(
                    stage = %stage,
                    method = %request.method,
                    url = %url,
                    error = %error,
                    "Request failed"
                );
                let failed_at = stage;
                advance(&mut stage, Stage::ErrorRelaying);
                let detail = error::describe_failure(request, &url, &error);
                error::write_error_response(res, &detail);
                self.emit(&detail);
                Outcome::Failed {
                    stage: failed_at,
                    error,
                }
            }
        };

        advance(&mut stage, Stage::Logged);
        advance(&mut stage, Stage::Done);
        outcome
    }

    async fn process(
        &self,
        request: &Request,
        url: &str,
        res: &mut Response,
        stage: &mut Stage,
    ) -> Result<(), ProxyError> {
        advance(stage, Stage::Translating);
        let client_host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| ProxyError::translation(format!("invalid request URL {:?}", url)))?;
        let outgoing = translate::translate(request, url, &self.mapping)?;

        advance(stage, Stage::Forwarding);
        let upstream = match self.forwarder.send(&outgoing).await {
            Ok(upstream) => upstream,
            Err(e) => {
                advance(stage, Stage::ForwardFailed);
                return Err(e);
            }
        };
        advance(stage, Stage::Forwarded);

        tracing::debug!(
            status = upstream.status.as_u16(),
            method = %request.method,
            url = %outgoing.url,
            "Upstream answered"
        );

        advance(stage, Stage::Relaying);
        relay::relay_response(upstream, &client_host, res).await
    }

    fn emit(&self, line: &str) {
        if let Some(log) = &self.log {
            log.log(line);
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::trace!(from = %stage, to = %next, "Pipeline stage");
    *stage = next;
}

/// `host[:port]` part of an absolute URL prefix.
fn host_of(prefix: &str) -> &str {
    let rest = prefix.split_once("://").map(|(_, r)| r).unwrap_or(prefix);
    rest.split('/').next().unwrap_or(rest)
}
