//! Per-request access line sink.

/// Receives one formatted line per finished request, successful or not.
///
/// Called from whichever task handled the request, so implementations must
/// tolerate concurrent calls. No ordering is promised between requests.
pub trait RequestLog: Send + Sync {
    fn log(&self, line: &str);
}

impl<F> RequestLog for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

/// Emits access lines as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLog;

impl RequestLog for TracingRequestLog {
    fn log(&self, line: &str) {
        tracing::info!(target: "relay::access", "{}", line);
    }
}
