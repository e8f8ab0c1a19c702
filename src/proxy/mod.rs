//! Reverse proxy functionality
//!
//! This module implements the relay core: rewriting the request URL from
//! the listen prefix to the target prefix, forwarding the request, and
//! copying the upstream response back to the client.
//!
//! # Pipeline
//!
//! ```text
//! Request ─► translate ─► forward ─┬─► relay ─────────┬─► log
//!                                  └─► error (500) ───┘
//! ```

pub mod error;
pub mod forward;
pub mod handler;
pub mod log;
pub mod mapping;
pub mod policy;
pub mod relay;
pub mod translate;

pub use error::ProxyError;
pub use forward::{Forwarder, UpstreamResponse};
pub use handler::{Outcome, ProxyHandler, Stage};
pub use log::{RequestLog, TracingRequestLog};
pub use mapping::{MappingError, ProxyMapping};
pub use translate::OutgoingRequest;
