//! Relay - Prefix-Rewriting Reverse Proxy
//!
//! Core library for relaying HTTP requests from a listen prefix to a
//! single upstream target prefix.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
