//! AlertRelay - monitoring alert delivery relay
//!
//! This library polls a search index for pending monitoring alerts, formats
//! them into human-readable messages, and posts them to the chat endpoint.
//! Deliveries that fail are parked in a durable unsent queue in the same
//! index and retried on the next invocation.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod drainer;
pub mod formatting;
pub mod notification;
pub mod rate_limit;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

// Re-export core types for convenience
pub use crate::core::*;
