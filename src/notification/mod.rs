//! Delivery of formatted alerts to the chat endpoint.
//!
//! The sink is behind the [`crate::core::NotificationSink`] trait so tests
//! can substitute a recording fake; the real implementation lives in
//! [`slack`].

pub mod slack;

use thiserror::Error;

/// Why a delivery attempt failed.
///
/// Both variants mean the same thing to callers - the message was not
/// delivered and must be requeued (dispatcher) or surfaced as fatal
/// (drainer). The split exists for logging and diagnostics only.
#[derive(Debug, Error)]
pub enum SendError {
    /// The endpoint answered but signalled failure (`ok: false`).
    #[error("delivery rejected by the endpoint: {0}")]
    Rejected(String),
    /// The request never completed: network error, timeout, or a non-success
    /// HTTP status.
    #[error("transport error: {0}")]
    Transport(String),
}
