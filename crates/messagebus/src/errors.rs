//! Error types for broker configuration.
//!
//! Mirrors the teacher's `subscription::errors` module: a small `thiserror`
//! enum per failure surface rather than one catch-all error type, so callers
//! can match on the specific variant instead of string-sniffing a message.
//!
//! Per spec.md §7, the broker itself surfaces nothing at runtime: invalid
//! construction parameters are the only reportable error kind.
//! [`crate::broker::Broker::publish`] never returns a `Result` — a shut-down
//! broker silently no-ops (lifecycle misuse) and per-subscriber overflow is
//! only observable through [`crate::broker::BrokerMetrics`]'s counters. The
//! ask-user request service is likewise infallible: `request` either
//! resolves with a [`crate::ask::ResponseRecord`] or never returns, per
//! spec.md §4.4/§5 — a caller arranges its own abort via `cancel`, not a
//! `Result` this crate hands back.

use thiserror::Error;

/// A [`crate::config::BrokerConfig`] was built with an invalid combination of
/// settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("subscriber buffer capacity must be at least 1, got {0}")]
    ZeroCapacity(usize),

    #[error("publish_timeout must be positive when using BlockWithDeadline, got {0:?}")]
    NonPositiveTimeout(std::time::Duration),
}

/// Failure surfaced by [`crate::broker::Broker`] and
/// [`crate::config::BrokerConfig`] construction.
///
/// The only reportable kind is [`BrokerError::Configuration`]: spec.md §7
/// closes the list of errors the core ever surfaces to invalid construction
/// parameters, never runtime publish/subscribe misuse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
