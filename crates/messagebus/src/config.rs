//! Broker configuration: buffer capacity and backpressure policy.
//!
//! Grounded on the teacher's `subscription::config::{SubscriptionConfig,
//! Capacity}`: a small builder over a couple of knobs, with named capacity
//! presets rather than requiring every caller to pick a raw buffer size.

use std::time::Duration;

use crate::errors::{BrokerError, ConfigurationError};

/// Preset subscriber channel capacities, matching the teacher's tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Small,
    Medium,
    Large,
    Custom(usize),
}

impl Capacity {
    pub fn as_usize(self) -> usize {
        match self {
            Capacity::Small => 32,
            Capacity::Medium => 256,
            Capacity::Large => 1024,
            Capacity::Custom(n) => n,
        }
    }
}

/// What the broker does when a subscriber's bounded channel is full at
/// publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Drop the event for that subscriber and increment its dropped-event
    /// counter. Never blocks the publisher.
    Drop,
    /// Block the publisher up to `timeout`, shared across the whole
    /// publication, then drop the event for any subscriber still not ready
    /// once the deadline elapses. Never surfaced to the caller; observe via
    /// [`crate::broker::BrokerMetrics::dropped_count`].
    BlockWithDeadline { timeout: Duration },
    /// Evict the slowest subscriber (the one with the fullest channel) to
    /// make room, incrementing its evicted-subscriber counter and closing
    /// its channel.
    EvictSlow,
}

/// Validated configuration for a [`crate::broker::Broker`].
///
/// Fields are private: the only way to produce one is
/// [`BrokerConfig::builder`], whose [`BrokerConfigBuilder::build`] validates
/// before returning. This means a [`BrokerConfig`] reaching
/// [`crate::broker::Broker::new`] is always already valid — per spec.md §7,
/// `ConfigurationError` is surfaced at construction only, never at runtime,
/// and the type system enforces that rather than relying on callers to
/// re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    capacity: Capacity,
    policy: BackpressurePolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            // spec.md §4.1: "Default construction chooses Drop with a
            // buffer of ~64."
            capacity: Capacity::Custom(64),
            policy: BackpressurePolicy::Drop,
        }
    }
}

impl BrokerConfig {
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    fn validate(&self) -> Result<(), BrokerError> {
        let cap = self.capacity.as_usize();
        if cap == 0 {
            return Err(ConfigurationError::ZeroCapacity(cap).into());
        }
        if let BackpressurePolicy::BlockWithDeadline { timeout } = self.policy {
            if timeout.is_zero() {
                return Err(ConfigurationError::NonPositiveTimeout(timeout).into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerConfigBuilder {
    capacity: Option<Capacity>,
    policy: Option<BackpressurePolicy>,
}

impl BrokerConfigBuilder {
    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn policy(mut self, policy: BackpressurePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<BrokerConfig, BrokerError> {
        let config = BrokerConfig {
            capacity: self.capacity.unwrap_or(Capacity::Custom(64)),
            policy: self.policy.unwrap_or(BackpressurePolicy::Drop),
        };
        config.validate()?;
        Ok(config)
    }
}
