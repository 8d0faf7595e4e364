//! Opaque request-id allocation.
//!
//! spec.md names identifier generation a host capability: "produces opaque,
//! globally-unique-within-process strings. Any collision is a contract
//! violation and should be detectable by tests." [`IdGenerator`] is the
//! narrow trait the ask-service consumes so a host can plug in its own
//! allocator; [`UuidV7Generator`] is the default, grounded on the teacher's
//! `SubscriptionId::new()` use of `Uuid::now_v7()` for time-ordered,
//! sortable-by-creation ids.

use uuid::Uuid;

/// Produces opaque, globally-unique-within-process identifier strings.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default [`IdGenerator`] backed by UUID v7.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
