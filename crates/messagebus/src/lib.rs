//! Typed publish/subscribe broker with configurable backpressure, plus a
//! blocking ask-user request/response service layered on top of it.
//!
//! The [`broker`] module is the reusable primitive: [`broker::Broker`]
//! delivers typed events to subscribers whose lifetimes are tied to an
//! external [`cancel::CancellationSignal`], under one of three
//! [`config::BackpressurePolicy`] choices. The [`ask`] module builds a
//! concrete workflow on top of it: announcing a question set as an event and
//! blocking the caller on a [`registry::PendingRegistry`] slot until a UI
//! answers or cancels it.

pub mod ask;
pub mod broker;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod errors;
pub mod event;
pub mod id;
pub mod registry;

pub use ask::{Answer, Question, QuestionOption, RequestRecord, RequestService, ResponseRecord};
pub use broker::{Broker, BrokerMetrics, SubscriptionId};
pub use cancel::CancellationSignal;
pub use clock::{Clock, Elapsed, TokioClock};
pub use config::{BackpressurePolicy, BrokerConfig, Capacity};
pub use errors::{BrokerError, ConfigurationError};
pub use event::{Event, EventKind};
pub use id::{IdGenerator, UuidV7Generator};
pub use registry::{PendingRegistry, PendingSlot};
