//! The blocking ask-user request/response service.
//!
//! Layers a [`crate::registry::PendingRegistry`] on top of a
//! [`crate::broker::Broker`]: announcing a request publishes it as an event
//! for whatever UI is subscribed, and the calling task blocks on a one-shot
//! channel until that UI calls back through [`RequestService::respond`] or
//! [`RequestService::cancel`]. Grounded on the teacher's request/response
//! procedure handling in `handler.rs`, adapted from a request/reply RPC call
//! to a fire-and-await-external-answer shape.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use crate::broker::{Broker, SubscriptionId};
use crate::cancel::CancellationSignal;
use crate::config::BrokerConfig;
use crate::event::Event;
use crate::id::{IdGenerator, UuidV7Generator};
use crate::registry::PendingRegistry;

/// One selectable option within a [`Question`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QuestionOption {
    pub label: String,
}

/// One question posed to the user as part of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Question {
    pub question: String,
    pub header: String,
    pub options: Vec<QuestionOption>,
    /// Whether the user may pick more than one option.
    pub multi_select: bool,
}

/// A request announced to subscribers, awaiting answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestRecord {
    pub id: String,
    pub session_id: String,
    pub tool_call_id: String,
    pub questions: Vec<Question>,
}

/// One answer to one [`Question`], by index into the request's
/// `questions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Answer {
    pub question_index: usize,
    /// Populated for multi-select questions.
    #[serde(default)]
    pub selected_indices: Vec<usize>,
    /// Populated for single-select questions.
    #[serde(default)]
    pub selected_index: Option<usize>,
    #[serde(default)]
    pub other_text: Option<String>,
    #[serde(default)]
    pub is_other: bool,
}

/// The resolution of a [`RequestRecord`]: either a full set of answers or a
/// cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseRecord {
    pub request_id: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub cancelled: bool,
}

/// A blocking ask-user request/response service.
///
/// Cheaply cloneable: shares its broker, registry, and entry mutex with
/// every clone, so concurrent clones still serialize through the same
/// `request` critical section.
#[derive(Clone)]
pub struct RequestService {
    broker: Broker<RequestRecord>,
    registry: Arc<PendingRegistry<ResponseRecord>>,
    ids: Arc<dyn IdGenerator>,
    /// Serializes `request` entry per spec.md §4.4 step 1. Held for the
    /// *entire* call, not just publish+register, preserving the reference
    /// quirk flagged as an open question in spec.md §9: a second `request`
    /// cannot even publish its `Created` event while the first is still
    /// blocked. Recorded as implemented-as-specified in DESIGN.md.
    entry_lock: Arc<AsyncMutex<()>>,
    /// The most recently announced request still awaiting an answer.
    /// Advisory only: a caller must not rely on this still matching reality
    /// by the time it reads it. Guarded by a plain `std::sync::Mutex`
    /// because reads and writes are a quick pointer swap, never held across
    /// an await point.
    active_request: Arc<StdMutex<Option<RequestRecord>>>,
}

impl RequestService {
    pub fn new(broker_config: BrokerConfig) -> Self {
        Self {
            broker: Broker::new(broker_config),
            registry: Arc::new(PendingRegistry::new()),
            ids: Arc::new(UuidV7Generator),
            entry_lock: Arc::new(AsyncMutex::new(())),
            active_request: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn with_capabilities(broker_config: BrokerConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            broker: Broker::new(broker_config),
            registry: Arc::new(PendingRegistry::new()),
            ids,
            entry_lock: Arc::new(AsyncMutex::new(())),
            active_request: Arc::new(StdMutex::new(None)),
        }
    }

    /// Subscribe to announced requests. Passes straight through to the
    /// underlying broker: the returned channel closes when `cancel` fires.
    pub fn subscribe(
        &self,
        cancel: Arc<CancellationSignal>,
    ) -> (SubscriptionId, tokio::sync::mpsc::Receiver<Event<RequestRecord>>) {
        self.broker.subscribe(cancel)
    }

    /// Announce a request and block until it is answered or cancelled.
    ///
    /// Infallible and untimed, per spec.md §4.4/§5/§7: this call either
    /// resolves with a [`ResponseRecord`] or never returns. It takes no
    /// cancellation handle or timeout of its own — a caller that needs abort
    /// semantics arranges its own [`RequestService::cancel`] call from
    /// another task (a sleep-then-cancel task is exactly how an ask-user
    /// timeout is built on top of this primitive; see
    /// `crates/workbench-demo`).
    ///
    /// Serialized against every other in-flight `request` call on this
    /// service (or its clones) by `entry_lock`, held for the full duration
    /// of the call.
    pub async fn request(
        &self,
        session_id: String,
        tool_call_id: String,
        questions: Vec<Question>,
    ) -> ResponseRecord {
        let _entry_guard = self.entry_lock.lock().await;

        let id = self.ids.generate();
        let (tx, rx) = oneshot::channel();
        self.registry.put(id.clone(), tx);

        let record = RequestRecord {
            id: id.clone(),
            session_id,
            tool_call_id,
            questions,
        };
        *self.active_request.lock().unwrap() = Some(record.clone());

        self.broker.publish(Event::created(record)).await;

        // The registry only ever gives up this slot's sender to `respond` or
        // `cancel`, both of which always resolve it before dropping it: the
        // receiver failing here would mean that invariant broke.
        let mut response = rx
            .await
            .expect("pending slot resolved without a response: registry invariant violated");

        self.registry.take(&id);
        self.clear_active_request_if(&id);

        // Defensive: the registry is keyed by `id`, so any response that
        // reaches this call's channel must already carry it; overwrite
        // anyway per spec.md §4.4 step 6.
        response.request_id = id;
        response
    }

    /// Deliver answers for a pending request.
    ///
    /// Non-blocking and silent on an unknown id: the request may already
    /// have been cancelled or resolved.
    pub fn respond(&self, request_id: &str, answers: Vec<Answer>) {
        let Some(slot) = self.registry.take(request_id) else {
            return;
        };
        let response = ResponseRecord {
            request_id: request_id.to_string(),
            answers,
            cancelled: false,
        };
        let _ = slot.resolve(response);
        self.clear_active_request_if(request_id);
    }

    /// Cancel a pending request without answering it.
    ///
    /// Non-blocking and silent on an unknown id, for the same reason as
    /// [`RequestService::respond`].
    pub fn cancel(&self, request_id: &str) {
        let Some(slot) = self.registry.take(request_id) else {
            return;
        };
        let response = ResponseRecord {
            request_id: request_id.to_string(),
            answers: Vec::new(),
            cancelled: true,
        };
        let _ = slot.resolve(response);
        self.clear_active_request_if(request_id);
    }

    /// Snapshot of request ids currently awaiting an answer. Advisory only:
    /// a request in this list may resolve the instant after it's read.
    pub fn active_requests(&self) -> Vec<String> {
        self.registry.active_ids()
    }

    /// The most recently announced request still in flight, if its id still
    /// matches. Advisory only, per spec.md §9.
    pub fn active_request(&self) -> Option<RequestRecord> {
        self.active_request.lock().unwrap().clone()
    }

    fn clear_active_request_if(&self, request_id: &str) {
        let mut active = self.active_request.lock().unwrap();
        if active.as_ref().is_some_and(|r| r.id == request_id) {
            *active = None;
        }
    }
}
