//! A concurrent registry of in-flight requests awaiting a response.
//!
//! Grounded on the teacher's `subscription::manager::SubscriptionManager`
//! shape (a `DashMap` keyed by an opaque id, entries inserted by one task and
//! removed by another), repurposed here to key on request id rather than
//! subscription id and to hold a one-shot responder instead of a channel
//! sender.

use dashmap::DashMap;
use tokio::sync::oneshot;

/// One request's pending slot: the sender half of the one-shot channel its
/// caller is awaiting, plus whatever the registry was asked to remember about
/// the request for introspection.
pub struct PendingSlot<R> {
    responder: oneshot::Sender<R>,
}

impl<R> PendingSlot<R> {
    pub fn new(responder: oneshot::Sender<R>) -> Self {
        Self { responder }
    }
}

/// Concurrent map from request id to its pending slot.
///
/// A slot lives here from the moment a request is registered until exactly
/// one of: a response is delivered, the request is cancelled, or the
/// registry is dropped (which silently drops every outstanding responder,
/// causing the corresponding receivers to observe a closed channel).
pub struct PendingRegistry<R> {
    slots: DashMap<String, PendingSlot<R>>,
}

impl<R> Default for PendingRegistry<R> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<R> PendingRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending slot under `id`.
    ///
    /// Double registration under the same id is a programmer error: the
    /// host's [`crate::id::IdGenerator`] is contracted to hand out ids
    /// unique within the process, so a collision here means that contract
    /// was broken. Debug-asserts rather than silently overwriting, so the
    /// violation is observable in tests instead of masquerading as a lost
    /// response.
    pub fn put(&self, id: String, responder: oneshot::Sender<R>) {
        let previous = self.slots.insert(id, PendingSlot::new(responder));
        debug_assert!(
            previous.is_none(),
            "PendingRegistry::put called twice for the same request id"
        );
    }

    /// Remove and return the slot registered under `id`, if any. Used both
    /// to deliver a response and to cancel a request outright.
    pub fn take(&self, id: &str) -> Option<PendingSlot<R>> {
        self.slots.remove(id).map(|(_, slot)| slot)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of every currently pending request id. Advisory: the set can
    /// change the instant after this call returns.
    pub fn active_ids(&self) -> Vec<String> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<R> PendingSlot<R> {
    /// Deliver `value` to the request's caller. Returns `Err(value)` if the
    /// caller already dropped its receiving half.
    pub fn resolve(self, value: R) -> Result<(), R> {
        self.responder.send(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_take_resolves_the_waiting_receiver() {
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        let (tx, rx) = oneshot::channel();
        registry.put("req-1".into(), tx);

        assert!(registry.contains("req-1"));
        let slot = registry.take("req-1").unwrap();
        slot.resolve(42).unwrap();

        assert_eq!(rx.await.unwrap(), 42);
        assert!(!registry.contains("req-1"));
    }

    #[test]
    fn take_on_unknown_id_returns_none() {
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        assert!(registry.take("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "put called twice")]
    #[cfg(debug_assertions)]
    fn double_put_for_the_same_id_is_detected() {
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        registry.put("dup".into(), tx1);
        registry.put("dup".into(), tx2);
    }

    #[tokio::test]
    async fn delete_happens_before_a_later_put_for_the_same_id() {
        // A fresh Put after a Delete must not observe the old slot: this
        // registry only ever holds one slot per id at a time, so a second
        // Put for a previously-deleted id simply (re-)inserts cleanly.
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        let (tx1, rx1) = oneshot::channel();
        registry.put("req-3".into(), tx1);
        let slot = registry.take("req-3").unwrap();
        slot.resolve(1).unwrap();
        assert_eq!(rx1.await.unwrap(), 1);

        let (tx2, rx2) = oneshot::channel();
        registry.put("req-3".into(), tx2);
        let slot = registry.take("req-3").unwrap();
        slot.resolve(2).unwrap();
        assert_eq!(rx2.await.unwrap(), 2);
    }

    #[test]
    fn active_ids_reflects_current_contents() {
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        registry.put("a".into(), tx1);
        registry.put("b".into(), tx2);

        let mut ids = registry.active_ids();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn dropping_slot_without_resolving_closes_the_receiver() {
        let registry: PendingRegistry<u32> = PendingRegistry::new();
        let (tx, rx) = oneshot::channel();
        registry.put("req-2".into(), tx);
        let slot = registry.take("req-2").unwrap();
        drop(slot);

        assert!(rx.await.is_err());
    }
}
