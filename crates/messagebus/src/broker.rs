//! The typed publish/subscribe broker.
//!
//! Grounded on the teacher's `subscription::{manager::SubscriptionManager,
//! publisher::ChannelPublisher}`, generalized from a single shared
//! `tokio::sync::broadcast` channel to one bounded `tokio::sync::mpsc`
//! channel per subscriber. A broadcast channel applies one uniform
//! lag-based drop policy to every receiver off a shared ring buffer; this
//! crate needs three distinct per-subscriber policies (`Drop`,
//! `BlockWithDeadline`, `EvictSlow`), which only a per-subscriber channel can
//! express. The map-of-handles shape, the housekeeping task per
//! subscription, and the shutdown discipline all come straight from the
//! teacher's manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cancel::CancellationSignal;
use crate::clock::{Clock, TokioClock};
use crate::config::{BackpressurePolicy, BrokerConfig};
use crate::event::Event;

/// Opaque handle identifying one subscription within a [`Broker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time counters for a [`Broker`].
///
/// Advisory: these are read with relaxed ordering and are meant for
/// observability, not for coordinating behavior between callers.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    dropped: AtomicU64,
    evicted: AtomicU64,
}

impl BrokerMetrics {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

struct Subscriber<T> {
    sender: mpsc::Sender<Event<T>>,
}

struct Inner<T> {
    subscribers: DashMap<SubscriptionId, Subscriber<T>>,
    config: BrokerConfig,
    metrics: BrokerMetrics,
    clock: Arc<dyn Clock>,
    shut_down: std::sync::atomic::AtomicBool,
}

/// A typed publish/subscribe broker.
///
/// Cheaply cloneable: internally an `Arc`, so every clone observes the same
/// subscriber set and metrics.
pub struct Broker<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Broker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Broker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    pub fn with_clock(config: BrokerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: DashMap::new(),
                config,
                metrics: BrokerMetrics::default(),
                clock,
                shut_down: std::sync::atomic::AtomicBool::new(false),
            }),
        }
    }

    pub fn metrics(&self) -> &BrokerMetrics {
        &self.inner.metrics
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Register a new subscriber whose channel closes, either because its
    /// `cancel` scope fires or because the broker evicts or shuts it down.
    ///
    /// Returns the subscription's id and the receiving half of its channel.
    /// A background task tied to `cancel` removes the entry on cancellation;
    /// it is safe to drop the returned receiver without cancelling first,
    /// in which case the entry is reaped lazily on next publish.
    ///
    /// Calling this after [`Broker::shutdown`] is lifecycle misuse handled
    /// silently per spec.md §7: the id is still allocated, but the returned
    /// channel is already closed and nothing is ever registered.
    pub fn subscribe(
        &self,
        cancel: Arc<CancellationSignal>,
    ) -> (SubscriptionId, mpsc::Receiver<Event<T>>) {
        let id = SubscriptionId::new();

        if self.is_shut_down() {
            let (_tx, rx) = mpsc::channel(self.inner.config.capacity().as_usize());
            return (id, rx);
        }

        let (tx, rx) = mpsc::channel(self.inner.config.capacity().as_usize());
        self.inner
            .subscribers
            .insert(id, Subscriber { sender: tx });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            cancel.cancelled().await;
            inner.subscribers.remove(&id);
            tracing::debug!(subscription = %id, "subscription cancelled, removed from broker");
        });

        tracing::debug!(subscription = %id, "new subscription registered");
        (id, rx)
    }

    /// Deliver `event` to every current subscriber according to the
    /// broker's configured [`BackpressurePolicy`].
    ///
    /// Surfaces nothing to the caller: a shut-down broker silently drops the
    /// publication (lifecycle misuse), and per-subscriber overflow is only
    /// observable through [`BrokerMetrics::dropped_count`] /
    /// [`BrokerMetrics::evicted_count`]. The broker is a substrate; upstream
    /// code cannot usefully react to a per-publication drop synchronously.
    pub async fn publish(&self, event: Event<T>) {
        if self.is_shut_down() {
            return;
        }

        let ids: Vec<SubscriptionId> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| *entry.key())
            .collect();

        match self.inner.config.policy() {
            BackpressurePolicy::Drop => {
                for id in ids {
                    self.publish_drop(id, &event);
                }
            }
            BackpressurePolicy::BlockWithDeadline { timeout } => {
                // One deadline shared across the whole publication, not one
                // per subscriber: a slow first subscriber must not let a
                // publish block for `timeout * subscriber_count`.
                let deadline = self.inner.clock.now() + timeout;
                for id in ids {
                    let remaining = deadline.saturating_duration_since(self.inner.clock.now());
                    self.publish_block(id, &event, remaining).await;
                }
            }
            BackpressurePolicy::EvictSlow => {
                // Mark every subscriber whose non-blocking send fails during
                // this single scan, then evict exactly that set once the scan
                // is done. Evicting inline, one id at a time, would let a
                // sibling subscriber that also happened to be full in this
                // same round dodge eviction depending on iteration order.
                let marked = self.mark_full_subscribers(&ids, &event);
                for id in marked {
                    if self.inner.subscribers.remove(&id).is_some() {
                        self.inner.metrics.evicted.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(subscription = %id, "evicted slow subscriber");
                    }
                }
            }
        }
    }

    fn publish_drop(&self, id: SubscriptionId, event: &Event<T>) {
        let Some(sub) = self.inner.subscribers.get(&id) else {
            return;
        };
        match sub.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.inner.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(subscription = %id, "channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                drop(sub);
                self.inner.subscribers.remove(&id);
            }
        }
    }

    /// Send to one subscriber under `BlockWithDeadline`, waiting at most
    /// `remaining` (the time left on the publication's shared deadline).
    async fn publish_block(&self, id: SubscriptionId, event: &Event<T>, remaining: std::time::Duration) {
        let sender = {
            let Some(sub) = self.inner.subscribers.get(&id) else {
                return;
            };
            sub.sender.clone()
        };

        if sender.try_send(event.clone()).is_ok() {
            return;
        }

        if remaining.is_zero() {
            self.inner.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(subscription = %id, "publish deadline already elapsed, dropping event");
            return;
        }

        let send_fut = sender.send(event.clone());
        match self.inner.clock.timeout(remaining, send_fut).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                // Receiver dropped: nothing to block on, not a stall.
                self.inner.subscribers.remove(&id);
            }
            Err(_) => {
                self.inner.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(subscription = %id, ?remaining, "publish deadline elapsed, dropping event");
            }
        }
    }

    /// Attempt a non-blocking send to every subscriber in `ids`, per
    /// spec.md §4.1's EvictSlow algorithm: "for each subscriber, attempt a
    /// non-blocking send; on failure, mark the subscriber for eviction."
    ///
    /// Returns the ids whose send failed because their channel was full.
    /// Subscribers whose channel turned out to already be closed are removed
    /// here directly (never marked for eviction — they're gone, not slow).
    /// Removal of the marked-full set is deferred to the caller, who removes
    /// and closes each one only after this full scan completes, so that
    /// every subscriber full in this round is evicted regardless of where in
    /// the snapshot it falls.
    fn mark_full_subscribers(&self, ids: &[SubscriptionId], event: &Event<T>) -> Vec<SubscriptionId> {
        let mut marked = Vec::new();
        for &id in ids {
            let Some(sub) = self.inner.subscribers.get(&id) else {
                continue;
            };
            match sub.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => marked.push(id),
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    drop(sub);
                    self.inner.subscribers.remove(&id);
                }
            }
        }
        marked
    }

    /// Stop accepting publishes and close every subscriber's channel.
    /// Irreversible: a shut-down broker cannot be reused.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.subscribers.clear();
        tracing::info!("broker shut down");
    }
}
