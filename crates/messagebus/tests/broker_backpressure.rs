//! Scenarios S4–S6 from spec.md §8: the three backpressure policies under
//! an overwhelmed subscriber.

use std::time::Duration;

use messagebus::{BackpressurePolicy, Broker, BrokerConfig, CancellationSignal, Capacity, Event};

/// S4. Drop policy: buffer=1, one subscriber that never reads. Publishing
/// three events leaves exactly the first buffered and counts two drops.
#[tokio::test]
async fn s4_drop_policy_backpressure() {
    let broker: Broker<u32> = Broker::new(
        BrokerConfig::builder()
            .capacity(Capacity::Custom(1))
            .policy(BackpressurePolicy::Drop)
            .build()
            .unwrap(),
    );
    let (_id, mut rx) = broker.subscribe(CancellationSignal::new_shared());

    broker.publish(Event::created(1)).await;
    broker.publish(Event::created(2)).await;
    broker.publish(Event::created(3)).await;

    assert_eq!(rx.recv().await.unwrap().payload, 1);
    assert_eq!(broker.metrics().dropped_count(), 2);
}

/// S5. BlockWithDeadline: buffer=2, timeout=10ms, a subscriber that takes
/// 50ms per event. Publishing 10 events as fast as possible throttles the
/// publisher to at least 8 deadlines' worth of wall time, and the
/// subscriber never sees events out of order.
#[tokio::test]
async fn s5_block_policy_throttle() {
    let broker: Broker<u32> = Broker::new(
        BrokerConfig::builder()
            .capacity(Capacity::Custom(2))
            .policy(BackpressurePolicy::BlockWithDeadline {
                timeout: Duration::from_millis(10),
            })
            .build()
            .unwrap(),
    );
    let (_id, mut rx) = broker.subscribe(CancellationSignal::new_shared());

    let consumer = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event.payload);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        received
    });

    let start = std::time::Instant::now();
    for i in 0..10u32 {
        broker.publish(Event::created(i)).await;
    }
    let publish_wall_time = start.elapsed();

    broker.shutdown();
    let received = consumer.await.unwrap();

    assert!(
        publish_wall_time >= Duration::from_millis(8 * 10),
        "publisher should be throttled by the slow subscriber, took {publish_wall_time:?}"
    );
    // Whatever got through arrived in the order it was published.
    let mut prev = None;
    for payload in received {
        if let Some(p) = prev {
            assert!(payload > p, "events must not arrive out of order");
        }
        prev = Some(payload);
    }
}

/// S6. EvictSlow: buffer=2, one slow subscriber, publishing far faster than
/// it drains. Within O(buffer) publishes it is evicted exactly once and its
/// channel is observed closed.
#[tokio::test]
async fn s6_evict_policy_removes_laggard() {
    let broker: Broker<u32> = Broker::new(
        BrokerConfig::builder()
            .capacity(Capacity::Custom(2))
            .policy(BackpressurePolicy::EvictSlow)
            .build()
            .unwrap(),
    );
    let (_id, mut rx) = broker.subscribe(CancellationSignal::new_shared());

    for i in 0..5u32 {
        broker.publish(Event::created(i)).await;
    }

    assert_eq!(broker.metrics().evicted_count(), 1);
    assert_eq!(broker.subscriber_count(), 0);

    // Drain whatever was buffered before eviction, then observe closure.
    while rx.recv().await.is_some() {}
}
