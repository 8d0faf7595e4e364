//! Scenario S7 from spec.md §8: Shutdown closes every subscriber and
//! rejects further use.

use messagebus::{BackpressurePolicy, Broker, BrokerConfig, CancellationSignal, Capacity, Event};

#[tokio::test]
async fn s7_shutdown_closes_all_subscribers_and_rejects_reuse() {
    let broker: Broker<u32> = Broker::new(
        BrokerConfig::builder()
            .capacity(Capacity::Small)
            .policy(BackpressurePolicy::Drop)
            .build()
            .unwrap(),
    );

    let (_id_a, mut rx_a) = broker.subscribe(CancellationSignal::new_shared());
    let (_id_b, mut rx_b) = broker.subscribe(CancellationSignal::new_shared());
    assert_eq!(broker.subscriber_count(), 2);

    broker.shutdown();

    assert!(rx_a.recv().await.is_none(), "subscriber a must observe closure");
    assert!(rx_b.recv().await.is_none(), "subscriber b must observe closure");
    assert_eq!(broker.subscriber_count(), 0);

    let (_id_c, mut rx_c) = broker.subscribe(CancellationSignal::new_shared());
    assert!(
        rx_c.recv().await.is_none(),
        "subscribe after shutdown must return an already-closed channel"
    );
    assert_eq!(broker.subscriber_count(), 0);

    // Publish after shutdown is a silent no-op, not an error.
    broker.publish(Event::created(1)).await;
}
