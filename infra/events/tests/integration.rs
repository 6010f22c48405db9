pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use ln_event_bus::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_event_flow() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe::<TestEvent>().unwrap();

        let event = TestEvent(42);
        assert_eq!(bus.publish(event.clone()).unwrap(), 1);

        let received = rx.recv_event().await.unwrap();
        assert_eq!(*received, event);
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(TestEvent(1)).unwrap(), 0);
        assert_eq!(bus.subscriber_count::<TestEvent>(), 0);
    }

    #[test]
    fn test_listeners_run_inline_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let first = order.clone();
        bus.listen::<TestEvent, _>(move |e| first.lock().push(("first", e.0))).unwrap();
        let second = order.clone();
        bus.listen::<TestEvent, _>(move |e| second.lock().push(("second", e.0))).unwrap();

        assert_eq!(bus.publish(TestEvent(7)).unwrap(), 2);
        assert_eq!(*order.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unlisten_stops_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = bus
            .listen::<TestEvent, _>(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        bus.publish(TestEvent(1)).unwrap();
        assert!(bus.unlisten(id));
        assert!(!bus.unlisten(id), "second removal is a no-op");
        bus.publish(TestEvent(2)).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_publish_reentrantly() {
        #[derive(Debug)]
        struct Echo(usize);

        let bus = EventBus::new();
        let echoes = Arc::new(AtomicUsize::new(0));

        let relay = bus.clone();
        bus.listen::<TestEvent, _>(move |e| {
            relay.publish(Echo(e.0)).unwrap();
        })
        .unwrap();
        let counter = echoes.clone();
        bus.listen::<Echo, _>(move |e| {
            counter.fetch_add(e.0, Ordering::SeqCst);
        })
        .unwrap();

        bus.publish(TestEvent(5)).unwrap();
        assert_eq!(echoes.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_receiver_lagged_recovery() {
        let bus = EventBus::new();
        let capacity = CHANNEL_CAPACITY;
        let mut rx = bus.subscribe::<TestEvent>().unwrap();

        let total_messages = capacity * 3;
        for i in 0..total_messages {
            bus.publish(TestEvent(i)).unwrap();
        }

        let first_received = rx.recv_event().await.expect("should recover from lag");
        assert!(
            first_received.0 >= (total_messages - capacity),
            "Should have skipped to the fresh tail of the buffer. Expected >= {}, got {}",
            total_messages - capacity,
            first_received.0
        );

        let second_received = rx.recv_event().await.expect("Should continue receiving");
        assert_eq!(second_received.0, first_received.0 + 1);
    }

    #[tokio::test]
    async fn test_multiple_event_types_are_isolated() {
        #[derive(Clone, Debug, PartialEq, Eq)]
        struct OtherEvent(pub usize);

        let bus = EventBus::new();
        let mut rx_test = bus.subscribe::<TestEvent>().unwrap();
        let mut rx_other = bus.subscribe::<OtherEvent>().unwrap();

        bus.publish(TestEvent(7)).unwrap();
        bus.publish(OtherEvent(13)).unwrap();

        assert_eq!(rx_test.recv_event().await.unwrap().0, 7);
        assert_eq!(rx_other.recv_event().await.unwrap().0, 13);
    }

    #[tokio::test]
    async fn test_dropped_bus_closes_receivers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe::<TestEvent>().unwrap();
        bus.publish(TestEvent(1)).unwrap();
        drop(bus);

        assert_eq!(rx.recv_event().await.unwrap().0, 1);
        assert!(rx.recv_event().await.is_none(), "receiver should observe closure");
    }

    #[tokio::test]
    async fn test_ordering_is_preserved() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe::<TestEvent>().unwrap();

        for i in 0..100 {
            bus.publish(TestEvent(i)).unwrap();
        }

        for i in 0..100 {
            let event = rx.recv_event().await.unwrap();
            assert_eq!(event.0, i, "Events should arrive in order");
        }
    }
}
