//! EventHub - tenant-isolated change-event fan-out
//!
//! ```text
//! OrderService (after commit)
//!       │ ChangeEvent
//!       ▼
//! EventHub
//!   ├── subscribers: subscription_id → (tenant, kind filter, mpsc::Sender)
//!   │       publish: tenant match → kind match → try_send
//!   └── WS handler (subscribe → forward → unsubscribe on close)
//! ```
//!
//! Delivery is at-least-once per connected subscriber and best-effort: a full
//! buffer drops the event for that subscriber only, the write path is never
//! blocked, and there is no replay for late joiners.

use dashmap::DashMap;
use shared::event::{ChangeEvent, EventKind};
use shared::util::new_id;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One live subscription.
struct Subscriber {
    tenant_id: String,
    /// `None` means every kind.
    kinds: Option<Vec<EventKind>>,
    tx: mpsc::Sender<ChangeEvent>,
}

impl Subscriber {
    fn wants(&self, event: &ChangeEvent) -> bool {
        if self.tenant_id != event.tenant_id {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind),
            None => true,
        }
    }
}

/// Fan-out hub, cheap to clone and share.
#[derive(Clone)]
pub struct EventHub {
    /// subscription_id → subscriber
    subscribers: Arc<DashMap<String, Subscriber>>,
    /// Per-subscriber channel capacity
    buffer: usize,
    /// Events dropped because a subscriber buffer was full
    dropped: Arc<AtomicU64>,
    /// Cancelled on server shutdown so live sessions can wind down
    shutdown: CancellationToken,
}

impl EventHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
            dropped: Arc::new(AtomicU64::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a subscriber for one tenant, optionally restricted to a set
    /// of event kinds. Returns the subscription id and the receiving end.
    pub fn subscribe(
        &self,
        tenant_id: &str,
        kinds: Option<Vec<EventKind>>,
    ) -> (String, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = new_id();
        self.subscribers.insert(
            id.clone(),
            Subscriber {
                tenant_id: tenant_id.to_string(),
                kinds,
                tx,
            },
        );
        debug!(subscription_id = %id, tenant_id = %tenant_id, "subscriber registered");
        (id, rx)
    }

    /// Drop a subscription. Events published afterwards are not delivered.
    pub fn unsubscribe(&self, subscription_id: &str) {
        if self.subscribers.remove(subscription_id).is_some() {
            debug!(subscription_id = %subscription_id, "subscriber removed");
        }
    }

    /// Fire-and-forget fan-out to every matching subscriber.
    ///
    /// A slow subscriber loses events (warn + counter), a closed one is
    /// cleaned up; the publisher never blocks and never sees an error.
    pub fn publish(&self, event: &ChangeEvent) {
        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if !subscriber.wants(event) {
                continue;
            }
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        subscription_id = %entry.key(),
                        kind = %event.kind,
                        entity_id = %event.entity_id,
                        "subscriber buffer full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(entry.key().clone());
                }
            }
        }
        // Removal happens outside the iteration to keep the shard locks short
        for id in closed {
            self.unsubscribe(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total events dropped across all subscribers since startup.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Token that live sessions watch to wind down on server shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal every live session to close.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderStatus;

    fn order_event(tenant_id: &str, entity_id: &str) -> ChangeEvent {
        ChangeEvent::order_created(tenant_id, entity_id, OrderStatus::Pending, 1_000)
    }

    #[tokio::test]
    async fn test_subscriber_receives_own_tenant_only() {
        let hub = EventHub::new(8);
        let (_id, mut rx) = hub.subscribe("tenant-a", None);

        hub.publish(&order_event("tenant-b", "order-b"));
        hub.publish(&order_event("tenant-a", "order-a"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.tenant_id, "tenant-a");
        assert_eq!(event.entity_id, "order-a");
        // Nothing else buffered; the other tenant's event never crossed over
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let hub = EventHub::new(8);
        let (_id, mut rx) = hub.subscribe("tenant-a", Some(vec![EventKind::OrderStatusChanged]));

        hub.publish(&order_event("tenant-a", "order-1"));
        hub.publish(&ChangeEvent::order_status_changed(
            "tenant-a",
            "order-1",
            OrderStatus::Confirmed,
            2_000,
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::OrderStatusChanged);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_subscribers() {
        let hub = EventHub::new(8);
        let (_a, mut rx_a) = hub.subscribe("tenant-a", None);
        let (_b, mut rx_b) = hub.subscribe("tenant-a", None);
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(&order_event("tenant-a", "order-1"));

        assert_eq!(rx_a.recv().await.unwrap().entity_id, "order-1");
        assert_eq!(rx_b.recv().await.unwrap().entity_id, "order-1");
    }

    #[tokio::test]
    async fn test_full_buffer_drops_for_that_subscriber_only() {
        let hub = EventHub::new(1);
        let (_slow, mut slow_rx) = hub.subscribe("tenant-a", None);
        let (_fast, mut fast_rx) = hub.subscribe("tenant-a", None);

        hub.publish(&order_event("tenant-a", "order-1"));
        // Drain the fast subscriber so its buffer has room again
        assert_eq!(fast_rx.recv().await.unwrap().entity_id, "order-1");

        hub.publish(&order_event("tenant-a", "order-2"));
        hub.publish(&order_event("tenant-a", "order-3"));

        // Slow subscriber kept only the first event
        assert_eq!(slow_rx.recv().await.unwrap().entity_id, "order-1");
        assert!(slow_rx.try_recv().is_err());
        // Fast subscriber kept order-2; order-3 overflowed for both
        assert_eq!(fast_rx.recv().await.unwrap().entity_id, "order-2");

        assert_eq!(hub.dropped_events(), 3);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let hub = EventHub::new(8);
        let (id, mut rx) = hub.subscribe("tenant-a", None);

        hub.unsubscribe(&id);
        assert_eq!(hub.subscriber_count(), 0);

        hub.publish(&order_event("tenant-a", "order-1"));
        // Sender side is gone, so the channel reports closed
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_cleaned_up() {
        let hub = EventHub::new(8);
        let (_id, rx) = hub.subscribe("tenant-a", None);
        drop(rx);

        hub.publish(&order_event("tenant-a", "order-1"));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = EventHub::new(8);
        hub.publish(&order_event("tenant-a", "order-1"));
        assert_eq!(hub.dropped_events(), 0);
    }

    #[test]
    fn test_shutdown_cancels_session_token() {
        let hub = EventHub::new(8);
        let token = hub.shutdown_token();
        assert!(!token.is_cancelled());

        hub.shutdown();
        assert!(token.is_cancelled());
    }
}
