//! # Event Source
//!
//! Defines the registration side of the bus and the in-memory implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::events::{BroadcastEvent, EventFilter};
use crate::subscriber::{
    BroadcastReceiver, DeliveryError, ReceiverTable, Registration, Subscription,
};

/// A filtered publish mechanism receivers can register with.
///
/// This is the only thing the runtime needs from its environment: subscribe
/// once with an action filter and receive a callback per matching event.
pub trait EventSource: Send + Sync {
    /// Register a receiver for events matching `filter`.
    ///
    /// The receiver stays registered until the returned handle is dropped.
    fn register_receiver(
        &self,
        filter: EventFilter,
        receiver: Arc<dyn BroadcastReceiver>,
    ) -> Subscription;
}

/// In-memory, synchronous implementation of the event source.
///
/// `publish` delivers on the caller's thread to every matching receiver in
/// registration order.
pub struct InMemoryEventBus {
    /// Registered receivers.
    table: Arc<ReceiverTable>,

    /// Next registration id.
    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,
}

impl InMemoryEventBus {
    /// Create a new bus with no receivers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
        }
    }

    /// Publish an event to every matching receiver.
    ///
    /// # Returns
    ///
    /// The number of receivers the event was delivered to, or the first
    /// receiver failure. Receivers after a failing one are not called.
    pub fn publish(&self, event: &BroadcastEvent) -> Result<usize, DeliveryError> {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so receivers may register or drop subscriptions re-entrantly.
        let targets: Vec<Arc<dyn BroadcastReceiver>> = self
            .table
            .read()
            .iter()
            .filter(|reg| reg.filter.matches(event))
            .map(|reg| Arc::clone(&reg.receiver))
            .collect();

        if targets.is_empty() {
            trace!(action = %event.action, "Event dropped (no matching receivers)");
            return Ok(0);
        }

        for receiver in &targets {
            if let Err(source) = receiver.on_receive(event) {
                warn!(
                    action = %event.action,
                    receiver = receiver.name(),
                    error = %source,
                    "Receiver failed, delivery stopped"
                );
                return Err(DeliveryError {
                    receiver: receiver.name().to_string(),
                    action: event.action.clone(),
                    source,
                });
            }
        }

        debug!(action = %event.action, receivers = targets.len(), "Event published");
        Ok(targets.len())
    }

    /// Get the number of registered receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.table.read().len()
    }

    /// Get the total number of events published.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for InMemoryEventBus {
    fn register_receiver(
        &self,
        filter: EventFilter,
        receiver: Arc<dyn BroadcastReceiver>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            subscription = id,
            receiver = receiver.name(),
            actions = filter.len(),
            "New receiver registered"
        );

        let subscription = Subscription::new(id, filter.clone(), &self.table);
        self.table.write().push(Registration {
            id,
            filter,
            receiver,
        });
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::actions;
    use crate::subscriber::ReceiveResult;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
                fail: false,
            })
        }

        fn failing(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
                fail: true,
            })
        }
    }

    impl BroadcastReceiver for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_receive(&self, event: &BroadcastEvent) -> ReceiveResult {
            self.log.lock().push(format!("{}:{}", self.name, event.action));
            if self.fail {
                return Err("boom".into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_publish_no_receivers() {
        let bus = InMemoryEventBus::new();
        let delivered = bus.publish(&BroadcastEvent::new(actions::SCREEN_ON)).unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[test]
    fn test_publish_respects_filter() {
        let bus = InMemoryEventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = bus.register_receiver(
            EventFilter::actions([actions::BATTERY_CHANGED]),
            Recorder::new("battery", &log),
        );

        assert_eq!(bus.publish(&BroadcastEvent::new(actions::TIME_TICK)).unwrap(), 0);
        assert_eq!(bus.publish(&BroadcastEvent::new(actions::BATTERY_CHANGED)).unwrap(), 1);
        assert_eq!(*log.lock(), vec![format!("battery:{}", actions::BATTERY_CHANGED)]);
    }

    #[test]
    fn test_registration_order_is_delivery_order() {
        let bus = InMemoryEventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = bus.register_receiver(EventFilter::all(), Recorder::new("a", &log));
        let _b = bus.register_receiver(EventFilter::all(), Recorder::new("b", &log));

        assert_eq!(bus.publish(&BroadcastEvent::new("x")).unwrap(), 2);
        assert_eq!(*log.lock(), vec!["a:x".to_string(), "b:x".to_string()]);
    }

    #[test]
    fn test_receiver_failure_stops_delivery() {
        let bus = InMemoryEventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = bus.register_receiver(EventFilter::all(), Recorder::failing("a", &log));
        let _b = bus.register_receiver(EventFilter::all(), Recorder::new("b", &log));

        let err = bus.publish(&BroadcastEvent::new("x")).unwrap_err();

        assert_eq!(err.receiver, "a");
        assert_eq!(err.action, "x");
        assert_eq!(*log.lock(), vec!["a:x".to_string()]);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryEventBus::default();
        assert_eq!(bus.receiver_count(), 0);
        assert_eq!(bus.events_published(), 0);
    }
}
