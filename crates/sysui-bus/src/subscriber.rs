//! # Broadcast Receiver
//!
//! Defines the receiving side of the bus and the subscription handle.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::events::{BroadcastEvent, EventFilter};

/// Result of a single receiver callback.
pub type ReceiveResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// A receiver failed while handling a delivered event.
///
/// Delivery of that event stops at the failing receiver.
#[derive(Debug, Error)]
#[error("Receiver '{receiver}' failed handling {action}")]
pub struct DeliveryError {
    /// Name of the failing receiver.
    pub receiver: String,
    /// Action of the event being delivered.
    pub action: String,
    /// The receiver's own error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

/// Callback endpoint registered with an event source.
pub trait BroadcastReceiver: Send + Sync {
    /// Receiver name, used in logs and delivery errors.
    fn name(&self) -> &str;

    /// Handle one event that matched the receiver's filter.
    fn on_receive(&self, event: &BroadcastEvent) -> ReceiveResult;
}

/// One registered receiver.
pub(crate) struct Registration {
    pub(crate) id: u64,
    pub(crate) filter: EventFilter,
    pub(crate) receiver: Arc<dyn BroadcastReceiver>,
}

pub(crate) type ReceiverTable = RwLock<Vec<Registration>>;

/// Handle for a registered receiver.
///
/// When dropped, the receiver is unregistered.
pub struct Subscription {
    id: u64,
    filter: EventFilter,
    table: Weak<ReceiverTable>,
}

impl Subscription {
    pub(crate) fn new(id: u64, filter: EventFilter, table: &Arc<ReceiverTable>) -> Self {
        Self {
            id,
            filter,
            table: Arc::downgrade(table),
        }
    }

    /// Get the filter this subscription was registered with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Registration id, unique per bus.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("actions", &self.filter.len())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Bus already gone
        let Some(table) = self.table.upgrade() else {
            return;
        };
        table.write().retain(|reg| reg.id != self.id);
        debug!(subscription = self.id, "Subscription dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::actions;
    use crate::publisher::{EventSource, InMemoryEventBus};
    use parking_lot::Mutex;

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl BroadcastReceiver for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_receive(&self, event: &BroadcastEvent) -> ReceiveResult {
            self.seen.lock().push(event.action.clone());
            Ok(())
        }
    }

    #[test]
    fn test_subscription_drop_cleanup() {
        let bus = InMemoryEventBus::new();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });

        {
            let _sub1 = bus.register_receiver(EventFilter::all(), recorder.clone());
            let _sub2 = bus.register_receiver(EventFilter::all(), recorder.clone());
            assert_eq!(bus.receiver_count(), 2);
        }

        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let bus = InMemoryEventBus::new();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });

        let sub = bus.register_receiver(EventFilter::actions([actions::SCREEN_ON]), recorder.clone());
        bus.publish(&BroadcastEvent::new(actions::SCREEN_ON)).unwrap();
        drop(sub);
        bus.publish(&BroadcastEvent::new(actions::SCREEN_ON)).unwrap();

        assert_eq!(recorder.seen.lock().len(), 1);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let sub = {
            let bus = InMemoryEventBus::new();
            bus.register_receiver(EventFilter::all(), recorder)
        };
        assert_eq!(sub.filter(), &EventFilter::all());
        drop(sub);
    }
}
