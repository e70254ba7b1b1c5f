//! # Dispatcher
//!
//! The single receiver the runtime registers with the event source. Every
//! delivered event is handed to every populated slot in [`DISPATCH_ORDER`].
//!
//! Handlers are called directly. The first failure stops the fan-out and is
//! returned to the event source; there is no isolation here, unlike
//! construction.
//!
//! The dispatcher reads the registry's live slot storage, so a component
//! created after `init` (the keyguard entry point) is reached as soon as its
//! slot is populated. Handlers run on a per-event snapshot, outside the lock.

use std::sync::Arc;

use parking_lot::RwLock;
use sysui_bus::{BroadcastEvent, BroadcastReceiver, ReceiveResult};
use tracing::{debug, trace};

use crate::error::DispatchError;
use crate::registry::{ComponentKind, ComponentSlots};

/// Fixed forwarding order. Kinds not listed never receive broadcasts.
pub const DISPATCH_ORDER: [ComponentKind; 9] = [
    ComponentKind::ConfigChangeMonitor,
    ComponentKind::BatteryInfo,
    ComponentKind::QuietHours,
    ComponentKind::AppLauncher,
    ComponentKind::KeyguardMonitor,
    ComponentKind::FingerprintLauncher,
    ComponentKind::GpsMonitor,
    ComponentKind::SubscriptionManager,
    ComponentKind::TunerManager,
];

/// Shared slot storage, written by the registry and read per event.
pub type SharedSlots = Arc<RwLock<ComponentSlots>>;

/// Forwards broadcasts to the populated component slots.
pub struct Dispatcher {
    slots: SharedSlots,
}

impl Dispatcher {
    /// Create a dispatcher over the registry's slot storage.
    pub fn new(slots: SharedSlots) -> Self {
        Self { slots }
    }

    /// Forward `event` to every populated slot.
    ///
    /// # Returns
    ///
    /// The number of components that handled the event.
    pub fn dispatch(&self, event: &BroadcastEvent) -> Result<usize, DispatchError> {
        let slots = self.slots.read().clone();
        let mut delivered = 0;

        for kind in DISPATCH_ORDER {
            let Some(component) = slots.get(kind) else {
                continue;
            };

            trace!(component = kind.name(), action = %event.action, "Dispatching");
            component.handle(event).map_err(|source| DispatchError {
                component: kind,
                action: event.action.clone(),
                source,
            })?;
            delivered += 1;
        }

        debug!(action = %event.action, delivered, "Broadcast dispatched");
        Ok(delivered)
    }

    /// Snapshot of the slots this dispatcher forwards to.
    pub fn slots(&self) -> ComponentSlots {
        self.slots.read().clone()
    }
}

impl BroadcastReceiver for Dispatcher {
    fn name(&self) -> &str {
        "sysui-dispatcher"
    }

    fn on_receive(&self, event: &BroadcastEvent) -> ReceiveResult {
        self.dispatch(event)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::{Subsystem, SubsystemError};
    use parking_lot::Mutex;

    struct Recorder {
        kind: ComponentKind,
        log: Arc<Mutex<Vec<ComponentKind>>>,
        fail: bool,
    }

    impl Subsystem for Recorder {
        fn kind(&self) -> ComponentKind {
            self.kind
        }

        fn handle(&self, _event: &BroadcastEvent) -> Result<(), SubsystemError> {
            self.log.lock().push(self.kind);
            if self.fail {
                return Err(SubsystemError::handler(self.kind, "handler blew up"));
            }
            Ok(())
        }
    }

    fn slots_with(
        kinds: &[ComponentKind],
        failing: Option<ComponentKind>,
        log: &Arc<Mutex<Vec<ComponentKind>>>,
    ) -> SharedSlots {
        let mut slots = ComponentSlots::default();
        for kind in kinds {
            slots.set(
                *kind,
                Arc::new(Recorder {
                    kind: *kind,
                    log: Arc::clone(log),
                    fail: failing == Some(*kind),
                }),
            );
        }
        Arc::new(RwLock::new(slots))
    }

    #[test]
    fn test_dispatch_order_with_all_populated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(slots_with(&ComponentKind::all(), None, &log));

        let delivered = dispatcher.dispatch(&BroadcastEvent::new("x")).unwrap();

        assert_eq!(delivered, DISPATCH_ORDER.len());
        assert_eq!(*log.lock(), DISPATCH_ORDER.to_vec());
    }

    #[test]
    fn test_absent_slots_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let kinds = [
            ComponentKind::TunerManager,
            ComponentKind::ConfigChangeMonitor,
            ComponentKind::KeyguardMonitor,
        ];
        let dispatcher = Dispatcher::new(slots_with(&kinds, None, &log));

        assert_eq!(dispatcher.dispatch(&BroadcastEvent::new("x")).unwrap(), 3);
        assert_eq!(
            *log.lock(),
            vec![
                ComponentKind::ConfigChangeMonitor,
                ComponentKind::KeyguardMonitor,
                ComponentKind::TunerManager,
            ]
        );
    }

    #[test]
    fn test_unrouted_kinds_never_receive() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let kinds = [
            ComponentKind::IconManager,
            ComponentKind::NotificationData,
            ComponentKind::PackageManager,
        ];
        let dispatcher = Dispatcher::new(slots_with(&kinds, None, &log));

        assert_eq!(dispatcher.dispatch(&BroadcastEvent::new("x")).unwrap(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_handler_failure_propagates_and_stops() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(slots_with(
            &ComponentKind::all(),
            Some(ComponentKind::AppLauncher),
            &log,
        ));

        let err = dispatcher.dispatch(&BroadcastEvent::new("x")).unwrap_err();

        assert_eq!(err.component, ComponentKind::AppLauncher);
        assert_eq!(err.action, "x");
        assert_eq!(
            *log.lock(),
            vec![
                ComponentKind::ConfigChangeMonitor,
                ComponentKind::BatteryInfo,
                ComponentKind::QuietHours,
                ComponentKind::AppLauncher,
            ]
        );
    }

    #[test]
    fn test_slot_populated_after_creation_is_reached() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slots = slots_with(&[ComponentKind::BatteryInfo], None, &log);
        let dispatcher = Dispatcher::new(Arc::clone(&slots));

        slots.write().set(
            ComponentKind::KeyguardMonitor,
            Arc::new(Recorder {
                kind: ComponentKind::KeyguardMonitor,
                log: Arc::clone(&log),
                fail: false,
            }),
        );

        assert_eq!(dispatcher.dispatch(&BroadcastEvent::new("x")).unwrap(), 2);
        assert_eq!(
            *log.lock(),
            vec![ComponentKind::BatteryInfo, ComponentKind::KeyguardMonitor]
        );
        assert!(dispatcher.slots().is_populated(ComponentKind::KeyguardMonitor));
    }

    #[test]
    fn test_receiver_boxes_dispatch_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(slots_with(
            &[ComponentKind::GpsMonitor],
            Some(ComponentKind::GpsMonitor),
            &log,
        ));

        let err = dispatcher.on_receive(&BroadcastEvent::new("x")).unwrap_err();
        let dispatch_err = err.downcast_ref::<DispatchError>().unwrap();
        assert_eq!(dispatch_err.component, ComponentKind::GpsMonitor);
    }
}
