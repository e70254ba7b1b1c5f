//! # Standalone Host
//!
//! Host adapters used by the `sysui-runtime` binary: an in-memory event
//! source, fixed device capabilities and a factory whose components trace
//! what they receive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sysui_bus::{actions, BroadcastEvent, EventSource, InMemoryEventBus};
use tracing::{debug, info, trace};

use crate::interest;
use crate::registry::ComponentKind;
use crate::subsystem::{
    ConfigChangeListener, ConfigChangeMonitor, ConstructionInputs, DeviceCapabilities,
    HostContext, Subsystem, SubsystemError, SubsystemFactory,
};

/// Capabilities fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCapabilities {
    pub multi_sim: bool,
}

impl DeviceCapabilities for StaticCapabilities {
    fn has_multi_sim_support(&self) -> bool {
        self.multi_sim
    }
}

/// Host backed by an [`InMemoryEventBus`].
pub struct StaticHost {
    bus: Arc<InMemoryEventBus>,
    capabilities: StaticCapabilities,
}

impl StaticHost {
    pub fn new(bus: Arc<InMemoryEventBus>, capabilities: StaticCapabilities) -> Self {
        Self { bus, capabilities }
    }

    /// The bus broadcasts are published on.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }
}

impl HostContext for StaticHost {
    fn event_source(&self) -> &dyn EventSource {
        self.bus.as_ref()
    }

    fn capabilities(&self) -> &dyn DeviceCapabilities {
        &self.capabilities
    }
}

/// A component that records and traces the broadcasts it handles.
///
/// The configuration-change variant fans `CONFIGURATION_CHANGED` out to its
/// listeners; the app-launcher variant is such a listener.
pub struct TracingSubsystem {
    kind: ComponentKind,
    handled: AtomicU64,
    config_changes: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn ConfigChangeListener>>>,
}

impl TracingSubsystem {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            handled: AtomicU64::new(0),
            config_changes: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Broadcasts this component recognised.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    /// Configuration changes forwarded to this component as a listener.
    pub fn config_changes(&self) -> u64 {
        self.config_changes.load(Ordering::Relaxed)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Subsystem for TracingSubsystem {
    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn handle(&self, event: &BroadcastEvent) -> Result<(), SubsystemError> {
        let relevant = interest::required_actions(self.kind)
            .iter()
            .any(|action| *action == event.action());
        if !relevant {
            trace!(component = self.kind.name(), action = %event.action, "Ignored");
            return Ok(());
        }

        self.handled.fetch_add(1, Ordering::Relaxed);
        info!(
            component = self.kind.name(),
            action = %event.action,
            extras = event.extras.len(),
            "Broadcast handled"
        );

        if self.kind == ComponentKind::ConfigChangeMonitor
            && event.action() == actions::CONFIGURATION_CHANGED
        {
            let listeners = self.listeners.read().clone();
            for listener in listeners {
                listener.on_configuration_changed(event);
            }
        }
        Ok(())
    }

    fn as_config_change_monitor(&self) -> Option<&dyn ConfigChangeMonitor> {
        if self.kind == ComponentKind::ConfigChangeMonitor {
            Some(self as &dyn ConfigChangeMonitor)
        } else {
            None
        }
    }

    fn as_config_change_listener(self: Arc<Self>) -> Option<Arc<dyn ConfigChangeListener>> {
        if self.kind == ComponentKind::AppLauncher {
            Some(self as Arc<dyn ConfigChangeListener>)
        } else {
            None
        }
    }
}

impl ConfigChangeMonitor for TracingSubsystem {
    fn add_config_change_listener(&self, listener: Arc<dyn ConfigChangeListener>) {
        self.listeners.write().push(listener);
    }
}

impl ConfigChangeListener for TracingSubsystem {
    fn on_configuration_changed(&self, _event: &BroadcastEvent) {
        self.config_changes.fetch_add(1, Ordering::Relaxed);
        debug!(component = self.kind.name(), "Configuration changed");
    }
}

/// Builds [`TracingSubsystem`]s. The quiet hours component is created once
/// and handed out on every `shared_instance` call.
#[derive(Default)]
pub struct TracingFactory {
    quiet_hours: Mutex<Option<Arc<TracingSubsystem>>>,
}

impl TracingFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubsystemFactory for TracingFactory {
    fn create(
        &self,
        kind: ComponentKind,
        inputs: &ConstructionInputs<'_>,
    ) -> Result<Arc<dyn Subsystem>, SubsystemError> {
        debug!(
            component = kind.name(),
            settings = inputs.settings.len(),
            "Creating component"
        );
        Ok(Arc::new(TracingSubsystem::new(kind)))
    }

    fn shared_instance(
        &self,
        kind: ComponentKind,
        inputs: &ConstructionInputs<'_>,
    ) -> Result<Arc<dyn Subsystem>, SubsystemError> {
        if kind != ComponentKind::QuietHours {
            return self.create(kind, inputs);
        }

        let mut cached = self.quiet_hours.lock();
        let instance = cached.get_or_insert_with(|| {
            debug!(
                component = kind.name(),
                quiet_hours_settings = inputs.quiet_hours_settings.map_or(0, |s| s.len()),
                "Creating shared instance"
            );
            Arc::new(TracingSubsystem::new(kind))
        });
        Ok(Arc::clone(instance) as Arc<dyn Subsystem>)
    }
}
