//! # Subsystem Contract
//!
//! Defines what every system UI component must provide to be managed by the
//! registry, plus the narrow extra capabilities only some components have.
//!
//! ## Capability Casts
//!
//! The registry holds every component as `Arc<dyn Subsystem>`. Where one
//! component must talk to another (the app launcher listens for configuration
//! changes), the registry asks for the secondary interface through
//! [`Subsystem::as_config_change_monitor`] and
//! [`Subsystem::as_config_change_listener`]. Components that do not have the
//! capability keep the default `None`.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use sysui_runtime::{ComponentKind, Subsystem, SubsystemError};
//! use sysui_bus::BroadcastEvent;
//!
//! struct BatteryInfo { /* ... */ }
//!
//! impl Subsystem for BatteryInfo {
//!     fn kind(&self) -> ComponentKind { ComponentKind::BatteryInfo }
//!     fn handle(&self, event: &BroadcastEvent) -> Result<(), SubsystemError> { Ok(()) }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use sysui_bus::{BroadcastEvent, EventSource};
use thiserror::Error;

use crate::registry::ComponentKind;
use crate::settings::SettingsSnapshot;

/// Error raised by a component, either while being built or while handling.
#[derive(Debug, Clone, Error)]
#[error("[{}] {kind}: {message}", .component.name())]
pub struct SubsystemError {
    /// The component that raised the error.
    pub component: ComponentKind,
    /// Error kind.
    pub kind: SubsystemErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl SubsystemError {
    /// Construction failed.
    pub fn construction(component: ComponentKind, message: impl Into<String>) -> Self {
        Self {
            component,
            kind: SubsystemErrorKind::ConstructionFailed,
            message: message.into(),
        }
    }

    /// Handling an event failed.
    pub fn handler(component: ComponentKind, message: impl Into<String>) -> Self {
        Self {
            component,
            kind: SubsystemErrorKind::HandlerFailed,
            message: message.into(),
        }
    }
}

/// Categories of component errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemErrorKind {
    /// The constructor returned an error.
    ConstructionFailed,
    /// The constructor panicked.
    ConstructionPanicked,
    /// The event handler returned an error.
    HandlerFailed,
}

impl fmt::Display for SubsystemErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstructionFailed => write!(f, "ConstructionFailed"),
            Self::ConstructionPanicked => write!(f, "ConstructionPanicked"),
            Self::HandlerFailed => write!(f, "HandlerFailed"),
        }
    }
}

/// Trait every managed component implements.
pub trait Subsystem: Send + Sync {
    /// Which slot this component occupies.
    fn kind(&self) -> ComponentKind;

    /// Component name.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Handle one broadcast. Components ignore actions they do not care about.
    fn handle(&self, event: &BroadcastEvent) -> Result<(), SubsystemError>;

    /// Listener registration, for the configuration-change monitor.
    fn as_config_change_monitor(&self) -> Option<&dyn ConfigChangeMonitor> {
        None
    }

    /// Listener view of this component, for components that follow
    /// configuration changes.
    fn as_config_change_listener(self: Arc<Self>) -> Option<Arc<dyn ConfigChangeListener>> {
        None
    }
}

/// Receives configuration changes from the configuration-change monitor.
pub trait ConfigChangeListener: Send + Sync {
    fn on_configuration_changed(&self, event: &BroadcastEvent);
}

/// Fans configuration changes out to registered listeners.
pub trait ConfigChangeMonitor: Send + Sync {
    fn add_config_change_listener(&self, listener: Arc<dyn ConfigChangeListener>);
}

/// Device capability queries.
pub trait DeviceCapabilities: Send + Sync {
    /// Does the device support multiple active SIMs?
    fn has_multi_sim_support(&self) -> bool;
}

/// The host environment the runtime is embedded in.
pub trait HostContext: Send + Sync {
    /// Where the dispatcher registers.
    fn event_source(&self) -> &dyn EventSource;

    /// Capability queries, evaluated once during `init`.
    fn capabilities(&self) -> &dyn DeviceCapabilities;
}

/// Everything a component constructor may read.
///
/// Snapshots are passed through unmodified.
#[derive(Clone, Copy)]
pub struct ConstructionInputs<'a> {
    pub context: &'a Arc<dyn HostContext>,
    pub settings: &'a SettingsSnapshot,
    pub quiet_hours_settings: Option<&'a SettingsSnapshot>,
    pub tuner_settings: Option<&'a SettingsSnapshot>,
}

/// Builds concrete components.
///
/// Supplied by the host; the registry only decides *whether* and *when*.
pub trait SubsystemFactory: Send + Sync {
    /// Construct a new component of `kind`.
    fn create(
        &self,
        kind: ComponentKind,
        inputs: &ConstructionInputs<'_>,
    ) -> Result<Arc<dyn Subsystem>, SubsystemError>;

    /// Obtain the process-wide shared instance of `kind`.
    ///
    /// Used for kinds whose [`ComponentKind::is_shared_instance`] is true.
    fn shared_instance(
        &self,
        kind: ComponentKind,
        inputs: &ConstructionInputs<'_>,
    ) -> Result<Arc<dyn Subsystem>, SubsystemError> {
        self.create(kind, inputs)
    }
}
