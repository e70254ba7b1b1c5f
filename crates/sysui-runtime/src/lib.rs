//! # SysUI Runtime Library
//!
//! Subsystem registry and broadcast dispatcher for the system UI components.
//! The `sysui-runtime` binary is the composition root; this library holds
//! everything it wires together.
//!
//! ## Startup Flow
//!
//! ```text
//! SubsystemRegistry::init()
//!     │
//!     ├── ActivationPolicy ──► should this kind be built?
//!     ├── try_construct ─────► build, or log and leave the slot empty
//!     │
//!     ├── interest::assemble ► actions the populated slots need
//!     │
//!     └── Dispatcher ────────► registered once with the event source,
//!                              forwards every event to every populated slot
//! ```
//!
//! Construction failures are isolated per component. Handler failures during
//! dispatch are not: they propagate to the event source.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod interest;
pub mod policy;
pub mod registry;
pub mod settings;
pub mod subsystem;

pub use config::{ConfigError, RuntimeConfig};
pub use dispatcher::{Dispatcher, DISPATCH_ORDER};
pub use error::{DispatchError, RegistryError};
pub use policy::{ActivationInput, ActivationPolicy};
pub use registry::{ComponentKind, ComponentSlots, InitReport, SlotStatus, SubsystemRegistry};
pub use settings::SettingsSnapshot;
pub use subsystem::{
    ConfigChangeListener, ConfigChangeMonitor, ConstructionInputs, DeviceCapabilities,
    HostContext, Subsystem, SubsystemError, SubsystemErrorKind, SubsystemFactory,
};
