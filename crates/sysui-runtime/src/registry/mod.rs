//! # Subsystem Registry
//!
//! Owns the component slots and brings the components up, one at a time, in a
//! fixed order. A failing component never stops the others.
//!
//! ## Construction Order
//!
//! ```text
//! ┌────────────────────┬───────────────────────────────────────────────┐
//! │ config-change      │ first: the app launcher registers with it     │
//! │ keyguard-monitor   │ idempotent, may already exist                 │
//! │ battery-info       │                                               │
//! │ icon-manager       │                                               │
//! │ quiet-hours        │ shared instance                               │
//! │ app-launcher       │ + config-change listener                      │
//! │ fingerprint        │ if enabled in settings                        │
//! │ notification-data  │                                               │
//! │ gps-monitor        │ if quick settings enabled                     │
//! │ subscription       │ if multi-SIM                                  │
//! │ tuner-manager      │ if enabled and not locked                     │
//! │ package-manager    │                                               │
//! └────────────────────┴───────────────────────────────────────────────┘
//!                 │
//!                 ▼
//!      interest::assemble ──► Dispatcher registered once
//! ```
//!
//! The registry is an explicit object owned by the composition root. Slots
//! are written during `init` and by the keyguard entry point; the dispatcher
//! shares the same slot storage and reads it on every event.

mod construct;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sysui_bus::{EventFilter, Subscription};
use tracing::{debug, info, instrument, warn};

use crate::dispatcher::{Dispatcher, SharedSlots, DISPATCH_ORDER};
use crate::error::RegistryError;
use crate::interest;
use crate::policy::{ActivationInput, ActivationPolicy};
use crate::settings::SettingsSnapshot;
use crate::subsystem::{ConstructionInputs, HostContext, Subsystem, SubsystemFactory};

use construct::{try_construct, try_wire};

/// The component kinds, in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    ConfigChangeMonitor = 0,
    KeyguardMonitor = 1,
    BatteryInfo = 2,
    IconManager = 3,
    QuietHours = 4,
    AppLauncher = 5,
    FingerprintLauncher = 6,
    NotificationData = 7,
    GpsMonitor = 8,
    SubscriptionManager = 9,
    TunerManager = 10,
    PackageManager = 11,
}

/// Number of component kinds.
pub const COMPONENT_COUNT: usize = 12;

impl ComponentKind {
    /// Get the component name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigChangeMonitor => "config-change-monitor",
            Self::KeyguardMonitor => "keyguard-monitor",
            Self::BatteryInfo => "battery-info",
            Self::IconManager => "icon-manager",
            Self::QuietHours => "quiet-hours",
            Self::AppLauncher => "app-launcher",
            Self::FingerprintLauncher => "fingerprint-launcher",
            Self::NotificationData => "notification-data",
            Self::GpsMonitor => "gps-monitor",
            Self::SubscriptionManager => "subscription-manager",
            Self::TunerManager => "tuner-manager",
            Self::PackageManager => "package-manager",
        }
    }

    /// All kinds in construction order.
    #[must_use]
    pub const fn all() -> [ComponentKind; COMPONENT_COUNT] {
        [
            Self::ConfigChangeMonitor,
            Self::KeyguardMonitor,
            Self::BatteryInfo,
            Self::IconManager,
            Self::QuietHours,
            Self::AppLauncher,
            Self::FingerprintLauncher,
            Self::NotificationData,
            Self::GpsMonitor,
            Self::SubscriptionManager,
            Self::TunerManager,
            Self::PackageManager,
        ]
    }

    /// Whether activation depends on settings or device capabilities.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            Self::FingerprintLauncher
                | Self::GpsMonitor
                | Self::SubscriptionManager
                | Self::TunerManager
        )
    }

    /// Whether the component is obtained from the factory's shared-instance
    /// accessor instead of being constructed.
    #[must_use]
    pub fn is_shared_instance(&self) -> bool {
        matches!(self, Self::QuietHours)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// `init` has not decided yet.
    Pending,
    /// Constructed and populated.
    Active,
    /// Not activated by the policy.
    Disabled,
    /// Construction failed; slot left empty.
    Failed,
}

/// One optional component per kind.
#[derive(Clone, Default)]
pub struct ComponentSlots {
    slots: [Option<Arc<dyn Subsystem>>; COMPONENT_COUNT],
}

impl ComponentSlots {
    /// Get the component in `kind`'s slot.
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<&Arc<dyn Subsystem>> {
        self.slots[kind.index()].as_ref()
    }

    /// Fill `kind`'s slot.
    pub fn set(&mut self, kind: ComponentKind, component: Arc<dyn Subsystem>) {
        self.slots[kind.index()] = Some(component);
    }

    /// Whether `kind`'s slot is populated.
    #[must_use]
    pub fn is_populated(&self, kind: ComponentKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Populated kinds in construction order.
    #[must_use]
    pub fn populated(&self) -> Vec<ComponentKind> {
        ComponentKind::all()
            .into_iter()
            .filter(|kind| self.is_populated(*kind))
            .collect()
    }
}

impl fmt::Debug for ComponentSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.populated().iter().map(|kind| kind.name()))
            .finish()
    }
}

/// Outcome of `init`.
#[derive(Debug, Clone)]
pub struct InitReport {
    /// Final status per kind, in construction order.
    pub statuses: Vec<(ComponentKind, SlotStatus)>,
    /// The interest set the dispatcher was registered with.
    pub interest: EventFilter,
}

impl InitReport {
    /// Status of one kind.
    #[must_use]
    pub fn status(&self, kind: ComponentKind) -> SlotStatus {
        self.statuses
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(SlotStatus::Pending, |(_, status)| *status)
    }

    /// Kinds that ended up populated, in construction order.
    #[must_use]
    pub fn active(&self) -> Vec<ComponentKind> {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == SlotStatus::Active)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[derive(Default)]
struct RegistryState {
    status: HashMap<ComponentKind, SlotStatus>,
    interest: Option<EventFilter>,
    subscription: Option<Subscription>,
    initialized: bool,
}

/// The central component registry.
pub struct SubsystemRegistry {
    /// Builds the concrete components.
    factory: Arc<dyn SubsystemFactory>,
    /// Component slots, shared with the dispatcher.
    slots: SharedSlots,
    /// Statuses, interest set and the dispatcher registration.
    state: RwLock<RegistryState>,
}

impl SubsystemRegistry {
    /// Create an empty registry. Nothing is constructed until `init` or
    /// [`create_keyguard_monitor`](Self::create_keyguard_monitor).
    pub fn new(factory: Arc<dyn SubsystemFactory>) -> Self {
        Self {
            factory,
            slots: Arc::new(RwLock::new(ComponentSlots::default())),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Bring up every component, derive the interest set and register the
    /// dispatcher with the context's event source.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidArgument`] if `context` or `settings` is
    ///   absent. Nothing is evaluated or constructed in that case.
    /// - [`RegistryError::AlreadyInitialized`] on a second call.
    ///
    /// Component construction failures are not errors: the slot stays empty.
    #[instrument(name = "registry_init", skip_all)]
    pub fn init(
        &self,
        context: Option<Arc<dyn HostContext>>,
        settings: Option<&SettingsSnapshot>,
        quiet_hours_settings: Option<&SettingsSnapshot>,
        tuner_settings: Option<&SettingsSnapshot>,
    ) -> Result<InitReport, RegistryError> {
        let context = context.ok_or(RegistryError::InvalidArgument("context cannot be absent"))?;
        let settings =
            settings.ok_or(RegistryError::InvalidArgument("settings cannot be absent"))?;

        {
            let mut state = self.state.write();
            if state.initialized {
                return Err(RegistryError::AlreadyInitialized);
            }
            state.initialized = true;
        }

        info!("Initializing system UI components");

        let inputs = ConstructionInputs {
            context: &context,
            settings,
            quiet_hours_settings,
            tuner_settings,
        };
        let activation = ActivationInput {
            settings,
            tuner_settings,
            multi_sim_supported: context.capabilities().has_multi_sim_support(),
        };

        for kind in ComponentKind::all() {
            self.bring_up(kind, &inputs, &activation);
        }

        // Construction is complete; everything below reads final slot states.
        let slots = self.slots.read().clone();
        let interest = interest::assemble(|kind| slots.is_populated(kind));
        for kind in slots.populated() {
            warn_if_uncovered(kind, &interest);
        }

        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&self.slots)));
        let subscription = context
            .event_source()
            .register_receiver(interest.clone(), dispatcher);

        let report = {
            let mut state = self.state.write();
            state.interest = Some(interest.clone());
            state.subscription = Some(subscription);
            InitReport {
                statuses: ComponentKind::all()
                    .into_iter()
                    .map(|kind| (kind, status_of(&state, kind)))
                    .collect(),
                interest,
            }
        };

        info!(
            active = report.active().len(),
            actions = report.interest.len(),
            "System UI components initialized"
        );
        self.print_status();

        Ok(report)
    }

    /// Create the keyguard monitor if it does not exist yet.
    ///
    /// Callable before and independently of `init`. When the slot is already
    /// populated this is a no-op. Returns whether the slot is populated
    /// afterwards.
    pub fn create_keyguard_monitor(
        &self,
        context: &Arc<dyn HostContext>,
        settings: &SettingsSnapshot,
    ) -> bool {
        let inputs = ConstructionInputs {
            context,
            settings,
            quiet_hours_settings: None,
            tuner_settings: None,
        };
        self.ensure_keyguard_monitor(&inputs)
    }

    /// Get the component in `kind`'s slot.
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<Arc<dyn Subsystem>> {
        self.slots.read().get(kind).cloned()
    }

    /// Get the status of a slot.
    #[must_use]
    pub fn status(&self, kind: ComponentKind) -> SlotStatus {
        status_of(&self.state.read(), kind)
    }

    /// The frozen interest set, once `init` has run.
    #[must_use]
    pub fn interest_set(&self) -> Option<EventFilter> {
        self.state.read().interest.clone()
    }

    /// Whether the dispatcher is currently registered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.state.read().subscription.is_some()
    }

    /// The configuration-change monitor.
    pub fn config_change_monitor(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::ConfigChangeMonitor)
    }

    /// The keyguard-state monitor.
    pub fn keyguard_monitor(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::KeyguardMonitor)
    }

    /// The battery-info monitor.
    pub fn battery_info(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::BatteryInfo)
    }

    /// The status bar icon manager.
    pub fn icon_manager(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::IconManager)
    }

    /// The shared quiet hours manager.
    pub fn quiet_hours(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::QuietHours)
    }

    /// The app launcher.
    pub fn app_launcher(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::AppLauncher)
    }

    /// The fingerprint launcher, if enabled.
    pub fn fingerprint_launcher(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::FingerprintLauncher)
    }

    /// The notification-data monitor.
    pub fn notification_data(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::NotificationData)
    }

    /// The GPS status monitor, if quick settings management is enabled.
    pub fn gps_monitor(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::GpsMonitor)
    }

    /// The SIM subscription manager, if the device supports multiple SIMs.
    pub fn subscription_manager(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::SubscriptionManager)
    }

    /// The tuner manager, if enabled and not locked.
    pub fn tuner_manager(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::TunerManager)
    }

    /// The package-info manager.
    pub fn package_manager(&self) -> Option<Arc<dyn Subsystem>> {
        self.get(ComponentKind::PackageManager)
    }

    /// Unregister the dispatcher from the event source.
    ///
    /// Components stay in their slots. Returns `false` if nothing was
    /// registered.
    pub fn shutdown(&self) -> bool {
        let subscription = self.state.write().subscription.take();
        match subscription {
            Some(subscription) => {
                info!(subscription = subscription.id(), "Unregistering dispatcher");
                drop(subscription);
                true
            }
            None => false,
        }
    }

    /// Print registry status.
    pub fn print_status(&self) {
        info!("===========================================");
        info!("  SYSTEM UI COMPONENT STATUS");
        info!("===========================================");

        let state = self.state.read();

        for kind in ComponentKind::all() {
            let status = status_of(&state, kind);
            let icon = match status {
                SlotStatus::Active => "✅",
                SlotStatus::Disabled => "⏸️ ",
                SlotStatus::Failed => "❌",
                SlotStatus::Pending => "⏳",
            };

            let marker = if kind.is_conditional() { " [CONDITIONAL]" } else { "" };
            info!("  {} {:24} {:?}{}", icon, kind.name(), status, marker);
        }

        info!("===========================================");
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    fn bring_up(
        &self,
        kind: ComponentKind,
        inputs: &ConstructionInputs<'_>,
        activation: &ActivationInput<'_>,
    ) {
        if kind == ComponentKind::KeyguardMonitor {
            self.ensure_keyguard_monitor(inputs);
            return;
        }

        if !ActivationPolicy::should_activate(kind, activation) {
            info!(component = kind.name(), "Component disabled");
            self.state.write().status.insert(kind, SlotStatus::Disabled);
            return;
        }

        let factory = &self.factory;
        let built = try_construct(kind, || {
            if kind.is_shared_instance() {
                factory.shared_instance(kind, inputs)
            } else {
                factory.create(kind, inputs)
            }
        });

        let Some(component) = built else {
            self.state.write().status.insert(kind, SlotStatus::Failed);
            return;
        };

        self.slots.write().set(kind, Arc::clone(&component));
        self.state.write().status.insert(kind, SlotStatus::Active);

        // The launcher keeps its slot even if wiring it up fails.
        if kind == ComponentKind::AppLauncher {
            try_wire(kind, || self.register_config_listener(component));
        }
    }

    fn ensure_keyguard_monitor(&self, inputs: &ConstructionInputs<'_>) -> bool {
        let kind = ComponentKind::KeyguardMonitor;
        if self.slots.read().is_populated(kind) {
            debug!(component = kind.name(), "Already created");
            return true;
        }

        let factory = &self.factory;
        let Some(component) = try_construct(kind, || factory.create(kind, inputs)) else {
            self.state.write().status.insert(kind, SlotStatus::Failed);
            return false;
        };

        {
            let mut slots = self.slots.write();
            // Keep the first instance if one appeared while constructing.
            if slots.is_populated(kind) {
                return true;
            }
            slots.set(kind, component);
        }

        let mut state = self.state.write();
        state.status.insert(kind, SlotStatus::Active);
        if let Some(interest) = &state.interest {
            debug!(component = kind.name(), "Created after dispatcher registration");
            warn_if_uncovered(kind, interest);
        }
        true
    }

    fn register_config_listener(&self, launcher: Arc<dyn Subsystem>) {
        let Some(monitor) = self.config_change_monitor() else {
            return;
        };
        let Some(registrar) = monitor.as_config_change_monitor() else {
            warn!(
                component = monitor.name(),
                "Configuration-change monitor does not accept listeners"
            );
            return;
        };
        let Some(listener) = launcher.as_config_change_listener() else {
            warn!(
                component = ComponentKind::AppLauncher.name(),
                "App launcher does not listen for configuration changes"
            );
            return;
        };

        registrar.add_config_change_listener(listener);
        debug!(
            listener = ComponentKind::AppLauncher.name(),
            "Registered configuration-change listener"
        );
    }
}

fn status_of(state: &RegistryState, kind: ComponentKind) -> SlotStatus {
    state
        .status
        .get(&kind)
        .copied()
        .unwrap_or(SlotStatus::Pending)
}

/// A populated dispatch target must have its actions in the frozen interest
/// set.
fn warn_if_uncovered(kind: ComponentKind, interest: &EventFilter) {
    if !DISPATCH_ORDER.contains(&kind) {
        return;
    }
    let missing = interest::uncovered(interest, kind);
    if !missing.is_empty() {
        warn!(
            component = kind.name(),
            missing = ?missing,
            "Active component needs actions outside the interest set"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_order() {
        let all = ComponentKind::all();
        assert_eq!(all[0], ComponentKind::ConfigChangeMonitor);
        assert_eq!(all[COMPONENT_COUNT - 1], ComponentKind::PackageManager);

        for (i, kind) in all.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }

        let config = all.iter().position(|k| *k == ComponentKind::ConfigChangeMonitor);
        let launcher = all.iter().position(|k| *k == ComponentKind::AppLauncher);
        assert!(config < launcher);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ComponentKind::all().iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMPONENT_COUNT);
    }

    #[test]
    fn test_only_quiet_hours_is_shared() {
        let shared: Vec<_> = ComponentKind::all()
            .into_iter()
            .filter(|k| k.is_shared_instance())
            .collect();
        assert_eq!(shared, vec![ComponentKind::QuietHours]);
    }

    #[test]
    fn test_empty_slots() {
        let slots = ComponentSlots::default();
        assert!(slots.populated().is_empty());
        assert!(slots.get(ComponentKind::BatteryInfo).is_none());
        assert_eq!(format!("{slots:?}"), "{}");
    }

    #[test]
    fn test_report_helpers() {
        let report = InitReport {
            statuses: vec![
                (ComponentKind::ConfigChangeMonitor, SlotStatus::Active),
                (ComponentKind::BatteryInfo, SlotStatus::Failed),
                (ComponentKind::GpsMonitor, SlotStatus::Disabled),
            ],
            interest: EventFilter::new(),
        };

        assert_eq!(report.active(), vec![ComponentKind::ConfigChangeMonitor]);
        assert_eq!(report.status(ComponentKind::BatteryInfo), SlotStatus::Failed);
        assert_eq!(report.status(ComponentKind::TunerManager), SlotStatus::Pending);
    }
}
