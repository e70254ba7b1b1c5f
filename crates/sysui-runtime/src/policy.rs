//! # Activation Policy
//!
//! Decides, once per `init`, which components get constructed.
//!
//! | Component | Condition |
//! |-----------|-----------|
//! | fingerprint launcher | `pref_fingerprint_launcher_enable` |
//! | GPS monitor | `pref_qs_management_enable` |
//! | subscription manager | device supports multiple SIMs |
//! | tuner manager | `pref_tuner_enabled` and not `pref_tuner_locked` |
//! | everything else | always |

use crate::registry::ComponentKind;
use crate::settings::{keys, SettingsSnapshot};

/// Read-only inputs for activation decisions.
#[derive(Debug, Clone, Copy)]
pub struct ActivationInput<'a> {
    /// Primary settings.
    pub settings: &'a SettingsSnapshot,
    /// Tuner settings. Absent means the tuner feature is off.
    pub tuner_settings: Option<&'a SettingsSnapshot>,
    /// Result of the multi-SIM capability query.
    pub multi_sim_supported: bool,
}

/// The fixed activation table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivationPolicy;

impl ActivationPolicy {
    /// Should `kind` be constructed under `input`?
    #[must_use]
    pub fn should_activate(kind: ComponentKind, input: &ActivationInput<'_>) -> bool {
        match kind {
            ComponentKind::FingerprintLauncher => input
                .settings
                .get_bool(keys::FINGERPRINT_LAUNCHER_ENABLE, false),
            ComponentKind::GpsMonitor => input.settings.get_bool(keys::QUICK_SETTINGS_ENABLE, false),
            ComponentKind::SubscriptionManager => input.multi_sim_supported,
            ComponentKind::TunerManager => input.tuner_settings.is_some_and(|tuner| {
                tuner.get_bool(keys::TUNER_ENABLED, false) && !tuner.get_bool(keys::TUNER_LOCKED, false)
            }),
            ComponentKind::ConfigChangeMonitor
            | ComponentKind::KeyguardMonitor
            | ComponentKind::BatteryInfo
            | ComponentKind::IconManager
            | ComponentKind::QuietHours
            | ComponentKind::AppLauncher
            | ComponentKind::NotificationData
            | ComponentKind::PackageManager => true,
        }
    }
}
