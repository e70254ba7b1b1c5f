//! # Interest Set
//!
//! The broadcast actions the dispatcher subscribes to, declared as a table of
//! `(component, when, actions)` rows and evaluated once after construction.
//!
//! Base rows are always included, even when their component failed to come
//! up. Conditional rows are included only when their slot is populated.

use sysui_bus::{actions, EventFilter};

use crate::registry::ComponentKind;

/// When a row contributes to the interest set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Always part of the set.
    Base,
    /// Only if the owning slot is populated.
    WhenActive,
}

/// One row of the interest table.
#[derive(Debug, Clone, Copy)]
pub struct InterestRow {
    pub component: ComponentKind,
    pub inclusion: Inclusion,
    pub actions: &'static [&'static str],
}

/// The interest table, in subscription order.
pub const INTEREST_TABLE: &[InterestRow] = &[
    InterestRow {
        component: ComponentKind::ConfigChangeMonitor,
        inclusion: Inclusion::Base,
        actions: &[actions::CONFIGURATION_CHANGED],
    },
    InterestRow {
        component: ComponentKind::BatteryInfo,
        inclusion: Inclusion::Base,
        actions: &[
            actions::BATTERY_CHANGED,
            actions::BATTERY_SOUND_CHANGED,
            actions::LOW_BATTERY_WARNING_POLICY_CHANGED,
            actions::POWER_SAVE_MODE_CHANGING,
        ],
    },
    InterestRow {
        component: ComponentKind::QuietHours,
        inclusion: Inclusion::Base,
        actions: &[
            actions::TIME_TICK,
            actions::TIME_SET,
            actions::TIMEZONE_CHANGED,
            actions::QUIET_HOURS_CHANGED,
        ],
    },
    InterestRow {
        component: ComponentKind::AppLauncher,
        inclusion: Inclusion::Base,
        actions: &[actions::APP_LAUNCHER_CHANGED, actions::SHOW_APP_LAUNCHER],
    },
    InterestRow {
        component: ComponentKind::KeyguardMonitor,
        inclusion: Inclusion::Base,
        actions: &[
            actions::SCREEN_ON,
            actions::SCREEN_OFF,
            actions::POWER_CHANGED,
            actions::LOCKSCREEN_SETTINGS_CHANGED,
        ],
    },
    InterestRow {
        component: ComponentKind::FingerprintLauncher,
        inclusion: Inclusion::WhenActive,
        actions: &[actions::USER_PRESENT, actions::FPL_SETTINGS_CHANGED],
    },
    InterestRow {
        component: ComponentKind::GpsMonitor,
        inclusion: Inclusion::WhenActive,
        actions: &[actions::LOCATION_MODE_CHANGED, actions::LOCKED_BOOT_COMPLETED],
    },
    InterestRow {
        component: ComponentKind::SubscriptionManager,
        inclusion: Inclusion::WhenActive,
        actions: &[actions::CHANGE_DEFAULT_SIM_SLOT, actions::GET_DEFAULT_SIM_SLOT],
    },
    InterestRow {
        component: ComponentKind::TunerManager,
        inclusion: Inclusion::WhenActive,
        actions: &[actions::GET_TUNEABLES],
    },
];

/// Build the interest set from the final slot states.
///
/// `is_populated` is consulted only for conditional rows.
pub fn assemble<F>(is_populated: F) -> EventFilter
where
    F: Fn(ComponentKind) -> bool,
{
    let mut filter = EventFilter::new();
    for row in INTEREST_TABLE {
        if row.inclusion == Inclusion::Base || is_populated(row.component) {
            for action in row.actions {
                filter.add_action(*action);
            }
        }
    }
    filter
}

/// The base set, i.e. the result when no conditional component is active.
#[must_use]
pub fn base() -> EventFilter {
    assemble(|_| false)
}

/// Actions `kind` relies on receiving. Empty for kinds the dispatcher never
/// forwards to.
#[must_use]
pub fn required_actions(kind: ComponentKind) -> &'static [&'static str] {
    INTEREST_TABLE
        .iter()
        .find(|row| row.component == kind)
        .map(|row| row.actions)
        .unwrap_or(&[])
}

/// Actions `kind` needs that `filter` does not cover.
#[must_use]
pub fn uncovered(filter: &EventFilter, kind: ComponentKind) -> Vec<&'static str> {
    required_actions(kind)
        .iter()
        .copied()
        .filter(|action| !filter.contains(action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONDITIONAL: [ComponentKind; 4] = [
        ComponentKind::FingerprintLauncher,
        ComponentKind::GpsMonitor,
        ComponentKind::SubscriptionManager,
        ComponentKind::TunerManager,
    ];

    #[test]
    fn test_base_set_contents() {
        let base = base();

        assert_eq!(base.len(), 15);
        assert_eq!(base.iter().next(), Some(actions::CONFIGURATION_CHANGED));
        assert!(base.contains(actions::BATTERY_CHANGED));
        assert!(base.contains(actions::QUIET_HOURS_CHANGED));
        assert!(base.contains(actions::SHOW_APP_LAUNCHER));
        assert!(base.contains(actions::LOCKSCREEN_SETTINGS_CHANGED));
        assert!(!base.contains(actions::USER_PRESENT));
        assert!(!base.contains(actions::GET_TUNEABLES));
    }

    #[test]
    fn test_all_conditional_combinations() {
        let base = base();

        for mask in 0u8..16 {
            let active: Vec<ComponentKind> = CONDITIONAL
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, kind)| *kind)
                .collect();

            let set = assemble(|kind| active.contains(&kind));

            let mut expected = base.clone();
            for kind in &active {
                for action in required_actions(*kind) {
                    expected.add_action(*action);
                }
            }
            assert_eq!(set, expected, "mask={mask:04b}");

            for kind in CONDITIONAL {
                let covered = uncovered(&set, kind).is_empty();
                assert_eq!(covered, active.contains(&kind), "mask={mask:04b} kind={}", kind.name());
            }

            let extra: usize = active.iter().map(|k| required_actions(*k).len()).sum();
            assert_eq!(set.len(), base.len() + extra, "mask={mask:04b}");
        }
    }

    #[test]
    fn test_base_rows_ignore_slot_state() {
        // A failed always-on component still has its actions subscribed.
        let set = assemble(|kind| kind != ComponentKind::BatteryInfo);
        assert!(set.contains(actions::BATTERY_CHANGED));
    }

    #[test]
    fn test_required_actions_for_unrouted_kinds() {
        assert!(required_actions(ComponentKind::IconManager).is_empty());
        assert!(required_actions(ComponentKind::PackageManager).is_empty());
        assert!(uncovered(&EventFilter::new(), ComponentKind::NotificationData).is_empty());
    }

    #[test]
    fn test_uncovered_reports_missing_actions() {
        let filter = EventFilter::actions([actions::USER_PRESENT]);
        assert_eq!(
            uncovered(&filter, ComponentKind::FingerprintLauncher),
            vec![actions::FPL_SETTINGS_CHANGED]
        );
    }
}
