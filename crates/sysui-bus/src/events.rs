//! # Broadcast Events
//!
//! Defines the event shape that flows through the bus and the action filter
//! receivers register with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known broadcast actions.
///
/// Platform actions keep their platform names; runtime-private actions use the
/// `sysui.intent.action.` prefix.
pub mod actions {
    // =========================================================================
    // PLATFORM
    // =========================================================================
    pub const CONFIGURATION_CHANGED: &str = "android.intent.action.CONFIGURATION_CHANGED";
    pub const BATTERY_CHANGED: &str = "android.intent.action.BATTERY_CHANGED";
    pub const POWER_SAVE_MODE_CHANGING: &str = "android.os.action.POWER_SAVE_MODE_CHANGING";
    pub const TIME_TICK: &str = "android.intent.action.TIME_TICK";
    pub const TIME_SET: &str = "android.intent.action.TIME_SET";
    pub const TIMEZONE_CHANGED: &str = "android.intent.action.TIMEZONE_CHANGED";
    pub const SCREEN_ON: &str = "android.intent.action.SCREEN_ON";
    pub const SCREEN_OFF: &str = "android.intent.action.SCREEN_OFF";
    pub const USER_PRESENT: &str = "android.intent.action.USER_PRESENT";
    pub const LOCATION_MODE_CHANGED: &str = "android.location.MODE_CHANGED";
    pub const LOCKED_BOOT_COMPLETED: &str = "android.intent.action.LOCKED_BOOT_COMPLETED";

    // =========================================================================
    // RUNTIME-PRIVATE
    // =========================================================================
    pub const BATTERY_SOUND_CHANGED: &str = "sysui.intent.action.BATTERY_SOUND_CHANGED";
    pub const LOW_BATTERY_WARNING_POLICY_CHANGED: &str =
        "sysui.intent.action.LOW_BATTERY_WARNING_POLICY_CHANGED";
    pub const QUIET_HOURS_CHANGED: &str = "sysui.intent.action.QUIET_HOURS_CHANGED";
    pub const APP_LAUNCHER_CHANGED: &str = "sysui.intent.action.APP_LAUNCHER_CHANGED";
    pub const SHOW_APP_LAUNCHER: &str = "sysui.intent.action.SHOW_APP_LAUNCHER";
    pub const POWER_CHANGED: &str = "sysui.intent.action.POWER_CHANGED";
    pub const LOCKSCREEN_SETTINGS_CHANGED: &str = "sysui.intent.action.LOCKSCREEN_SETTINGS_CHANGED";
    pub const FPL_SETTINGS_CHANGED: &str = "sysui.intent.action.FPL_SETTINGS_CHANGED";
    pub const CHANGE_DEFAULT_SIM_SLOT: &str = "sysui.intent.action.CHANGE_DEFAULT_SIM_SLOT";
    pub const GET_DEFAULT_SIM_SLOT: &str = "sysui.intent.action.GET_DEFAULT_SIM_SLOT";
    pub const GET_TUNEABLES: &str = "sysui.intent.action.GET_TUNEABLES";
}

/// An event delivered by the environment: an action plus opaque extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    /// The action identifier used for filtering.
    pub action: String,
    /// Opaque payload. The bus never inspects it.
    #[serde(default)]
    pub extras: Map<String, Value>,
}

impl BroadcastEvent {
    /// Create an event with no extras.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: Map::new(),
        }
    }

    /// Attach an extra to the event.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Get the action of this event.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Look up an extra by key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }
}

/// Ordered set of actions a receiver is interested in.
///
/// Insertion order is kept and duplicates are collapsed. An empty filter
/// matches nothing; use [`EventFilter::all`] for a catch-all receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    actions: Vec<String>,
    match_all: bool,
}

impl EventFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter that accepts every action.
    #[must_use]
    pub fn all() -> Self {
        Self {
            actions: Vec::new(),
            match_all: true,
        }
    }

    /// Create a filter for specific actions.
    #[must_use]
    pub fn actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new();
        for action in actions {
            filter.add_action(action);
        }
        filter
    }

    /// Add an action. Returns `false` if it was already present.
    pub fn add_action(&mut self, action: impl Into<String>) -> bool {
        let action = action.into();
        if self.contains(&action) {
            return false;
        }
        self.actions.push(action);
        true
    }

    /// Check whether the action is part of this filter.
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BroadcastEvent) -> bool {
        self.match_all || self.contains(event.action())
    }

    /// Iterate over the actions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }

    /// Number of distinct actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if no action was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// True if this filter accepts every action.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.match_all
    }
}
