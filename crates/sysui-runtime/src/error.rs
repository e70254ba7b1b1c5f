//! # Error Types
//!
//! Registry and dispatch errors. Construction failures never show up here:
//! they are logged and leave the slot empty.

use thiserror::Error;

use crate::registry::ComponentKind;
use crate::subsystem::SubsystemError;

/// Errors returned by the registry entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A required argument was absent. Programmer error, raised before any
    /// component is touched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// `init` was already run on this registry.
    #[error("Registry already initialized")]
    AlreadyInitialized,
}

/// A component handler failed while an event was being dispatched.
#[derive(Debug, Clone, Error)]
#[error("Dispatch of {action} failed at {}", .component.name())]
pub struct DispatchError {
    /// The component whose handler failed.
    pub component: ComponentKind,
    /// Action of the event being dispatched.
    pub action: String,
    /// The handler's error.
    #[source]
    pub source: SubsystemError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = RegistryError::InvalidArgument("context cannot be absent");
        assert_eq!(err.to_string(), "Invalid argument: context cannot be absent");
    }

    #[test]
    fn test_dispatch_error_source() {
        let err = DispatchError {
            component: ComponentKind::TunerManager,
            action: "a".to_string(),
            source: SubsystemError::handler(ComponentKind::TunerManager, "oops"),
        };

        assert_eq!(err.to_string(), "Dispatch of a failed at tuner-manager");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "[tuner-manager] HandlerFailed: oops");
    }
}
