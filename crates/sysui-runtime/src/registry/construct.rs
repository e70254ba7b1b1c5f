//! Fault-isolated construction.
//!
//! `try_construct` is the only place component constructors run. Any failure,
//! returned or panicked, ends up as a logged `None`. `try_wire` covers the
//! wiring done right after a component is built. Dispatch does not go through
//! here.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::registry::ComponentKind;
use crate::subsystem::{Subsystem, SubsystemError, SubsystemErrorKind};

/// Run `build` for `kind`, converting every failure into an absent result.
pub(crate) fn try_construct<F>(kind: ComponentKind, build: F) -> Option<Arc<dyn Subsystem>>
where
    F: FnOnce() -> Result<Arc<dyn Subsystem>, SubsystemError>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(result) => result,
        Err(panic_err) => Err(SubsystemError {
            component: kind,
            kind: SubsystemErrorKind::ConstructionPanicked,
            message: panic_message(panic_err.as_ref()),
        }),
    };

    match outcome {
        Ok(component) => {
            debug!(component = kind.name(), "Component created");
            Some(component)
        }
        Err(e) => {
            error!(component = kind.name(), error = %e, "Error creating component");
            None
        }
    }
}

/// Run a post-construction wiring step for `kind`, logging a panic instead of
/// unwinding into the construction loop. Returns whether the step completed.
pub(crate) fn try_wire<F>(kind: ComponentKind, wire: F) -> bool
where
    F: FnOnce(),
{
    match panic::catch_unwind(AssertUnwindSafe(wire)) {
        Ok(()) => true,
        Err(panic_err) => {
            error!(
                component = kind.name(),
                error = %panic_message(panic_err.as_ref()),
                "Error wiring component"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
