//! # SysUI Bus - Filtered Broadcast Event Source
//!
//! The environment side of the runtime: a publish mechanism where receivers
//! register once with an action filter and get a synchronous callback per
//! matching event.
//!
//! ```text
//! ┌──────────────┐   publish()    ┌──────────────┐   on_receive()   ┌──────────────┐
//! │    Host      │ ─────────────► │  Event Bus   │ ───────────────► │  Receiver    │
//! │ (publisher)  │                │ (filters by  │                  │ (dispatcher) │
//! └──────────────┘                │   action)    │                  └──────────────┘
//!                                 └──────────────┘
//! ```
//!
//! ## Delivery Rules
//!
//! - Delivery is synchronous, on the publisher's thread.
//! - Receivers are called in registration order.
//! - A receiver error stops delivery of that event and is returned to the
//!   publisher as a [`DeliveryError`].
//! - Dropping a [`Subscription`] unregisters its receiver.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{actions, BroadcastEvent, EventFilter};
pub use publisher::{EventSource, InMemoryEventBus};
pub use subscriber::{BroadcastReceiver, DeliveryError, ReceiveResult, Subscription};
