//! Change-notification plumbing.
//!
//! A typed publish/subscribe bus owned by whoever produces the messages (the
//! inventory repository publishes collection snapshots through it) and
//! injected into consumers, instead of an ambient listener list.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
