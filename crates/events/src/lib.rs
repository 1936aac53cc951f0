//! `tableside-events` — typed publish/subscribe mechanics.
//!
//! Domain-agnostic: the identity layer uses it to carry provider session-change
//! notifications to client-side stores.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
