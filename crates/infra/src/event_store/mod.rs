//! Append-only event store boundary.
//!
//! Player streams are keyed by aggregate id. The trait makes no storage
//! assumptions; the in-memory implementation backs tests and the simulator.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
