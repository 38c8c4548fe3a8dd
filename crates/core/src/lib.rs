//! `tradepost-core`: domain building blocks shared by the market engine.
//!
//! Pure domain primitives only: identifiers, the error taxonomy, and the
//! aggregate/event traits. No IO, no logging.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AggregateId, DistributionRecordId, InventoryLineId, ItemId, SnapshotId};
pub use value_object::ValueObject;
