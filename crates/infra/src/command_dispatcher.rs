//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command(s)
//!   ↓
//! 1. Load events from store
//!   ↓
//! 2. Rehydrate aggregate (apply historical events)
//!   ↓
//! 3. Handle + apply each command on the working copy
//!   ↓
//! 4. Append all decided events once (optimistic concurrency check)
//! ```
//!
//! A batch either commits entirely or not at all: the first rejected command
//! aborts the batch before anything reaches the store.
//!
//! This module contains no IO itself; it composes the `EventStore` trait.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use tradepost_core::{Aggregate, AggregateId, DomainError, Event, ExpectedVersion};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A business rule rejected the command (deterministic).
    #[error(transparent)]
    Domain(DomainError),
    /// Optimistic concurrency failure (stale aggregate version).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),
    /// Historical payloads could not be turned back into aggregate events.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
    /// Loading or persisting through the event store failed.
    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Domain(other),
        }
    }
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone)]
pub struct Dispatched<A: Aggregate> {
    /// Aggregate state after every decided event was applied.
    pub aggregate: A,
    /// Typed events in the order they were decided.
    pub events: Vec<A::Event>,
    /// The same events as persisted (with sequence numbers).
    pub committed: Vec<StoredEvent>,
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Domain code stays pure; the dispatcher is the only place that talks to
/// the store. Aggregates must be deterministic in `apply` and bump their
/// version once per event so that `version()` equals the stream revision.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> CommandDispatcher<S>
where
    S: EventStore,
{
    /// Rehydrate an aggregate from its stream.
    ///
    /// An unknown stream yields the fresh instance from `make_aggregate`
    /// (version 0).
    pub fn load<A>(
        &self,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history(&mut aggregate, &history)?;
        Ok(aggregate)
    }

    /// Persist already-decided events against an expected stream version.
    pub fn commit<E>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        events: &[E],
        expected: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        E: Event + Serialize,
    {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let uncommitted = events
            .iter()
            .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.store.append(uncommitted, expected)?)
    }

    /// Dispatch a single command.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: Event + Serialize + DeserializeOwned,
    {
        self.dispatch_all(aggregate_id, aggregate_type, vec![command], make_aggregate)
    }

    /// Dispatch several commands against one aggregate and commit them as a
    /// single batch.
    pub fn dispatch_all<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        commands: Vec<A::Command>,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: Event + Serialize + DeserializeOwned,
    {
        let mut aggregate = self.load(aggregate_id, make_aggregate)?;
        let expected = ExpectedVersion::Exact(aggregate.version());

        let mut events = Vec::new();
        for command in &commands {
            events.extend(aggregate.execute(command)?);
        }

        let committed = self.commit(aggregate_id, aggregate_type, &events, expected)?;

        Ok(Dispatched {
            aggregate,
            events,
            committed,
        })
    }
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    // Sequence numbers must be contiguous from 1 so version() matches the revision.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number != last + 1 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-contiguous sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = stored.decode().map_err(|e| {
            DispatchError::Deserialize(format!("{} #{}: {e}", stored.event_type, stored.sequence_number))
        })?;
        aggregate.apply(&ev);
    }

    Ok(())
}
