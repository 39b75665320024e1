//! Append-only event journal, one stream per aggregate.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use gemledger_core::{AggregateId, ExpectedVersion};
use gemledger_events::{Event, EventEnvelope};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("failed to serialize event: {0}")]
    Serialize(String),

    #[error("journal lock poisoned")]
    Poisoned,
}

/// In-memory append-only journal.
///
/// Sequence numbers start at 1 and increase by one per event within a stream;
/// a stream's version is the sequence number of its last event (0 when empty).
#[derive(Debug, Default)]
pub struct LotJournal {
    streams: RwLock<HashMap<AggregateId, Vec<EventEnvelope<JsonValue>>>>,
}

impl LotJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[EventEnvelope<JsonValue>]) -> u64 {
        stream.last().map(|e| e.sequence_number()).unwrap_or(0)
    }

    /// Append `events` to the stream if it is at `expected_version`.
    pub fn append<E>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        events: &[E],
        expected_version: ExpectedVersion,
    ) -> Result<Vec<EventEnvelope<JsonValue>>, JournalError>
    where
        E: Event + Serialize,
    {
        if events.is_empty() {
            return Ok(vec![]);
        }

        // Serialize before taking the lock; a bad payload must not leave a partial append.
        let payloads = events
            .iter()
            .map(|e| {
                serde_json::to_value(e)
                    .map(|p| (e.event_type(), p))
                    .map_err(|err| JournalError::Serialize(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut streams = self.streams.write().map_err(|_| JournalError::Poisoned)?;
        let stream = streams.entry(aggregate_id).or_default();
        let current = Self::current_version(stream);

        if !expected_version.matches(current) {
            return Err(JournalError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let mut committed = Vec::with_capacity(payloads.len());
        for (offset, (event_type, payload)) in payloads.into_iter().enumerate() {
            let envelope = EventEnvelope::new(
                Uuid::now_v7(),
                aggregate_id,
                aggregate_type,
                event_type,
                current + 1 + offset as u64,
                payload,
            );
            stream.push(envelope.clone());
            committed.push(envelope);
        }

        Ok(committed)
    }

    pub fn load_stream(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope<JsonValue>>, JournalError> {
        let streams = self.streams.read().map_err(|_| JournalError::Poisoned)?;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    pub fn version(&self, aggregate_id: AggregateId) -> Result<u64, JournalError> {
        let streams = self.streams.read().map_err(|_| JournalError::Poisoned)?;
        Ok(streams
            .get(&aggregate_id)
            .map(|s| Self::current_version(s))
            .unwrap_or(0))
    }
}
