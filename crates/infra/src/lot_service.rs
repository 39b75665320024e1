//! Lot application service.
//!
//! Every write goes through one pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the current lot from the store
//!   ↓
//! 2. Check the caller's expected version
//!   ↓
//! 3. Handle command (pure decision logic, produces events)
//!   ↓
//! 4. Append events to the journal (optimistic concurrency check)
//!   ↓
//! 5. Apply events and save the lot back to the store
//! ```
//!
//! Steps 1-5 run under a single write lock, so two sales against the same lot
//! can never both pass the balance check against the same stale `remaining`.
//! A rejected command leaves both store and journal untouched.

use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;

use gemledger_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion};
use gemledger_events::EventEnvelope;
use gemledger_lots::{
    DISCREPANCY_EPSILON, DiscrepancyReport, Lot, LotCommand, LotEvent, LotFilter, LotId,
    LotRecord, LotSummary, LotTransaction, ReceiveLot, RecordPhysicalCount, RecordTransaction,
    audit, generate_lot_code, has_discrepancy_within,
};

use crate::journal::{JournalError, LotJournal};
use crate::store::{KeyedStore, StoreError};

const AGGREGATE_TYPE: &str = "lots.lot";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("lot {0} not found")]
    LotNotFound(LotId),

    #[error("lot {0} already exists")]
    DuplicateLot(LotId),

    /// The lot moved on since the caller read it.
    #[error("lot {lot_id} is at version {actual}, expected {expected:?}")]
    StaleVersion {
        lot_id: LotId,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("failed to replay lot history: {0}")]
    Replay(String),

    #[error("service state lock poisoned")]
    Poisoned,
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Poisoned => ServiceError::Poisoned,
        }
    }
}

impl ServiceError {
    /// Whether the caller can fix the request (as opposed to an infrastructure fault).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::Domain(_)
                | ServiceError::LotNotFound(_)
                | ServiceError::DuplicateLot(_)
                | ServiceError::StaleVersion { .. }
        )
    }
}

/// Lot use cases over an injected repository and the journal.
#[derive(Debug)]
pub struct LotService<S> {
    store: S,
    journal: LotJournal,
    write_lock: Mutex<()>,
    epsilon: f64,
}

impl<S> LotService<S>
where
    S: KeyedStore<LotId, Lot>,
{
    pub fn new(store: S) -> Self {
        Self::with_epsilon(store, DISCREPANCY_EPSILON)
    }

    pub fn with_epsilon(store: S, epsilon: f64) -> Self {
        Self {
            store,
            journal: LotJournal::new(),
            write_lock: Mutex::new(()),
            epsilon,
        }
    }

    pub fn journal(&self) -> &LotJournal {
        &self.journal
    }

    /// Receive a new lot; its remaining balance starts at the total.
    pub fn receive_lot(&self, cmd: ReceiveLot) -> Result<Lot, ServiceError> {
        let _guard = self.write_lock.lock().map_err(|_| ServiceError::Poisoned)?;

        let lot_id = cmd.lot_id;
        if self.store.get(&lot_id).is_some() {
            return Err(ServiceError::DuplicateLot(lot_id));
        }

        let lot = self.commit(Lot::empty(lot_id), &LotCommand::ReceiveLot(cmd))?;
        tracing::info!(
            lot_id = %lot_id,
            code = lot.code(),
            total_carats = lot.total_carats(),
            "lot received"
        );
        Ok(lot)
    }

    /// Take over a lot held elsewhere with its recorded balance as-is.
    ///
    /// The journal stream for an imported lot starts empty.
    pub fn import(&self, record: LotRecord) -> Result<Lot, ServiceError> {
        let _guard = self.write_lock.lock().map_err(|_| ServiceError::Poisoned)?;

        let lot_id = record.id;
        if self.store.get(&lot_id).is_some() {
            return Err(ServiceError::DuplicateLot(lot_id));
        }

        let lot = Lot::restore(record)?;
        if has_discrepancy_within(&lot, self.epsilon) {
            tracing::warn!(lot_id = %lot_id, code = lot.code(), "imported lot does not reconcile");
        }
        self.store.upsert(lot_id, lot.clone())?;
        tracing::debug!(lot_id = %lot_id, code = lot.code(), "lot imported");
        Ok(lot)
    }

    /// Record a sale, return or transfer against a lot.
    pub fn record_transaction(
        &self,
        lot_id: LotId,
        expected: ExpectedVersion,
        transaction: LotTransaction,
    ) -> Result<Lot, ServiceError> {
        let kind = transaction.kind;
        let carats = transaction.carats;
        let cmd = LotCommand::RecordTransaction(RecordTransaction {
            lot_id,
            transaction,
            occurred_at: Utc::now(),
        });

        let lot = self.execute(lot_id, expected, &cmd)?;
        tracing::info!(
            lot_id = %lot_id,
            kind = ?kind,
            carats,
            remaining_carats = lot.remaining_carats(),
            "lot transaction recorded"
        );
        Ok(lot)
    }

    /// Overwrite the recorded balance with a physical count.
    pub fn record_physical_count(
        &self,
        lot_id: LotId,
        expected: ExpectedVersion,
        remaining_carats: f64,
        handler: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Lot, ServiceError> {
        let cmd = LotCommand::RecordPhysicalCount(RecordPhysicalCount {
            lot_id,
            remaining_carats,
            handler: handler.into(),
            notes,
            occurred_at: Utc::now(),
        });

        let lot = self.execute(lot_id, expected, &cmd)?;
        tracing::info!(lot_id = %lot_id, remaining_carats, "physical count recorded");
        Ok(lot)
    }

    pub fn get(&self, lot_id: LotId) -> Option<Lot> {
        self.store.get(&lot_id)
    }

    /// All lots ordered by code.
    pub fn list(&self) -> Vec<Lot> {
        let mut lots = self.store.list();
        lots.sort_by(|a, b| a.code().cmp(b.code()));
        lots
    }

    pub fn filter(&self, filter: &LotFilter, limit: Option<usize>) -> Vec<Lot> {
        let lots = self.list();
        filter.apply(&lots, limit).into_iter().cloned().collect()
    }

    pub fn summary(&self) -> LotSummary {
        LotSummary::from_lots(&self.list())
    }

    /// Reconcile every lot; each discrepancy is also logged.
    pub fn audit(&self) -> Vec<DiscrepancyReport> {
        let lots = self.list();
        let reports = audit(&lots, self.epsilon);

        for report in &reports {
            tracing::warn!(
                lot_id = %report.lot_id,
                code = %report.code,
                recorded = report.recorded,
                expected = report.expected,
                difference = report.difference,
                "lot balance needs reconciliation"
            );
        }
        tracing::info!(lots = lots.len(), discrepancies = reports.len(), "lot audit finished");

        reports
    }

    /// Code for the next lot received on `date`.
    pub fn next_lot_code(&self, date: chrono::NaiveDate) -> String {
        generate_lot_code(date, self.store.len())
    }

    pub fn history(&self, lot_id: LotId) -> Result<Vec<EventEnvelope<JsonValue>>, ServiceError> {
        Ok(self.journal.load_stream(lot_id.0)?)
    }

    /// Rebuild a received lot from its journal alone.
    ///
    /// Imported lots have no `LotReceived` event, so their streams cannot be
    /// replayed and give `ServiceError::Replay`.
    pub fn replay(&self, lot_id: LotId) -> Result<Lot, ServiceError> {
        let history = self.history(lot_id)?;
        if history.is_empty() {
            return Err(ServiceError::LotNotFound(lot_id));
        }

        let mut lot = Lot::empty(lot_id);
        let mut expected_seq = 1u64;
        for envelope in history {
            if envelope.aggregate_id() != lot_id.0 {
                return Err(ServiceError::Replay(format!(
                    "stream for lot {lot_id} contains event for {}",
                    envelope.aggregate_id()
                )));
            }
            if envelope.sequence_number() != expected_seq {
                return Err(ServiceError::Replay(format!(
                    "non-contiguous sequence number (expected {expected_seq}, got {})",
                    envelope.sequence_number()
                )));
            }
            let event: LotEvent = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| ServiceError::Replay(e.to_string()))?;
            if expected_seq == 1 && !matches!(event, LotEvent::LotReceived(_)) {
                return Err(ServiceError::Replay(format!(
                    "stream for lot {lot_id} starts with {} instead of a received event",
                    envelope.event_type()
                )));
            }
            lot.apply(&event);
            expected_seq += 1;
        }

        if !lot.is_received() {
            return Err(ServiceError::Replay(format!(
                "lot {lot_id} was never received in its journal"
            )));
        }

        Ok(lot)
    }

    fn execute(
        &self,
        lot_id: LotId,
        expected: ExpectedVersion,
        cmd: &LotCommand,
    ) -> Result<Lot, ServiceError> {
        let _guard = self.write_lock.lock().map_err(|_| ServiceError::Poisoned)?;

        let lot = self
            .store
            .get(&lot_id)
            .ok_or(ServiceError::LotNotFound(lot_id))?;

        let actual = lot.version();
        if !expected.matches(actual) {
            return Err(ServiceError::StaleVersion {
                lot_id,
                expected,
                actual,
            });
        }

        self.commit(lot, cmd)
    }

    /// Decide, journal, apply, save. Caller holds the write lock.
    fn commit(&self, mut lot: Lot, cmd: &LotCommand) -> Result<Lot, ServiceError> {
        let lot_id = lot.id_typed();
        let events = lot.handle(cmd).inspect_err(|e| {
            tracing::debug!(lot_id = %lot_id, error = %e, "lot command rejected");
        })?;

        // Imported lots start at version 0 with an empty stream, so the lot
        // version and the stream version always agree.
        self.journal.append(
            lot_id.0,
            AGGREGATE_TYPE,
            &events,
            ExpectedVersion::Exact(lot.version()),
        )?;

        for event in &events {
            lot.apply(event);
        }
        self.store.upsert(lot_id, lot.clone()).inspect_err(|_| {
            tracing::error!(lot_id = %lot_id, "lot journaled but not saved");
        })?;

        Ok(lot)
    }
}
