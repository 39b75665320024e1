use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use gemledger_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult};
use gemledger_events::{Command, Event, execute};

use crate::transaction::{LotTransaction, TransactionKind};

/// Float noise allowed when comparing carat balances for sale limits and status.
const CARAT_NOISE: f64 = 1e-9;

/// Lot identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub AggregateId);

impl LotId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Derived lifecycle status. Never stored; always computed from the balance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    /// Nothing has left the lot.
    New,
    /// Partially sold.
    Active,
    /// Fully depleted.
    Completed,
}

/// Aggregate root: Lot.
///
/// `remaining_carats` is the recorded balance shown to users. It is kept in step
/// with the transaction history by `apply`, but can diverge through physical
/// counts or imported records; see `reconciliation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lot {
    id: LotId,
    code: String,
    total_carats: f64,
    remaining_carats: f64,
    date_received: Option<NaiveDate>,
    source: String,
    initial_value: u64,
    handler: String,
    notes: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    transactions: Vec<LotTransaction>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

/// Snapshot of a lot as held by an external record (import/export).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotRecord {
    pub id: LotId,
    pub code: String,
    pub total_carats: f64,
    pub remaining_carats: f64,
    pub date_received: NaiveDate,
    pub source: String,
    pub initial_value: u64,
    pub handler: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub transactions: Vec<LotTransaction>,
}

impl Lot {
    /// Create an empty, not-yet-received aggregate instance for rehydration.
    pub fn empty(id: LotId) -> Self {
        Self {
            id,
            code: String::new(),
            total_carats: 0.0,
            remaining_carats: 0.0,
            date_received: None,
            source: String::new(),
            initial_value: 0,
            handler: String::new(),
            notes: None,
            last_modified: None,
            transactions: Vec::new(),
            version: 0,
            created: false,
        }
    }

    /// Receive a new lot (`remaining = total`).
    pub fn receive(cmd: ReceiveLot) -> DomainResult<Self> {
        let mut lot = Lot::empty(cmd.lot_id);
        execute(&mut lot, &LotCommand::ReceiveLot(cmd))?;
        Ok(lot)
    }

    /// Rebuild a lot from an external record, taking its recorded balance as-is.
    ///
    /// History is not replayed, so an imported record may carry a discrepancy.
    pub fn restore(record: LotRecord) -> DomainResult<Self> {
        if !(record.total_carats.is_finite() && record.total_carats > 0.0) {
            return Err(DomainError::validation("total carats must be positive"));
        }
        if !record.remaining_carats.is_finite() {
            return Err(DomainError::validation("remaining carats must be a number"));
        }
        Ok(Self {
            id: record.id,
            code: record.code,
            total_carats: record.total_carats,
            remaining_carats: record.remaining_carats,
            date_received: Some(record.date_received),
            source: record.source,
            initial_value: record.initial_value,
            handler: record.handler,
            notes: record.notes,
            last_modified: Some(record.last_modified),
            transactions: record.transactions,
            version: 0,
            created: true,
        })
    }

    /// Record a sale, return or transfer.
    ///
    /// A sale larger than the remaining balance is rejected; on any error the
    /// lot is unchanged.
    pub fn record_transaction(
        &mut self,
        transaction: LotTransaction,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<&Lot> {
        let cmd = LotCommand::RecordTransaction(RecordTransaction {
            lot_id: self.id,
            transaction,
            occurred_at,
        });
        execute(self, &cmd)?;
        Ok(self)
    }

    pub fn id_typed(&self) -> LotId {
        self.id
    }

    pub fn is_received(&self) -> bool {
        self.created
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn total_carats(&self) -> f64 {
        self.total_carats
    }

    pub fn remaining_carats(&self) -> f64 {
        self.remaining_carats
    }

    pub fn date_received(&self) -> Option<NaiveDate> {
        self.date_received
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn initial_value(&self) -> u64 {
        self.initial_value
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn transactions(&self) -> &[LotTransaction] {
        &self.transactions
    }

    pub fn status(&self) -> LotStatus {
        if self.remaining_carats <= CARAT_NOISE {
            LotStatus::Completed
        } else if (self.remaining_carats - self.total_carats).abs() <= CARAT_NOISE {
            LotStatus::New
        } else {
            LotStatus::Active
        }
    }

    /// Remaining share of the nominal total, rounded to a whole percent.
    pub fn percent_remaining(&self) -> u32 {
        if self.total_carats <= 0.0 {
            return 0;
        }
        (self.remaining_carats / self.total_carats * 100.0).round().max(0.0) as u32
    }

    pub fn sold_carats(&self) -> f64 {
        self.carats_of(TransactionKind::Sale)
    }

    pub fn returned_carats(&self) -> f64 {
        self.carats_of(TransactionKind::Return)
    }

    pub fn transferred_carats(&self) -> f64 {
        self.carats_of(TransactionKind::Transfer)
    }

    fn carats_of(&self, kind: TransactionKind) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.carats)
            .sum()
    }
}

impl AggregateRoot for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ReceiveLot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveLot {
    pub lot_id: LotId,
    pub code: String,
    pub total_carats: f64,
    pub date_received: NaiveDate,
    pub source: String,
    /// Purchase value in smallest currency unit.
    pub initial_value: u64,
    pub handler: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordTransaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTransaction {
    pub lot_id: LotId,
    pub transaction: LotTransaction,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPhysicalCount (manual override of the recorded balance).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPhysicalCount {
    pub lot_id: LotId,
    pub remaining_carats: f64,
    pub handler: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LotCommand {
    ReceiveLot(ReceiveLot),
    RecordTransaction(RecordTransaction),
    RecordPhysicalCount(RecordPhysicalCount),
}

impl Command for LotCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            LotCommand::ReceiveLot(c) => c.lot_id.0,
            LotCommand::RecordTransaction(c) => c.lot_id.0,
            LotCommand::RecordPhysicalCount(c) => c.lot_id.0,
        }
    }
}

/// Event: LotReceived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotReceived {
    pub lot_id: LotId,
    pub code: String,
    pub total_carats: f64,
    pub date_received: NaiveDate,
    pub source: String,
    pub initial_value: u64,
    pub handler: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionRecorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecorded {
    pub lot_id: LotId,
    pub transaction: LotTransaction,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PhysicalCountRecorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCountRecorded {
    pub lot_id: LotId,
    pub previous_carats: f64,
    pub remaining_carats: f64,
    pub handler: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LotEvent {
    LotReceived(LotReceived),
    TransactionRecorded(TransactionRecorded),
    PhysicalCountRecorded(PhysicalCountRecorded),
}

impl Event for LotEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LotEvent::LotReceived(_) => "lots.lot.received",
            LotEvent::TransactionRecorded(_) => "lots.lot.transaction_recorded",
            LotEvent::PhysicalCountRecorded(_) => "lots.lot.physical_count_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LotEvent::LotReceived(e) => e.occurred_at,
            LotEvent::TransactionRecorded(e) => e.occurred_at,
            LotEvent::PhysicalCountRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Lot {
    type Command = LotCommand;
    type Event = LotEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LotEvent::LotReceived(e) => {
                self.id = e.lot_id;
                self.code = e.code.clone();
                self.total_carats = e.total_carats;
                self.remaining_carats = e.total_carats;
                self.date_received = Some(e.date_received);
                self.source = e.source.clone();
                self.initial_value = e.initial_value;
                self.handler = e.handler.clone();
                self.notes = e.notes.clone();
                self.created = true;
            }
            LotEvent::TransactionRecorded(e) => {
                let tx = &e.transaction;
                self.remaining_carats += tx.kind.carat_effect(tx.carats);
                self.transactions.push(tx.clone());
            }
            LotEvent::PhysicalCountRecorded(e) => {
                self.remaining_carats = e.remaining_carats;
            }
        }

        self.last_modified = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LotCommand::ReceiveLot(cmd) => self.handle_receive(cmd),
            LotCommand::RecordTransaction(cmd) => self.handle_record(cmd),
            LotCommand::RecordPhysicalCount(cmd) => self.handle_count(cmd),
        }
    }
}

impl Lot {
    fn ensure_lot_id(&self, lot_id: LotId) -> Result<(), DomainError> {
        if self.id != lot_id {
            return Err(DomainError::invariant("lot_id mismatch"));
        }
        Ok(())
    }

    fn handle_receive(&self, cmd: &ReceiveLot) -> Result<Vec<LotEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("lot already received"));
        }
        self.ensure_lot_id(cmd.lot_id)?;

        if cmd.code.trim().is_empty() {
            return Err(DomainError::validation("lot code cannot be empty"));
        }
        if !(cmd.total_carats.is_finite() && cmd.total_carats >= 0.01) {
            return Err(DomainError::validation("minimum carat weight is 0.01"));
        }
        if cmd.source.trim().is_empty() {
            return Err(DomainError::validation("source/vendor is required"));
        }
        if cmd.handler.trim().is_empty() {
            return Err(DomainError::validation("handler is required"));
        }

        Ok(vec![LotEvent::LotReceived(LotReceived {
            lot_id: cmd.lot_id,
            code: cmd.code.clone(),
            total_carats: cmd.total_carats,
            date_received: cmd.date_received,
            source: cmd.source.clone(),
            initial_value: cmd.initial_value,
            handler: cmd.handler.clone(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record(&self, cmd: &RecordTransaction) -> Result<Vec<LotEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_lot_id(cmd.lot_id)?;

        let tx = &cmd.transaction;
        tx.validate()?;

        if self.transactions.iter().any(|t| t.id == tx.id) {
            return Err(DomainError::conflict(format!(
                "transaction {} already recorded",
                tx.id
            )));
        }

        if tx.kind == TransactionKind::Sale && tx.carats - self.remaining_carats > CARAT_NOISE {
            return Err(DomainError::validation(format!(
                "cannot sell more than the remaining {} carats",
                self.remaining_carats
            )));
        }

        Ok(vec![LotEvent::TransactionRecorded(TransactionRecorded {
            lot_id: cmd.lot_id,
            transaction: tx.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_count(&self, cmd: &RecordPhysicalCount) -> Result<Vec<LotEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_lot_id(cmd.lot_id)?;

        if !(cmd.remaining_carats.is_finite() && cmd.remaining_carats >= 0.0) {
            return Err(DomainError::validation("counted carats must be zero or more"));
        }
        if cmd.handler.trim().is_empty() {
            return Err(DomainError::validation("handler is required"));
        }

        Ok(vec![LotEvent::PhysicalCountRecorded(PhysicalCountRecorded {
            lot_id: cmd.lot_id,
            previous_carats: self.remaining_carats,
            remaining_carats: cmd.remaining_carats,
            handler: cmd.handler.clone(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
