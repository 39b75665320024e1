//! Lot module: bulk carat lots and their sale/return/transfer ledger
//! (event-sourced).
//!
//! Pure domain logic only: no IO, no persistence concerns. Reconciliation is
//! advisory; nothing here ever rewrites a lot's recorded balance on its own.

pub mod lot;
pub mod reconciliation;
pub mod summary;
pub mod transaction;

pub use lot::{
    Lot, LotCommand, LotEvent, LotId, LotReceived, LotRecord, LotStatus, PhysicalCountRecorded,
    ReceiveLot, RecordPhysicalCount, RecordTransaction, TransactionRecorded,
};
pub use reconciliation::{
    DISCREPANCY_EPSILON, DiscrepancyReport, audit, compute_expected_remaining, has_discrepancy,
    has_discrepancy_within, reconcile,
};
pub use summary::{LotFilter, LotSummary, StatusFilter, generate_lot_code};
pub use transaction::{LotTransaction, TransactionId, TransactionKind};
