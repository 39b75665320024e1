//! Carat-ledger reconciliation.
//!
//! A lot's expected balance is `total − Σ sales + Σ returns`; transfers move
//! stones between locations and do not count. When the recorded balance strays
//! from that figure by more than an epsilon the lot is flagged for review. The
//! flag is advisory: reconciliation never rewrites the recorded balance.

use serde::{Deserialize, Serialize};

use crate::lot::{Lot, LotId};

/// Tolerance, in carats, before a balance mismatch counts as a discrepancy.
pub const DISCREPANCY_EPSILON: f64 = 0.01;

/// Balance implied by the full transaction history. Pure.
pub fn compute_expected_remaining(lot: &Lot) -> f64 {
    lot.transactions()
        .iter()
        .fold(lot.total_carats(), |acc, tx| acc + tx.kind.carat_effect(tx.carats))
}

pub fn has_discrepancy(lot: &Lot) -> bool {
    has_discrepancy_within(lot, DISCREPANCY_EPSILON)
}

pub fn has_discrepancy_within(lot: &Lot, epsilon: f64) -> bool {
    (compute_expected_remaining(lot) - lot.remaining_carats()).abs() > epsilon
}

/// A lot whose recorded balance disagrees with its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub lot_id: LotId,
    pub code: String,
    pub recorded: f64,
    pub expected: f64,
    /// `recorded − expected`; negative means carats are unaccounted for.
    pub difference: f64,
}

/// `Some(report)` when the lot needs human reconciliation.
pub fn reconcile(lot: &Lot, epsilon: f64) -> Option<DiscrepancyReport> {
    let expected = compute_expected_remaining(lot);
    let recorded = lot.remaining_carats();
    let difference = recorded - expected;

    if difference.abs() <= epsilon {
        return None;
    }

    Some(DiscrepancyReport {
        lot_id: lot.id_typed(),
        code: lot.code().to_string(),
        recorded,
        expected,
        difference,
    })
}

/// Reconcile many lots, keeping only the flagged ones (input order).
pub fn audit<'a>(lots: impl IntoIterator<Item = &'a Lot>, epsilon: f64) -> Vec<DiscrepancyReport> {
    lots.into_iter()
        .filter_map(|lot| reconcile(lot, epsilon))
        .collect()
}
