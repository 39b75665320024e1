use serde::Serialize;

use gemledger_infra::{KeyedStore, LotService, MatchingService, Settings};
use gemledger_lots::{DiscrepancyReport, Lot, LotId, LotStatus, LotSummary};
use gemledger_stones::{Diamond, DiamondId, MatchedSet};

/// One row of the lot table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotLine {
    pub code: String,
    pub source: String,
    pub handler: String,
    pub status: LotStatus,
    pub total_carats: f64,
    pub remaining_carats: f64,
    pub percent_remaining: u32,
    pub transactions: usize,
}

impl From<&Lot> for LotLine {
    fn from(lot: &Lot) -> Self {
        Self {
            code: lot.code().to_string(),
            source: lot.source().to_string(),
            handler: lot.handler().to_string(),
            status: lot.status(),
            total_carats: lot.total_carats(),
            remaining_carats: lot.remaining_carats(),
            percent_remaining: lot.percent_remaining(),
            transactions: lot.transactions().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    pub settings: Settings,
    pub summary: LotSummary,
    pub lots: Vec<LotLine>,
    pub discrepancies: Vec<DiscrepancyReport>,
    pub matched_sets: Vec<MatchedSet>,
    /// Best-scoring set, preselected.
    pub selected_set: Option<String>,
}

pub fn build_report<L, D>(
    settings: &Settings,
    lots: &LotService<L>,
    matching: &MatchingService<D>,
) -> anyhow::Result<InventoryReport>
where
    L: KeyedStore<LotId, Lot>,
    D: KeyedStore<DiamondId, Diamond>,
{
    let session = matching.search_session()?;

    Ok(InventoryReport {
        settings: settings.clone(),
        summary: lots.summary(),
        lots: lots.list().iter().map(LotLine::from).collect(),
        discrepancies: lots.audit(),
        matched_sets: session.sets().to_vec(),
        selected_set: session.selected_set().map(|s| s.id.clone()),
    })
}
