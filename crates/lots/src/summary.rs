//! Lot dashboard helpers: portfolio totals, list filtering, lot codes.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::lot::Lot;

/// Totals across a set of lots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LotSummary {
    pub total_lots: usize,
    pub total_carats: f64,
    pub sold_carats: f64,
    pub returned_carats: f64,
    /// Sum of recorded balances (not the expected ones).
    pub remaining_carats: f64,
    /// Sum of purchase values, smallest currency unit.
    pub total_value: u64,
}

impl LotSummary {
    pub fn from_lots<'a>(lots: impl IntoIterator<Item = &'a Lot>) -> Self {
        lots.into_iter().fold(LotSummary::default(), |mut s, lot| {
            s.total_lots += 1;
            s.total_carats += lot.total_carats();
            s.sold_carats += lot.sold_carats();
            s.returned_carats += lot.returned_carats();
            s.remaining_carats += lot.remaining_carats();
            s.total_value += lot.initial_value();
            s
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusFilter {
    #[default]
    All,
    /// Some carats left.
    Active,
    /// Nothing left.
    Completed,
}

/// Lot list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LotFilter {
    #[serde(default)]
    pub status: StatusFilter,
    /// Exact handler name.
    #[serde(default)]
    pub handler: Option<String>,
    /// Case-insensitive match on lot code, source or handler.
    #[serde(default)]
    pub search: Option<String>,
}

impl LotFilter {
    pub fn matches(&self, lot: &Lot) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [lot.code(), lot.source(), lot.handler()]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        match self.status {
            StatusFilter::All => {}
            StatusFilter::Active if lot.remaining_carats() <= 0.0 => return false,
            StatusFilter::Completed if lot.remaining_carats() > 0.0 => return false,
            _ => {}
        }

        if let Some(handler) = &self.handler {
            if lot.handler() != handler {
                return false;
            }
        }

        true
    }

    /// Matching lots in input order, at most `limit` of them.
    pub fn apply<'a>(&self, lots: &'a [Lot], limit: Option<usize>) -> Vec<&'a Lot> {
        lots.iter()
            .filter(|lot| self.matches(lot))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Next lot code for the month: `LOT-YYYY-MM-NNN`, NNN = `existing_lots + 1`.
pub fn generate_lot_code(date: NaiveDate, existing_lots: usize) -> String {
    format!(
        "LOT-{}-{:02}-{:03}",
        date.year(),
        date.month(),
        existing_lots + 1
    )
}
