//! Bundled demo inventory.

use anyhow::Context;

use gemledger_infra::{KeyedStore, LotService, MatchingService};
use gemledger_lots::{Lot, LotId, LotRecord};
use gemledger_stones::{Diamond, DiamondId};

const LOTS_JSON: &str = include_str!("../data/lots.json");
const DIAMONDS_JSON: &str = include_str!("../data/diamonds.json");

pub fn demo_lots() -> anyhow::Result<Vec<LotRecord>> {
    serde_json::from_str(LOTS_JSON).context("bundled lot data is malformed")
}

pub fn demo_diamonds() -> anyhow::Result<Vec<Diamond>> {
    serde_json::from_str(DIAMONDS_JSON).context("bundled diamond data is malformed")
}

/// Load the demo lots and diamonds into empty services.
pub fn seed<L, D>(lots: &LotService<L>, matching: &MatchingService<D>) -> anyhow::Result<()>
where
    L: KeyedStore<LotId, Lot>,
    D: KeyedStore<DiamondId, Diamond>,
{
    for record in demo_lots()? {
        let code = record.code.clone();
        lots.import(record)
            .with_context(|| format!("failed to import lot {code}"))?;
    }

    let diamonds = demo_diamonds()?;
    let count = diamonds.len();
    for diamond in diamonds {
        let sku = diamond.sku.clone();
        matching
            .add_diamond(diamond)
            .with_context(|| format!("failed to stock diamond {sku}"))?;
    }

    tracing::info!(lots = lots.list().len(), diamonds = count, "demo inventory seeded");
    Ok(())
}
