use gemledger_infra::{InMemoryStore, LotService, MatchingService, Settings};
use gemledger_lots::{Lot, LotId};
use gemledger_stones::{Diamond, DiamondId};

fn main() -> anyhow::Result<()> {
    gemledger_observability::init();

    let settings = Settings::from_env()?;
    tracing::info!(
        discrepancy_epsilon = settings.discrepancy_epsilon,
        carat_tolerance = settings.default_criteria.carat_tolerance,
        min_set_size = settings.default_criteria.min_set_size,
        "settings loaded"
    );

    let lots = LotService::with_epsilon(
        InMemoryStore::<LotId, Lot>::new(),
        settings.discrepancy_epsilon,
    );
    let matching = MatchingService::new(
        InMemoryStore::<DiamondId, Diamond>::new(),
        settings.default_criteria.clone(),
    )?;

    gemledger_cli::demo::seed(&lots, &matching)?;
    let report = gemledger_cli::build_report(&settings, &lots, &matching)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
