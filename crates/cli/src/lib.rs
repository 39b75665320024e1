//! Demo inventory and the report printed by the `gemledger` binary.

pub mod demo;
pub mod report;

pub use report::{InventoryReport, LotLine, build_report};
