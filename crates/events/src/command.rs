use gemledger_core::AggregateId;

/// A command targets a specific aggregate.
///
/// Commands are intent ("sell 2.5 ct from LOT-2025-001"); events are the facts
/// that result once the aggregate accepts them. Invalid commands are rejected
/// and produce no events.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
