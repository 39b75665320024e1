use chrono::{DateTime, Utc};

/// A domain event.
///
/// Events are immutable facts (a lot was received, a sale was recorded),
/// versioned for schema evolution and append-only.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "lots.lot.received").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
