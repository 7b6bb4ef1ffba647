//! Shared record types.

pub mod outcome;
pub mod usage_metrics;

pub use outcome::GenerationOutcome;
pub use usage_metrics::MetricsRecord;
