//! Metrics derivation pipeline.
//!
//! Three stages, strictly leaf-to-root:
//! - [`phases`]: per-issue phase extraction from a normalized history
//! - [`aggregate`]: whole-batch statistics
//! - [`report`]: deterministic narrative summary
//!
//! Each stage is a pure function of its input; nothing mutates upstream
//! data and nothing reads the clock.

pub mod aggregate;
pub mod phases;
pub mod report;

pub use aggregate::aggregate;
pub use phases::{blocked_days, first_entry_into, last_entry_into, time_in_status, was_reopened};
pub use report::{recommendations, render_summary};

use crate::types::{AggregateMetrics, IssueMetrics, IssueRecord, StatusVocabulary};

/// Per-issue and whole-batch metrics for one snapshot.
#[derive(Debug, Clone)]
pub struct BatchMetrics {
    /// Derived metrics per issue, in input order
    pub issues: Vec<IssueMetrics>,
    /// Cross-sprint statistics over the batch
    pub aggregate: AggregateMetrics,
}

/// Run the full derivation over one snapshot of issues.
pub fn compute_batch(records: &[IssueRecord], vocab: &StatusVocabulary) -> BatchMetrics {
    let issues: Vec<IssueMetrics> = records
        .iter()
        .map(|record| IssueMetrics::derive(record, vocab))
        .collect();
    let aggregate = aggregate(&issues);
    BatchMetrics { issues, aggregate }
}
