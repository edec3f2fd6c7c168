//! Core domain types for sprintlens
//!
//! These types form the canonical data model the metrics engine operates
//! on. The boundary decoder in [`crate::ingest`] produces fully-typed
//! [`IssueRecord`]s from raw exported tracker JSON; the engine itself never
//! probes loosely-typed data.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Issue** | A tracked work item (ticket) with a status change history |
//! | **Transition** | One status change: when, from which status, to which |
//! | **Sprint** | A time-boxed iteration; issues carry the id of their most recent sprint |
//! | **Cycle time** | First entry into an in-progress status → completion |
//! | **Lead time** | Creation → resolution, regardless of in-progress tracking |
//! | **Throughput** | Completed issues per sprint (count) |
//! | **Velocity** | Completed size estimates per sprint (sum) |
//! | **Reopen** | An issue leaving a done status after having reached one |
//!
//! Derived structures ([`IssueMetrics`], [`AggregateMetrics`]) are pure
//! functions of an issue snapshot. Nothing here is persisted; everything is
//! recomputed per refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================
// Status transitions
// ============================================

/// A single status change from an issue's change log.
///
/// Immutable once created. Within a normalized history, transitions are
/// ordered by timestamp ascending; equal timestamps keep their original
/// change-log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// When the change happened
    pub at: DateTime<Utc>,
    /// Status the issue left (missing in some exports)
    pub from_status: Option<String>,
    /// Status the issue entered
    pub to_status: Option<String>,
}

impl StatusTransition {
    pub fn new(
        at: DateTime<Utc>,
        from_status: Option<String>,
        to_status: Option<String>,
    ) -> Self {
        Self {
            at,
            from_status,
            to_status,
        }
    }
}

// ============================================
// Issues
// ============================================

/// One tracked work item, decoded from a snapshot.
///
/// Read-only once constructed. The `history` is already normalized:
/// status-field changes only, chronological, malformed entries dropped at
/// the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Stable identifier (e.g., "PROJ-142")
    pub key: String,
    /// When the issue was created
    pub created_at: DateTime<Utc>,
    /// Authoritative completion mark, when the source system supplies one
    pub resolved_at: Option<DateTime<Utc>>,
    /// Size estimate (story points), nonnegative
    pub size_estimate: Option<f64>,
    /// Most-recently-associated sprint id (largest id wins across moves)
    pub sprint_id: Option<i64>,
    /// Assignee display name (presentation only)
    pub assignee: Option<String>,
    /// Issue type name (presentation only)
    pub issue_type: Option<String>,
    /// Normalized status history; may be empty or length 1
    pub history: Vec<StatusTransition>,
}

// ============================================
// Status vocabulary
// ============================================

/// Caller-supplied status-name classification.
///
/// Matching is case-sensitive and exact against a transition's
/// `to_status`. The engine bakes in no defaults: empty or mismatched
/// vocabularies yield undefined phase timestamps rather than errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVocabulary {
    /// Names counting as "work has started"
    pub in_progress: BTreeSet<String>,
    /// Names counting as "work is complete"
    pub done: BTreeSet<String>,
}

impl StatusVocabulary {
    pub fn new<I, J, S>(in_progress: I, done: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            in_progress: in_progress.into_iter().map(Into::into).collect(),
            done: done.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================
// Derived metrics (per issue)
// ============================================

/// Accumulated time-in-status per status name.
///
/// Computed only from consecutive transition pairs; histories with fewer
/// than two transitions yield an empty map. `BTreeMap` keeps iteration
/// deterministic.
pub type PhaseDurations = BTreeMap<String, Duration>;

/// Per-issue derived metrics.
///
/// Day-valued fields are `None` when an endpoint is missing, never
/// negative and never a sentinel number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueMetrics {
    /// Issue key, carried for presentation
    pub key: String,
    /// Sprint attribution, carried from the record
    pub sprint_id: Option<i64>,
    /// Size estimate, carried from the record
    pub size_estimate: Option<f64>,
    /// First transition into any in-progress status
    pub in_progress_at: Option<DateTime<Utc>>,
    /// `resolved_at` if present, else last transition into a done status
    pub done_at: Option<DateTime<Utc>>,
    /// `done_at − in_progress_at` in days
    pub cycle_time_days: Option<f64>,
    /// `resolved_at − created_at` in days
    pub lead_time_days: Option<f64>,
    /// Total days in statuses whose name contains "blocked"
    pub blocked_days: Option<f64>,
    /// Whether the issue left a done status after having reached one
    pub reopened: bool,
}

impl IssueMetrics {
    /// An issue counts as completed when it has a defined completion time.
    pub fn is_completed(&self) -> bool {
        self.done_at.is_some()
    }
}

// ============================================
// Derived metrics (whole batch)
// ============================================

/// Cross-sprint statistics over one issue snapshot.
///
/// Sprint maps are keyed ascending by sprint id; that ordering is the
/// grouping order the narrative summarizer renders. All undefined
/// statistics are `None`, with the single exception of
/// `reopen_rate_pct`, which is exactly `0.0` for a batch with zero
/// completed issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Issues in the batch
    pub issue_count: u64,
    /// Issues with a defined completion time
    pub completed_count: u64,
    /// Mean cycle time over issues with both endpoints
    pub cycle_time_mean_days: Option<f64>,
    /// Sample (n−1) standard deviation; `None` below two data points
    pub cycle_time_stdev_days: Option<f64>,
    /// Mean lead time over issues with creation and resolution
    pub lead_time_mean_days: Option<f64>,
    /// Percentage of completed issues that were reopened
    pub reopen_rate_pct: f64,
    /// Completed-issue count per sprint id
    pub throughput_by_sprint: BTreeMap<i64, u64>,
    /// Summed size estimates per sprint id (missing estimates count as 0)
    pub velocity_by_sprint: BTreeMap<i64, f64>,
    /// Mean of defined per-issue blocked days
    pub blocked_days_mean: Option<f64>,
    /// Per-issue cycle time distribution, for charting
    pub cycle_time_days: Vec<f64>,
}

// ============================================
// Boundary diagnostics
// ============================================

/// A non-fatal decode problem at the snapshot boundary.
///
/// One warning per dropped field or entry, naming the issue and field
/// that failed, so tests can assert on *what* was unparsable rather than
/// just observing that the batch survived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeWarning {
    /// Key of the affected issue, or "(unknown)" when the key itself failed
    pub issue: String,
    /// Field or change-log item that failed to decode
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl DecodeWarning {
    pub fn new(
        issue: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            issue: issue.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.issue, self.field, self.reason)
    }
}
