//! Phase extraction over a single issue's normalized status history.
//!
//! Every function here is a pure function of one history plus the
//! caller-supplied [`StatusVocabulary`]. Histories arrive already
//! normalized (status-only, chronological); nothing here reads the clock,
//! so deriving metrics twice from the same snapshot is bit-identical.

use crate::types::{IssueMetrics, IssueRecord, PhaseDurations, StatusTransition, StatusVocabulary};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Convert a duration to fractional days.
fn duration_days(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 86_400_000.0
}

/// Days from `start` to `end`, or `None` when the interval is negative.
///
/// Inconsistent source data (a completion stamped before work started)
/// yields an undefined metric, never a negative one.
fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64> {
    let d = end.signed_duration_since(start);
    if d < Duration::zero() {
        return None;
    }
    Some(duration_days(d))
}

/// Timestamp of the first transition into any of `targets`.
pub fn first_entry_into(
    history: &[StatusTransition],
    targets: &BTreeSet<String>,
) -> Option<DateTime<Utc>> {
    history
        .iter()
        .find(|t| t.to_status.as_ref().is_some_and(|s| targets.contains(s)))
        .map(|t| t.at)
}

/// Timestamp of the most recent transition into any of `targets`.
pub fn last_entry_into(
    history: &[StatusTransition],
    targets: &BTreeSet<String>,
) -> Option<DateTime<Utc>> {
    history
        .iter()
        .rev()
        .find(|t| t.to_status.as_ref().is_some_and(|s| targets.contains(s)))
        .map(|t| t.at)
}

/// Whether the issue left a done status after having reached one.
///
/// Two-state scan: once a transition lands in `done`, the first later
/// transition landing anywhere else means the issue was reopened and the
/// scan stops. This detects *that* a reopen happened, not how many times.
pub fn was_reopened(history: &[StatusTransition], done: &BTreeSet<String>) -> bool {
    let mut seen_done = false;
    for t in history {
        let is_done = t.to_status.as_ref().is_some_and(|s| done.contains(s));
        if is_done {
            seen_done = true;
        } else if seen_done {
            return true;
        }
    }
    false
}

/// Accumulated time per status, from consecutive transition pairs.
///
/// Each closed interval `[t_i, t_{i+1})` accrues into the bucket of the
/// status the issue was *in* during it, i.e. the destination of the
/// earlier transition. The open-ended tail after the last transition is not
/// counted. Histories shorter than two transitions yield an empty map.
pub fn time_in_status(history: &[StatusTransition]) -> PhaseDurations {
    let mut durations = PhaseDurations::new();
    for pair in history.windows(2) {
        let Some(status) = pair[0].to_status.as_deref() else {
            continue;
        };
        let delta = pair[1].at.signed_duration_since(pair[0].at);
        let accrued = durations
            .get(status)
            .copied()
            .unwrap_or_else(Duration::zero);
        durations.insert(status.to_string(), accrued + delta);
    }
    durations
}

/// Total days across buckets whose status name contains "blocked"
/// (case-insensitive).
///
/// `None` when no such bucket exists; a blocked bucket with zero
/// accumulated time still reports `Some(0.0)`; absence of the phase is
/// distinct from zero time spent in it.
pub fn blocked_days(durations: &PhaseDurations) -> Option<f64> {
    let mut total = Duration::zero();
    let mut found = false;
    for (status, d) in durations {
        if status.to_lowercase().contains("blocked") {
            total = total + *d;
            found = true;
        }
    }
    found.then(|| duration_days(total))
}

impl IssueMetrics {
    /// Derive all per-issue metrics from one record.
    ///
    /// Completion policy: the source system's `resolved_at` is
    /// authoritative when present: an issue can pass through a done
    /// status transiently and be reopened, so the transition history is
    /// only a fallback.
    pub fn derive(record: &IssueRecord, vocab: &StatusVocabulary) -> Self {
        let in_progress_at = first_entry_into(&record.history, &vocab.in_progress);
        let done_at = record
            .resolved_at
            .or_else(|| last_entry_into(&record.history, &vocab.done));

        let cycle_time_days = match (in_progress_at, done_at) {
            (Some(start), Some(end)) => days_between(start, end),
            _ => None,
        };
        let lead_time_days = record
            .resolved_at
            .and_then(|resolved| days_between(record.created_at, resolved));

        let durations = time_in_status(&record.history);

        Self {
            key: record.key.clone(),
            sprint_id: record.sprint_id,
            size_estimate: record.size_estimate,
            in_progress_at,
            done_at,
            cycle_time_days,
            lead_time_days,
            blocked_days: blocked_days(&durations),
            reopened: was_reopened(&record.history, &vocab.done),
        }
    }
}
