//! Batch aggregation of per-issue metrics into cross-sprint statistics.
//!
//! A single pass over the derived [`IssueMetrics`] produces one
//! [`AggregateMetrics`]. Sprint grouping only ever covers issues that are
//! both completed and carry a sprint id; issues without a sprint still
//! contribute to the cycle-time, lead-time and reopen statistics.

use crate::types::{AggregateMetrics, IssueMetrics};
use std::collections::BTreeMap;

/// Arithmetic mean, `None` for an empty slice.
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample (n−1) standard deviation, `None` below two data points.
///
/// Fewer than two observations make variance uncomputable; reporting 0.0
/// instead would fabricate a "no variance" claim.
fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Combine per-issue metrics into whole-batch statistics.
///
/// Deterministic: same input slice, bit-identical output. An empty batch
/// yields zero counts, empty sprint maps and undefined means.
pub fn aggregate(issues: &[IssueMetrics]) -> AggregateMetrics {
    let completed: Vec<&IssueMetrics> = issues.iter().filter(|m| m.is_completed()).collect();

    let reopened_completed = completed.iter().filter(|m| m.reopened).count();
    let reopen_rate_pct = if completed.is_empty() {
        0.0
    } else {
        100.0 * reopened_completed as f64 / completed.len() as f64
    };

    let mut throughput_by_sprint: BTreeMap<i64, u64> = BTreeMap::new();
    let mut velocity_by_sprint: BTreeMap<i64, f64> = BTreeMap::new();
    for m in &completed {
        let Some(sprint) = m.sprint_id else {
            continue;
        };
        *throughput_by_sprint.entry(sprint).or_insert(0) += 1;
        // Missing estimates contribute 0, but the sprint entry must exist.
        *velocity_by_sprint.entry(sprint).or_insert(0.0) += m.size_estimate.unwrap_or(0.0);
    }

    let cycle_times: Vec<f64> = issues.iter().filter_map(|m| m.cycle_time_days).collect();
    let lead_times: Vec<f64> = issues.iter().filter_map(|m| m.lead_time_days).collect();
    let blocked: Vec<f64> = issues.iter().filter_map(|m| m.blocked_days).collect();

    AggregateMetrics {
        issue_count: issues.len() as u64,
        completed_count: completed.len() as u64,
        cycle_time_mean_days: mean(&cycle_times),
        cycle_time_stdev_days: sample_stdev(&cycle_times),
        lead_time_mean_days: mean(&lead_times),
        reopen_rate_pct,
        throughput_by_sprint,
        velocity_by_sprint,
        blocked_days_mean: mean(&blocked),
        cycle_time_days: cycle_times,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn metric(key: &str) -> IssueMetrics {
        IssueMetrics {
            key: key.to_string(),
            sprint_id: None,
            size_estimate: None,
            in_progress_at: None,
            done_at: None,
            cycle_time_days: None,
            lead_time_days: None,
            blocked_days: None,
            reopened: false,
        }
    }

    fn completed(key: &str, sprint: Option<i64>, estimate: Option<f64>) -> IssueMetrics {
        let mut m = metric(key);
        m.done_at = Some(Utc.with_ymd_and_hms(2024, 3, 8, 17, 0, 0).unwrap());
        m.sprint_id = sprint;
        m.size_estimate = estimate;
        m
    }

    #[test]
    fn test_empty_batch() {
        let agg = aggregate(&[]);
        assert_eq!(agg.issue_count, 0);
        assert_eq!(agg.completed_count, 0);
        assert_eq!(agg.reopen_rate_pct, 0.0);
        assert_eq!(agg.cycle_time_mean_days, None);
        assert_eq!(agg.cycle_time_stdev_days, None);
        assert_eq!(agg.lead_time_mean_days, None);
        assert_eq!(agg.blocked_days_mean, None);
        assert!(agg.throughput_by_sprint.is_empty());
        assert!(agg.velocity_by_sprint.is_empty());
    }

    #[test]
    fn test_reopen_rate_zero_completed_is_zero_not_nan() {
        let issues = vec![metric("PROJ-1"), metric("PROJ-2")];
        let agg = aggregate(&issues);
        assert_eq!(agg.reopen_rate_pct, 0.0);
    }

    #[test]
    fn test_reopen_rate_over_completed_only() {
        let mut reopened_open = metric("PROJ-1");
        reopened_open.reopened = true; // not completed, must not count
        let mut reopened_done = completed("PROJ-2", None, None);
        reopened_done.reopened = true;
        let issues = vec![
            reopened_open,
            reopened_done,
            completed("PROJ-3", None, None),
            completed("PROJ-4", None, None),
            completed("PROJ-5", None, None),
        ];
        let agg = aggregate(&issues);
        assert_eq!(agg.completed_count, 4);
        assert_eq!(agg.reopen_rate_pct, 25.0);
    }

    #[test]
    fn test_velocity_missing_estimates_count_as_zero() {
        let issues = vec![
            completed("PROJ-1", Some(7), Some(3.0)),
            completed("PROJ-2", Some(7), None),
            completed("PROJ-3", Some(7), Some(5.0)),
        ];
        let agg = aggregate(&issues);
        assert_eq!(agg.throughput_by_sprint[&7], 3);
        assert_eq!(agg.velocity_by_sprint[&7], 8.0);
    }

    #[test]
    fn test_sprint_with_no_estimates_still_present() {
        let issues = vec![
            completed("PROJ-1", Some(4), None),
            completed("PROJ-2", Some(4), None),
        ];
        let agg = aggregate(&issues);
        assert_eq!(agg.throughput_by_sprint[&4], 2);
        assert_eq!(agg.velocity_by_sprint[&4], 0.0);
    }

    #[test]
    fn test_issues_without_sprint_excluded_from_grouping() {
        let mut with_cycle = completed("PROJ-1", None, Some(2.0));
        with_cycle.cycle_time_days = Some(4.0);
        let issues = vec![with_cycle, completed("PROJ-2", Some(3), Some(1.0))];
        let agg = aggregate(&issues);
        // Grouping skips the sprintless issue...
        assert_eq!(agg.throughput_by_sprint.len(), 1);
        assert_eq!(agg.throughput_by_sprint[&3], 1);
        // ...but its cycle time still feeds the mean.
        assert_eq!(agg.cycle_time_mean_days, Some(4.0));
    }

    #[test]
    fn test_sprint_grouping_order_is_ascending() {
        let issues = vec![
            completed("PROJ-1", Some(9), Some(1.0)),
            completed("PROJ-2", Some(2), Some(1.0)),
            completed("PROJ-3", Some(5), Some(1.0)),
        ];
        let agg = aggregate(&issues);
        let keys: Vec<i64> = agg.throughput_by_sprint.keys().copied().collect();
        assert_eq!(keys, vec![2, 5, 9]);
    }

    #[test]
    fn test_stdev_sample_definition() {
        let mut a = completed("PROJ-1", None, None);
        a.cycle_time_days = Some(2.0);
        let agg = aggregate(&[a.clone()]);
        assert_eq!(agg.cycle_time_stdev_days, None, "one point has no variance");

        let mut b = completed("PROJ-2", None, None);
        b.cycle_time_days = Some(4.0);
        let agg = aggregate(&[a, b]);
        assert_eq!(agg.cycle_time_mean_days, Some(3.0));
        // Sample variance of {2, 4} is 2, stdev √2.
        let stdev = agg.cycle_time_stdev_days.unwrap();
        assert!((stdev - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(stdev >= 0.0);
    }

    #[test]
    fn test_blocked_mean_over_defined_only() {
        let mut a = metric("PROJ-1");
        a.blocked_days = Some(1.0);
        let mut b = metric("PROJ-2");
        b.blocked_days = Some(2.0);
        let c = metric("PROJ-3"); // never blocked, excluded from the mean
        let agg = aggregate(&[a, b, c]);
        assert_eq!(agg.blocked_days_mean, Some(1.5));
    }

    #[test]
    fn test_recomputation_is_bit_identical() {
        let mut a = completed("PROJ-1", Some(2), Some(3.0));
        a.cycle_time_days = Some(1.75);
        a.lead_time_days = Some(6.5);
        let mut b = completed("PROJ-2", Some(2), None);
        b.cycle_time_days = Some(0.5);
        b.reopened = true;
        let issues = vec![a, b, metric("PROJ-3")];

        let first = aggregate(&issues);
        let second = aggregate(&issues);
        assert_eq!(first, second);
    }
}
