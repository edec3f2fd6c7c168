//! Narrative summary of aggregate metrics.
//!
//! A deterministic markdown rendering: fixed line order, fixed
//! recommendation-rule order, no randomness and no wall-clock reads.
//! Rendering the same [`AggregateMetrics`] twice yields identical text.

use crate::format::{fmt_days, fmt_pct, fmt_points};
use crate::types::AggregateMetrics;

/// At most this many recommendations are emitted, in rule order.
const MAX_RECOMMENDATIONS: usize = 3;

/// Lead time exceeding cycle time by more than this flags grooming delay.
const GROOMING_GAP_DAYS: f64 = 2.0;
/// Mean blocked time above this flags blocker investigation.
const BLOCKED_MEAN_DAYS: f64 = 0.5;
/// Reopen rate above this flags QA / acceptance-criteria work.
const REOPEN_RATE_PCT: f64 = 10.0;
/// Cycle-time stdev above this flags high variance.
const CYCLE_STDEV_DAYS: f64 = 3.0;

/// Whether work waits long before starting: lead mean exceeds cycle mean
/// by more than the grooming threshold. Requires both means.
fn grooming_delay(m: &AggregateMetrics) -> bool {
    match (m.lead_time_mean_days, m.cycle_time_mean_days) {
        (Some(lead), Some(cycle)) => lead - cycle > GROOMING_GAP_DAYS,
        _ => false,
    }
}

fn frequent_blockers(m: &AggregateMetrics) -> bool {
    m.blocked_days_mean
        .is_some_and(|blocked| blocked > BLOCKED_MEAN_DAYS)
}

fn reopen_churn(m: &AggregateMetrics) -> bool {
    m.reopen_rate_pct > REOPEN_RATE_PCT
}

fn high_variance(m: &AggregateMetrics) -> bool {
    m.cycle_time_stdev_days
        .is_some_and(|stdev| stdev > CYCLE_STDEV_DAYS)
}

/// Threshold-triggered recommendations, evaluated in fixed order and
/// capped at the first [`MAX_RECOMMENDATIONS`] that fire. Never re-sorted.
pub fn recommendations(m: &AggregateMetrics) -> Vec<&'static str> {
    let rules: [(fn(&AggregateMetrics) -> bool, &'static str); 4] = [
        (
            grooming_delay,
            "Reduce waiting time before work starts; clarify backlog grooming and prioritization.",
        ),
        (
            frequent_blockers,
            "Investigate frequent blockers; define escalation paths and remove systemic impediments.",
        ),
        (
            reopen_churn,
            "Tighten acceptance criteria and improve QA to reduce reopen churn.",
        ),
        (
            high_variance,
            "High variance in cycle time; slice work smaller and limit WIP for predictability.",
        ),
    ];

    rules
        .iter()
        .filter(|(fires, _)| fires(m))
        .map(|(_, text)| *text)
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

/// Render the aggregate metrics as a markdown summary.
///
/// Line order is fixed: averages, blocked time (only when defined),
/// reopen rate (always), throughput and velocity (only when any sprint
/// has data, sprints in ascending-id order), then recommendations.
pub fn render_summary(m: &AggregateMetrics) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("**Summary of Metrics (Last Sprints):**".to_string());
    lines.push(format!(
        "- **Average cycle time**: {}; **lead time**: {}; **cycle time stdev**: {}",
        fmt_days(m.cycle_time_mean_days),
        fmt_days(m.lead_time_mean_days),
        fmt_days(m.cycle_time_stdev_days),
    ));

    if m.blocked_days_mean.is_some() {
        lines.push(format!(
            "- **Avg blocked time**: {} per ticket",
            fmt_days(m.blocked_days_mean)
        ));
    }

    lines.push(format!("- **Reopen rate**: {}", fmt_pct(m.reopen_rate_pct)));

    if !m.throughput_by_sprint.is_empty() {
        let rendered: Vec<String> = m
            .throughput_by_sprint
            .iter()
            .map(|(sprint, count)| format!("{}:{}", sprint, count))
            .collect();
        lines.push(format!(
            "- **Throughput** (tickets/sprint): {}",
            rendered.join(", ")
        ));
    }

    if !m.velocity_by_sprint.is_empty() {
        let rendered: Vec<String> = m
            .velocity_by_sprint
            .iter()
            .map(|(sprint, points)| format!("{}:{}", sprint, fmt_points(*points)))
            .collect();
        lines.push(format!(
            "- **Velocity** (SP/sprint): {}",
            rendered.join(", ")
        ));
    }

    let recs = recommendations(m);
    if !recs.is_empty() {
        lines.push(String::new());
        lines.push("**Recommendations:**".to_string());
        for rec in recs {
            lines.push(format!("- {}", rec));
        }
    }

    lines.join("\n")
}
