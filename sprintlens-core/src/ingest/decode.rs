//! Boundary decoder: raw exported tracker JSON → typed [`IssueRecord`]s.
//!
//! The engine never probes loosely-typed data; every optional field is
//! decoded exactly once here, and every decode failure becomes a
//! structured [`DecodeWarning`] naming the issue and field. A malformed
//! field or change-log entry is dropped locally; it never aborts the
//! batch.
//!
//! # Error Handling
//!
//! - **Missing `key` or undecodable `created`**: the issue is unusable and
//!   is skipped with a warning.
//! - **Unparsable optional fields** (resolution date, story points,
//!   sprint): warning, field decodes to `None`.
//! - **Change-log entries with unparsable timestamps**: warning, entry
//!   dropped, remaining history still decodes.

use crate::config::FieldMap;
use crate::types::{DecodeWarning, IssueRecord, StatusTransition};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Placeholder key for issues whose own key failed to decode.
const UNKNOWN_KEY: &str = "(unknown)";

// ============================================
// Raw snapshot shapes (serde deserialization)
// ============================================

/// A snapshot document: either a bare issue array or the tracker's
/// search-response envelope (`{"issues": [...]}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDocument {
    Envelope { issues: Vec<RawIssue> },
    Bare(Vec<RawIssue>),
}

impl SnapshotDocument {
    pub fn into_issues(self) -> Vec<RawIssue> {
        match self {
            SnapshotDocument::Envelope { issues } => issues,
            SnapshotDocument::Bare(issues) => issues,
        }
    }
}

/// One raw issue as exported.
///
/// Uses `#[serde(default)]` liberally: exports from different tracker
/// versions omit fields freely, and absence is handled per field below.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawIssue {
    pub key: Option<String>,
    pub fields: RawFields,
    pub changelog: Option<RawChangelog>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawFields {
    pub created: Option<String>,
    pub resolutiondate: Option<String>,
    pub assignee: Option<RawNamed>,
    pub issuetype: Option<RawNamed>,
    /// Instance-specific custom fields (story points, sprint, ...),
    /// addressed through the configured [`FieldMap`].
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

/// An object-valued field we only need a name from.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawNamed {
    pub display_name: Option<String>,
    pub name: Option<String>,
}

impl RawNamed {
    fn into_name(self) -> Option<String> {
        self.display_name.or(self.name)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawChangelog {
    pub histories: Vec<RawHistoryEntry>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawHistoryEntry {
    pub created: Option<String>,
    pub items: Vec<RawChangeItem>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawChangeItem {
    pub field: Option<String>,
    pub from_string: Option<String>,
    pub to_string: Option<String>,
}

// ============================================
// Field decoding
// ============================================

/// Parse a tracker timestamp: RFC 3339 or the classic Jira
/// `2024-03-01T09:00:00.000+0000` shape.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.3f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn legacy_sprint_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bid=(\d+)").expect("static regex"))
}

/// Pull a sprint id out of one element of the sprint custom field.
///
/// Exports carry sprints as objects (`{"id": 42, ...}`), bare integers,
/// or the legacy `toString`-serialized strings containing `id=42`.
fn sprint_id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Object(obj) => obj.get("id").and_then(Value::as_i64),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => legacy_sprint_id_re()
            .captures(s)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Most-recent sprint id: the numerically largest across all decodable
/// elements.
///
/// Recency-by-largest-id assumes the source assigns sprint ids
/// monotonically; sources that recycle or backfill ids will mis-attribute
/// issues. Exports that carry a sprint `endDate` would allow a
/// chronological pick instead.
pub fn extract_sprint_id(
    raw: &Value,
    key: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<i64> {
    if raw.is_null() {
        return None;
    }

    let elements: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut ids: Vec<i64> = Vec::new();
    for element in elements {
        match sprint_id_from_value(element) {
            Some(id) => ids.push(id),
            None => warnings.push(DecodeWarning::new(
                key,
                "sprint",
                format!("unrecognized sprint shape: {}", element),
            )),
        }
    }
    ids.into_iter().max()
}

/// Decode a story-point estimate: number, or numeric string.
pub fn extract_story_points(
    raw: &Value,
    key: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<f64> {
    let points = match raw {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match points {
        Some(p) if p >= 0.0 => Some(p),
        Some(p) => {
            warnings.push(DecodeWarning::new(
                key,
                "story_points",
                format!("negative estimate: {}", p),
            ));
            None
        }
        None => {
            warnings.push(DecodeWarning::new(
                key,
                "story_points",
                format!("not a number: {}", raw),
            ));
            None
        }
    }
}

// ============================================
// History normalization
// ============================================

/// Normalize a raw change log into a chronological status history.
///
/// Keeps only items whose changed field is "status". Entries with a
/// missing or unparsable timestamp are dropped with a warning. The final
/// sort is stable, so ties keep the original change-log order, and
/// out-of-order change-log pages from the source cannot produce an
/// out-of-order history.
pub fn normalize_history(
    changelog: &RawChangelog,
    key: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Vec<StatusTransition> {
    let mut history: Vec<StatusTransition> = Vec::new();

    for entry in &changelog.histories {
        let at = match entry.created.as_deref().and_then(parse_datetime) {
            Some(at) => at,
            None => {
                warnings.push(DecodeWarning::new(
                    key,
                    "changelog",
                    format!(
                        "unparsable entry timestamp: {}",
                        entry.created.as_deref().unwrap_or("(missing)")
                    ),
                ));
                continue;
            }
        };

        for item in &entry.items {
            if item.field.as_deref() == Some("status") {
                history.push(StatusTransition::new(
                    at,
                    item.from_string.clone(),
                    item.to_string.clone(),
                ));
            }
        }
    }

    history.sort_by_key(|t| t.at);
    history
}

// ============================================
// Issue decoding
// ============================================

/// Decode one raw issue, or `None` (with a warning) when it is unusable.
pub fn decode_issue(
    raw: RawIssue,
    fields: &FieldMap,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<IssueRecord> {
    let key = match raw.key {
        Some(key) if !key.is_empty() => key,
        _ => {
            warnings.push(DecodeWarning::new(UNKNOWN_KEY, "key", "missing issue key"));
            return None;
        }
    };

    let created_at = match raw.fields.created.as_deref() {
        Some(value) => match parse_datetime(value) {
            Some(at) => at,
            None => {
                warnings.push(DecodeWarning::new(
                    &key,
                    "created",
                    format!("unparsable timestamp: {}", value),
                ));
                return None;
            }
        },
        None => {
            warnings.push(DecodeWarning::new(&key, "created", "missing"));
            return None;
        }
    };

    let resolved_at = match raw.fields.resolutiondate.as_deref() {
        Some(value) => {
            let parsed = parse_datetime(value);
            if parsed.is_none() {
                warnings.push(DecodeWarning::new(
                    &key,
                    "resolutiondate",
                    format!("unparsable timestamp: {}", value),
                ));
            }
            parsed
        }
        None => None,
    };

    let size_estimate = raw
        .fields
        .custom
        .get(&fields.story_points)
        .and_then(|value| extract_story_points(value, &key, warnings));

    let sprint_id = raw
        .fields
        .custom
        .get(&fields.sprint)
        .and_then(|value| extract_sprint_id(value, &key, warnings));

    let history = raw
        .changelog
        .as_ref()
        .map(|changelog| normalize_history(changelog, &key, warnings))
        .unwrap_or_default();

    Some(IssueRecord {
        key,
        created_at,
        resolved_at,
        size_estimate,
        sprint_id,
        assignee: raw.fields.assignee.and_then(RawNamed::into_name),
        issue_type: raw.fields.issuetype.and_then(RawNamed::into_name),
        history,
    })
}

/// Decode a whole batch, accumulating warnings across issues.
pub fn decode_issues(
    raws: Vec<RawIssue>,
    fields: &FieldMap,
) -> (Vec<IssueRecord>, Vec<DecodeWarning>) {
    let mut warnings = Vec::new();
    let records = raws
        .into_iter()
        .filter_map(|raw| decode_issue(raw, fields, &mut warnings))
        .collect();
    (records, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn field_map() -> FieldMap {
        FieldMap::default()
    }

    fn raw_issue(value: Value) -> RawIssue {
        serde_json::from_value(value).expect("fixture issue should deserialize")
    }

    #[test]
    fn test_parse_datetime_shapes() {
        let rfc = parse_datetime("2024-03-01T09:00:00Z").unwrap();
        let jira = parse_datetime("2024-03-01T09:00:00.000+0000").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(rfc, jira);
        assert!(parse_datetime("yesterday-ish").is_none());
    }

    #[test]
    fn test_sprint_id_shapes() {
        let mut warnings = Vec::new();
        let objects = json!([{"id": 41, "name": "Sprint 41"}, {"id": 42}]);
        assert_eq!(extract_sprint_id(&objects, "K-1", &mut warnings), Some(42));

        let legacy = json!("com.atlassian.greenhopper.service.sprint.Sprint@1f[id=4213,state=CLOSED]");
        assert_eq!(extract_sprint_id(&legacy, "K-1", &mut warnings), Some(4213));

        let bare = json!(17);
        assert_eq!(extract_sprint_id(&bare, "K-1", &mut warnings), Some(17));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_sprint_largest_id_wins() {
        let mut warnings = Vec::new();
        let moved = json!([{"id": 9}, {"id": 3}, {"id": 7}]);
        assert_eq!(extract_sprint_id(&moved, "K-1", &mut warnings), Some(9));
    }

    #[test]
    fn test_sprint_garbage_warns_but_keeps_good_ids() {
        let mut warnings = Vec::new();
        let mixed = json!([{"id": 5}, true]);
        assert_eq!(extract_sprint_id(&mixed, "K-9", &mut warnings), Some(5));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].issue, "K-9");
        assert_eq!(warnings[0].field, "sprint");
    }

    #[test]
    fn test_story_points_shapes() {
        let mut warnings = Vec::new();
        assert_eq!(
            extract_story_points(&json!(5.0), "K-1", &mut warnings),
            Some(5.0)
        );
        assert_eq!(
            extract_story_points(&json!("3"), "K-1", &mut warnings),
            Some(3.0)
        );
        assert!(warnings.is_empty());

        assert_eq!(extract_story_points(&json!(-2), "K-1", &mut warnings), None);
        assert_eq!(
            extract_story_points(&json!({"pts": 3}), "K-1", &mut warnings),
            None
        );
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].field, "story_points");
    }

    #[test]
    fn test_normalize_history_filters_and_sorts() {
        let changelog: RawChangelog = serde_json::from_value(json!({
            "histories": [
                // Delivered out of order; assignee item must be ignored.
                {"created": "2024-03-01T12:00:00Z", "items": [
                    {"field": "status", "fromString": "In Progress", "toString": "Done"}
                ]},
                {"created": "2024-03-01T09:00:00Z", "items": [
                    {"field": "assignee", "fromString": null, "toString": "ada"},
                    {"field": "status", "fromString": "To Do", "toString": "In Progress"}
                ]}
            ]
        }))
        .unwrap();

        let mut warnings = Vec::new();
        let history = normalize_history(&changelog, "K-2", &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_status.as_deref(), Some("In Progress"));
        assert_eq!(history[1].to_status.as_deref(), Some("Done"));
        assert!(history[0].at <= history[1].at);
    }

    #[test]
    fn test_normalize_history_drops_bad_timestamps() {
        let changelog: RawChangelog = serde_json::from_value(json!({
            "histories": [
                {"created": "not a date", "items": [
                    {"field": "status", "fromString": "To Do", "toString": "In Progress"}
                ]},
                {"items": [
                    {"field": "status", "fromString": "To Do", "toString": "Done"}
                ]},
                {"created": "2024-03-02T10:00:00Z", "items": [
                    {"field": "status", "fromString": "In Progress", "toString": "Done"}
                ]}
            ]
        }))
        .unwrap();

        let mut warnings = Vec::new();
        let history = normalize_history(&changelog, "K-3", &mut warnings);
        assert_eq!(history.len(), 1, "only the well-formed entry survives");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.field == "changelog"));
        assert!(warnings.iter().all(|w| w.issue == "K-3"));
    }

    #[test]
    fn test_decode_issue_complete() {
        let raw = raw_issue(json!({
            "key": "PROJ-7",
            "fields": {
                "created": "2024-03-01T08:00:00Z",
                "resolutiondate": "2024-03-05T16:00:00Z",
                "assignee": {"displayName": "Ada Lovelace"},
                "issuetype": {"name": "Story"},
                "customfield_10016": 5,
                "customfield_10007": [{"id": 42}]
            },
            "changelog": {"histories": [
                {"created": "2024-03-01T09:00:00Z", "items": [
                    {"field": "status", "fromString": "To Do", "toString": "In Progress"}
                ]}
            ]}
        }));

        let mut warnings = Vec::new();
        let record = decode_issue(raw, &field_map(), &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(record.key, "PROJ-7");
        assert_eq!(record.size_estimate, Some(5.0));
        assert_eq!(record.sprint_id, Some(42));
        assert_eq!(record.assignee.as_deref(), Some("Ada Lovelace"));
        assert_eq!(record.issue_type.as_deref(), Some("Story"));
        assert!(record.resolved_at.is_some());
        assert_eq!(record.history.len(), 1);
    }

    #[test]
    fn test_decode_issue_missing_key_skipped() {
        let raw = raw_issue(json!({
            "fields": {"created": "2024-03-01T08:00:00Z"}
        }));
        let mut warnings = Vec::new();
        assert!(decode_issue(raw, &field_map(), &mut warnings).is_none());
        assert_eq!(warnings[0].issue, "(unknown)");
        assert_eq!(warnings[0].field, "key");
    }

    #[test]
    fn test_decode_issue_bad_created_skipped() {
        let raw = raw_issue(json!({
            "key": "PROJ-8",
            "fields": {"created": "???"}
        }));
        let mut warnings = Vec::new();
        assert!(decode_issue(raw, &field_map(), &mut warnings).is_none());
        assert_eq!(warnings[0].issue, "PROJ-8");
        assert_eq!(warnings[0].field, "created");
    }

    #[test]
    fn test_decode_issue_bad_resolution_degrades() {
        let raw = raw_issue(json!({
            "key": "PROJ-9",
            "fields": {
                "created": "2024-03-01T08:00:00Z",
                "resolutiondate": "someday"
            }
        }));
        let mut warnings = Vec::new();
        let record = decode_issue(raw, &field_map(), &mut warnings).unwrap();
        assert_eq!(record.resolved_at, None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "resolutiondate");
    }

    #[test]
    fn test_decode_batch_keeps_good_issues() {
        let document: SnapshotDocument = serde_json::from_value(json!({
            "issues": [
                {"key": "A-1", "fields": {"created": "2024-03-01T08:00:00Z"}},
                {"fields": {"created": "2024-03-01T08:00:00Z"}},
                {"key": "A-3", "fields": {"created": "2024-03-02T08:00:00Z"}}
            ]
        }))
        .unwrap();

        let (records, warnings) = decode_issues(document.into_issues(), &field_map());
        assert_eq!(records.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(records[0].key, "A-1");
        assert_eq!(records[1].key, "A-3");
    }
}
