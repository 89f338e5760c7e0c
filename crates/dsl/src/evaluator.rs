use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenant_bench_core::domain::diff::{DiffPayload, InsertedOrDeletedRow, Row, UpdatedRow};

use crate::ast::{Assertion, CompiledSpec, ExpectedCount, FieldChange, Predicate, WhereClause};

/// `{passed, failures, score}` produced by [`evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub passed: bool,
    pub failures: Vec<String>,
    pub score: Score,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub passed: i64,
    pub total: i64,
    pub percent: f64,
}

/// Evaluate a compiled spec against a diff. Pure function: repeated calls on
/// the same `(spec, diff)` yield identical output.
#[must_use]
pub fn evaluate(spec: &CompiledSpec, diff: &DiffPayload) -> EvaluationResult {
    let total = spec.assertions.len() as i64;
    let mut failures = Vec::new();

    for (index, assertion) in spec.assertions.iter().enumerate() {
        if let Some(message) = check_assertion(spec, index, assertion, diff) {
            failures.push(message);
        }
    }

    let passed = total - failures.len() as i64;
    let percent = if total == 0 {
        100.0
    } else {
        (passed as f64 / total as f64) * 100.0
    };

    EvaluationResult {
        passed: failures.is_empty(),
        failures,
        score: Score { passed, total, percent },
    }
}

fn check_assertion(
    spec: &CompiledSpec,
    index: usize,
    assertion: &Assertion,
    diff: &DiffPayload,
) -> Option<String> {
    match assertion {
        Assertion::Added {
            entity,
            where_,
            expected_count,
            ..
        } => check_added_or_removed(index, "added", entity, where_, expected_count, &diff.inserts),
        Assertion::Removed {
            entity,
            where_,
            expected_count,
            ..
        } => check_added_or_removed(index, "removed", entity, where_, expected_count, &diff.deletes),
        Assertion::Changed {
            entity,
            where_,
            expected_changes,
            ignore,
            expected_count,
        } => check_changed(
            spec,
            index,
            entity,
            where_,
            expected_changes,
            ignore,
            expected_count,
            diff,
        ),
        Assertion::Unchanged {
            entity,
            where_,
            expected_count,
        } => check_unchanged(index, entity, where_, expected_count, diff),
    }
}

fn check_added_or_removed(
    index: usize,
    kind: &str,
    entity: &str,
    where_: &WhereClause,
    expected_count: &Option<ExpectedCount>,
    rows: &[InsertedOrDeletedRow],
) -> Option<String> {
    let matches = rows
        .iter()
        .filter(|r| r.table == entity && row_matches(&r.row, where_))
        .count() as i64;

    let required = expected_count.clone().unwrap_or(ExpectedCount::Range {
        min: Some(1),
        max: None,
    });

    if required.satisfied_by(matches) {
        None
    } else {
        Some(format!(
            "assertion[{index}] ({kind} {entity}): expected count matching {required:?}, got {matches}"
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn check_changed(
    spec: &CompiledSpec,
    index: usize,
    entity: &str,
    where_: &WhereClause,
    expected_changes: &std::collections::HashMap<String, FieldChange>,
    ignore: &[String],
    expected_count: &Option<ExpectedCount>,
    diff: &DiffPayload,
) -> Option<String> {
    let ignore_set = spec.ignore_fields.resolve(entity, ignore);

    let qualifying: Vec<&UpdatedRow> = diff
        .updates
        .iter()
        .filter(|u| u.table == entity)
        .filter(|u| where_.is_empty() || row_matches(&u.after, where_) || row_matches(&u.before, where_))
        .filter(|u| candidate_qualifies(u, expected_changes, &ignore_set, spec.strict))
        .collect();

    let matches = qualifying.len() as i64;

    if matches == 0 {
        // Distinguish "no candidate rows" from "candidates existed but failed strict-mode subset
        // check" before falling back to the generic count message, so a real strict-mode
        // violation always names the offending field rather than being masked by a count of 0.
        let any_candidate = diff
            .updates
            .iter()
            .any(|u| u.table == entity && (where_.is_empty() || row_matches(&u.after, where_) || row_matches(&u.before, where_)));
        if any_candidate {
            if let Some(violation) = first_strict_violation(diff, entity, where_, expected_changes, &ignore_set, spec.strict) {
                return Some(format!(
                    "assertion[{index}] (changed {entity}): {violation}"
                ));
            }
        }
    }

    let required = expected_count.clone().unwrap_or(ExpectedCount::Range {
        min: Some(1),
        max: None,
    });

    if !required.satisfied_by(matches) {
        return Some(format!(
            "assertion[{index}] (changed {entity}): expected count matching {required:?}, got {matches}"
        ));
    }

    None
}

fn first_strict_violation(
    diff: &DiffPayload,
    entity: &str,
    where_: &WhereClause,
    expected_changes: &std::collections::HashMap<String, FieldChange>,
    ignore_set: &HashSet<String>,
    strict: bool,
) -> Option<String> {
    if !strict {
        return None;
    }
    for update in diff.updates.iter().filter(|u| u.table == entity) {
        if !(where_.is_empty() || row_matches(&update.after, where_) || row_matches(&update.before, where_)) {
            continue;
        }
        let changed_fields = changed_fields(update, ignore_set);
        for field in &changed_fields {
            if !expected_changes.contains_key(field) {
                return Some(format!(
                    "field '{field}' changed but is not a subset of expected_changes keys"
                ));
            }
        }
    }
    None
}

fn changed_fields(update: &UpdatedRow, ignore_set: &HashSet<String>) -> Vec<String> {
    let mut fields = Vec::new();
    for key in update.before.keys().chain(update.after.keys()) {
        if ignore_set.contains(key) || fields.contains(key) {
            continue;
        }
        if null_distinct_differs(update.before.get(key), update.after.get(key)) {
            fields.push(key.clone());
        }
    }
    fields
}

fn candidate_qualifies(
    update: &UpdatedRow,
    expected_changes: &std::collections::HashMap<String, FieldChange>,
    ignore_set: &HashSet<String>,
    strict: bool,
) -> bool {
    let changed = changed_fields(update, ignore_set);

    if strict && changed.iter().any(|f| !expected_changes.contains_key(f)) {
        return false;
    }

    expected_changes.iter().all(|(field, change)| {
        if !changed.contains(field) {
            return false;
        }
        let before = update.before.get(field).cloned().unwrap_or(Value::Null);
        let after = update.after.get(field).cloned().unwrap_or(Value::Null);
        change.from.as_ref().map_or(true, |p| predicate_matches(p, &before))
            && change.to.as_ref().map_or(true, |p| predicate_matches(p, &after))
    })
}

fn check_unchanged(
    index: usize,
    entity: &str,
    where_: &WhereClause,
    expected_count: &Option<ExpectedCount>,
    diff: &DiffPayload,
) -> Option<String> {
    let insert_matches = diff
        .inserts
        .iter()
        .filter(|r| r.table == entity && row_matches(&r.row, where_))
        .count();
    let delete_matches = diff
        .deletes
        .iter()
        .filter(|r| r.table == entity && row_matches(&r.row, where_))
        .count();
    let update_matches = diff
        .updates
        .iter()
        .filter(|u| u.table == entity && (row_matches(&u.before, where_) || row_matches(&u.after, where_)))
        .count();

    let tally = (insert_matches + delete_matches + update_matches) as i64;
    let required = expected_count.clone().unwrap_or(ExpectedCount::Exact(0));

    if required.satisfied_by(tally) {
        None
    } else {
        Some(format!(
            "assertion[{index}] (unchanged {entity}): expected count matching {required:?}, got {tally}"
        ))
    }
}

fn row_matches(row: &Row, where_: &WhereClause) -> bool {
    where_
        .iter()
        .all(|(field, predicate)| predicate_matches(predicate, &get_nested(row, field)))
}

/// Dotted field paths (`a.b.c`) read nested map values; a missing path
/// reads as `null`.
fn get_nested(row: &Row, path: &str) -> Value {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Null;
    };
    let mut current = row.get(first).cloned().unwrap_or(Value::Null);
    for segment in segments {
        current = current
            .as_object()
            .and_then(|m| m.get(segment))
            .cloned()
            .unwrap_or(Value::Null);
    }
    current
}

/// SQL NULL-distinct comparison: `NULL` is never equal to a value, `NULL =
/// NULL` holds. `serde_json::Value::Null` is our NULL.
fn null_distinct_differs(before: Option<&Value>, after: Option<&Value>) -> bool {
    let before = before.cloned().unwrap_or(Value::Null);
    let after = after.cloned().unwrap_or(Value::Null);
    if before.is_null() && after.is_null() {
        return false;
    }
    before != after
}

fn predicate_matches(predicate: &Predicate, value: &Value) -> bool {
    match predicate {
        Predicate::Eq(expected) => value == expected,
        Predicate::Ne(expected) => value != expected,
        Predicate::In(options) => options.contains(value),
        Predicate::NotIn(options) => !options.contains(value),
        Predicate::Contains(needle) => value_contains(value, needle, false),
        Predicate::NotContains(needle) => !value_contains(value, needle, false),
        Predicate::IContains(needle) => {
            value_contains(value, &Value::String(needle.clone()), true)
        }
        Predicate::StartsWith(prefix) => as_str(value).is_some_and(|s| s.starts_with(prefix.as_str())),
        Predicate::EndsWith(suffix) => as_str(value).is_some_and(|s| s.ends_with(suffix.as_str())),
        Predicate::IStartsWith(prefix) => as_str(value)
            .is_some_and(|s| s.to_lowercase().starts_with(&prefix.to_lowercase())),
        Predicate::IEndsWith(suffix) => {
            as_str(value).is_some_and(|s| s.to_lowercase().ends_with(&suffix.to_lowercase()))
        }
        Predicate::Regex(pattern) => regex::Regex::new(pattern)
            .ok()
            .zip(as_str(value))
            .is_some_and(|(re, s)| re.is_match(s)),
        Predicate::Gt(expected) => compare(value, expected) == Some(std::cmp::Ordering::Greater),
        Predicate::Gte(expected) => matches!(
            compare(value, expected),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        Predicate::Lt(expected) => compare(value, expected) == Some(std::cmp::Ordering::Less),
        Predicate::Lte(expected) => matches!(
            compare(value, expected),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        Predicate::Exists(want_present) => value.is_null() != *want_present,
        Predicate::HasAny(options) => sequence_values(value).is_some_and(|seq| seq.iter().any(|v| options.contains(v))),
        Predicate::HasAll(options) => {
            sequence_values(value).is_some_and(|seq| options.iter().all(|o| seq.contains(o)))
        }
    }
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

fn value_contains(haystack: &Value, needle: &Value, case_insensitive: bool) -> bool {
    if let (Some(h), Some(n)) = (haystack.as_str(), needle.as_str()) {
        return if case_insensitive {
            h.to_lowercase().contains(&n.to_lowercase())
        } else {
            h.contains(n)
        };
    }
    if let Some(seq) = haystack.as_array() {
        return seq.contains(needle);
    }
    false
}

/// Values as a sequence for `has_any`/`has_all`: a JSON array as-is, or a
/// string treated as a sequence of single-character strings.
fn sequence_values(value: &Value) -> Option<Vec<Value>> {
    if let Some(arr) = value.as_array() {
        return Some(arr.clone());
    }
    value.as_str().map(|s| {
        s.chars()
            .map(|c| Value::String(c.to_string()))
            .collect()
    })
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
        return Some(a.cmp(b));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;
    use std::collections::HashMap;
    use tenant_bench_core::domain::diff::{InsertedOrDeletedRow, UpdatedRow};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn insert_detection_passes_with_matching_predicate() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "added",
                "entity": "messages",
                "where": { "channel_id": "C01ABCD1234", "message_text": { "contains": "hello" } },
                "expected_count": 1
            }]
        }))
        .unwrap();

        let diff = DiffPayload {
            inserts: vec![InsertedOrDeletedRow {
                table: "messages".to_string(),
                row: row(&[
                    ("channel_id", json!("C01ABCD1234")),
                    ("message_text", json!("hello there")),
                ]),
            }],
            updates: vec![],
            deletes: vec![],
        };

        let result = evaluate(&spec, &diff);
        assert!(result.passed);
        assert_eq!(result.score, Score { passed: 1, total: 1, percent: 100.0 });
    }

    #[test]
    fn changed_assertion_matches_contains_predicate_on_to() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "changed",
                "entity": "channels",
                "where": { "channel_id": "C01ABCD1234" },
                "expected_changes": { "topic_text": { "to": { "contains": "standup" } } }
            }]
        }))
        .unwrap();

        let diff = DiffPayload {
            inserts: vec![],
            deletes: vec![],
            updates: vec![UpdatedRow {
                table: "channels".to_string(),
                before: row(&[
                    ("channel_id", json!("C01ABCD1234")),
                    ("topic_text", json!("old topic")),
                ]),
                after: row(&[
                    ("channel_id", json!("C01ABCD1234")),
                    ("topic_text", json!("Weekly standup")),
                ]),
            }],
        };

        let result = evaluate(&spec, &diff);
        assert!(result.passed, "failures: {:?}", result.failures);
    }

    #[test]
    fn strict_mode_fails_on_unexpected_changed_field() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "changed",
                "entity": "channels",
                "where": { "channel_id": "C01ABCD1234" },
                "expected_changes": { "topic_text": { "to": { "contains": "standup" } } }
            }]
        }))
        .unwrap();

        let diff = DiffPayload {
            inserts: vec![],
            deletes: vec![],
            updates: vec![UpdatedRow {
                table: "channels".to_string(),
                before: row(&[
                    ("channel_id", json!("C01ABCD1234")),
                    ("topic_text", json!("old")),
                    ("purpose_text", json!("old purpose")),
                ]),
                after: row(&[
                    ("channel_id", json!("C01ABCD1234")),
                    ("topic_text", json!("Weekly standup")),
                    ("purpose_text", json!("new purpose")),
                ]),
            }],
        };

        let result = evaluate(&spec, &diff);
        assert!(!result.passed);
        assert!(result.failures[0].contains("purpose_text"));
    }

    #[test]
    fn unchanged_guard_fails_once_a_matching_insert_appears() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{ "diff_type": "unchanged", "entity": "messages" }]
        }))
        .unwrap();

        let empty = DiffPayload::default();
        assert!(evaluate(&spec, &empty).passed);

        let with_insert = DiffPayload {
            inserts: vec![InsertedOrDeletedRow {
                table: "messages".to_string(),
                row: row(&[("channel_id", json!("C01"))]),
            }],
            ..DiffPayload::default()
        };
        assert!(!evaluate(&spec, &with_insert).passed);
    }

    #[test]
    fn delete_with_count_range() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "removed",
                "entity": "messages",
                "where": { "channel_id": "C01ABCD1234" },
                "expected_count": { "min": 1 }
            }]
        }))
        .unwrap();

        let diff = DiffPayload {
            deletes: vec![
                InsertedOrDeletedRow { table: "messages".to_string(), row: row(&[("channel_id", json!("C01ABCD1234"))]) },
                InsertedOrDeletedRow { table: "messages".to_string(), row: row(&[("channel_id", json!("C01ABCD1234"))]) },
            ],
            ..DiffPayload::default()
        };

        assert!(evaluate(&spec, &diff).passed);
    }

    #[test]
    fn scoring_law_holds() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [
                { "diff_type": "unchanged", "entity": "a" },
                { "diff_type": "unchanged", "entity": "b" },
            ]
        }))
        .unwrap();
        let with_insert = DiffPayload {
            inserts: vec![InsertedOrDeletedRow { table: "a".to_string(), row: HashMap::new() }],
            ..DiffPayload::default()
        };
        let result = evaluate(&spec, &with_insert);
        assert_eq!(result.score.passed + result.failures.len() as i64, result.score.total);
        assert_eq!(result.passed, result.failures.is_empty());
    }

    #[test]
    fn evaluation_is_a_pure_function() {
        let spec = compile(&json!({
            "version": "0.1",
            "assertions": [{ "diff_type": "added", "entity": "messages", "expected_count": 1 }]
        }))
        .unwrap();
        let diff = DiffPayload {
            inserts: vec![InsertedOrDeletedRow { table: "messages".to_string(), row: HashMap::new() }],
            ..DiffPayload::default()
        };
        assert_eq!(evaluate(&spec, &diff), evaluate(&spec, &diff));
    }
}
