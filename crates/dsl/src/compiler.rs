use std::collections::HashMap;

use serde_json::Value;
use tenant_bench_core::error::{Error, Result};

use crate::ast::{Assertion, CompiledSpec, ExpectedCount, FieldChange, IgnoreFields, Predicate, WhereClause};

const SUPPORTED_VERSION: &str = "0.1";

/// Validate and normalize a raw JSON assertion spec into its canonical
/// form. Compilation is a pure function of `raw`; nothing here touches a
/// diff. Once a spec is stored compiled, evaluation never re-validates it.
///
/// # Errors
/// Returns [`Error::BadRequest`] for any malformed document: unknown keys,
/// unknown operators, unknown `diff_type`, or an unsupported `version`.
pub fn compile(raw: &Value) -> Result<CompiledSpec> {
    let obj = raw
        .as_object()
        .ok_or_else(|| bad_request("spec must be a JSON object"))?;

    reject_unknown_keys(obj, &["version", "strict", "ignore_fields", "assertions"])?;

    let version = obj
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("spec.version is required"))?;
    if version != SUPPORTED_VERSION {
        return Err(bad_request(&format!(
            "unsupported spec version '{version}', expected '{SUPPORTED_VERSION}'"
        )));
    }

    let strict = match obj.get("strict") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(bad_request("spec.strict must be a boolean")),
    };

    let ignore_fields = match obj.get("ignore_fields") {
        None => IgnoreFields::default(),
        Some(v) => compile_ignore_fields(v)?,
    };

    let assertions_raw = obj
        .get("assertions")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request("spec.assertions must be an array"))?;

    let assertions = assertions_raw
        .iter()
        .map(compile_assertion)
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledSpec {
        version: version.to_string(),
        strict,
        ignore_fields,
        assertions,
    })
}

fn compile_ignore_fields(v: &Value) -> Result<IgnoreFields> {
    let obj = v
        .as_object()
        .ok_or_else(|| bad_request("ignore_fields must be an object"))?;

    let mut global = Vec::new();
    let mut per_entity = HashMap::new();
    for (key, val) in obj {
        let cols = string_array(val, &format!("ignore_fields.{key}"))?;
        if key == "global" {
            global = cols;
        } else {
            per_entity.insert(key.clone(), cols);
        }
    }
    Ok(IgnoreFields { global, per_entity })
}

fn compile_assertion(v: &Value) -> Result<Assertion> {
    let obj = v
        .as_object()
        .ok_or_else(|| bad_request("assertion must be an object"))?;

    let diff_type = obj
        .get("diff_type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("assertion.diff_type is required"))?;

    let entity = obj
        .get("entity")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("assertion.entity is required"))?
        .to_string();

    let where_ = match obj.get("where") {
        None => WhereClause::new(),
        Some(w) => compile_where(w)?,
    };

    let ignore = match obj.get("ignore") {
        None => Vec::new(),
        Some(v) => string_array(v, "assertion.ignore")?,
    };

    let expected_count = obj.get("expected_count").map(compile_expected_count).transpose()?;

    match diff_type {
        "added" => {
            reject_unknown_keys(obj, &["diff_type", "entity", "where", "ignore", "expected_count"])?;
            Ok(Assertion::Added {
                entity,
                where_,
                ignore,
                expected_count,
            })
        }
        "removed" => {
            reject_unknown_keys(obj, &["diff_type", "entity", "where", "ignore", "expected_count"])?;
            Ok(Assertion::Removed {
                entity,
                where_,
                ignore,
                expected_count,
            })
        }
        "changed" => {
            reject_unknown_keys(
                obj,
                &[
                    "diff_type",
                    "entity",
                    "where",
                    "expected_changes",
                    "ignore",
                    "expected_count",
                ],
            )?;
            let expected_changes_raw = obj
                .get("expected_changes")
                .ok_or_else(|| bad_request("changed assertion requires expected_changes"))?;
            let expected_changes = compile_expected_changes(expected_changes_raw)?;
            Ok(Assertion::Changed {
                entity,
                where_,
                expected_changes,
                ignore,
                expected_count,
            })
        }
        "unchanged" => {
            reject_unknown_keys(obj, &["diff_type", "entity", "where", "expected_count"])?;
            Ok(Assertion::Unchanged {
                entity,
                where_,
                expected_count,
            })
        }
        other => Err(bad_request(&format!("unknown diff_type '{other}'"))),
    }
}

fn compile_where(v: &Value) -> Result<WhereClause> {
    let obj = v.as_object().ok_or_else(|| bad_request("where must be an object"))?;
    obj.iter()
        .map(|(field, pred)| Ok((field.clone(), compile_predicate(pred)?)))
        .collect()
}

fn compile_expected_changes(v: &Value) -> Result<HashMap<String, FieldChange>> {
    let obj = v
        .as_object()
        .ok_or_else(|| bad_request("expected_changes must be an object"))?;

    obj.iter()
        .map(|(field, entry)| {
            let change = match entry {
                // A bare scalar as expected_changes[field] normalizes to {to: {eq: value}}.
                Value::Object(inner) if inner.contains_key("from") || inner.contains_key("to") => {
                    reject_unknown_keys(inner, &["from", "to"])?;
                    FieldChange {
                        from: inner.get("from").map(compile_predicate).transpose()?,
                        to: inner.get("to").map(compile_predicate).transpose()?,
                    }
                }
                scalar => FieldChange {
                    from: None,
                    to: Some(compile_predicate(scalar)?),
                },
            };
            Ok((field.clone(), change))
        })
        .collect()
}

/// A predicate position accepts either `{op: value}` or a bare scalar, which
/// normalizes to `{eq: value}`.
fn compile_predicate(v: &Value) -> Result<Predicate> {
    let Value::Object(obj) = v else {
        return Ok(Predicate::Eq(v.clone()));
    };

    if obj.len() != 1 {
        return Err(bad_request(
            "predicate object must contain exactly one operator",
        ));
    }
    let (op, arg) = obj.iter().next().expect("len checked above");
    if !Predicate::OPERATORS.contains(&op.as_str()) {
        return Err(bad_request(&format!("unknown predicate operator '{op}'")));
    }

    Ok(match op.as_str() {
        "eq" => Predicate::Eq(arg.clone()),
        "ne" => Predicate::Ne(arg.clone()),
        "in" => Predicate::In(array(arg, "in")?),
        "not_in" => Predicate::NotIn(array(arg, "not_in")?),
        "contains" => Predicate::Contains(arg.clone()),
        "not_contains" => Predicate::NotContains(arg.clone()),
        "i_contains" => Predicate::IContains(string(arg, "i_contains")?),
        "starts_with" => Predicate::StartsWith(string(arg, "starts_with")?),
        "ends_with" => Predicate::EndsWith(string(arg, "ends_with")?),
        "i_starts_with" => Predicate::IStartsWith(string(arg, "i_starts_with")?),
        "i_ends_with" => Predicate::IEndsWith(string(arg, "i_ends_with")?),
        "regex" => Predicate::Regex(string(arg, "regex")?),
        "gt" => Predicate::Gt(arg.clone()),
        "gte" => Predicate::Gte(arg.clone()),
        "lt" => Predicate::Lt(arg.clone()),
        "lte" => Predicate::Lte(arg.clone()),
        "exists" => Predicate::Exists(arg.as_bool().ok_or_else(|| bad_request("exists must be a boolean"))?),
        "has_any" => Predicate::HasAny(array(arg, "has_any")?),
        "has_all" => Predicate::HasAll(array(arg, "has_all")?),
        _ => unreachable!("operator checked against Predicate::OPERATORS above"),
    })
}

fn compile_expected_count(v: &Value) -> Result<ExpectedCount> {
    if let Some(n) = v.as_i64() {
        return Ok(ExpectedCount::Exact(n));
    }
    let obj = v
        .as_object()
        .ok_or_else(|| bad_request("expected_count must be an integer or {min?, max?}"))?;
    reject_unknown_keys(obj, &["min", "max"])?;
    let min = obj.get("min").map(|v| v.as_i64().ok_or_else(|| bad_request("min must be an integer"))).transpose()?;
    let max = obj.get("max").map(|v| v.as_i64().ok_or_else(|| bad_request("max must be an integer"))).transpose()?;
    Ok(ExpectedCount::Range { min, max })
}

fn array(v: &Value, field: &str) -> Result<Vec<Value>> {
    v.as_array()
        .cloned()
        .ok_or_else(|| bad_request(&format!("{field} requires an array argument")))
}

fn string(v: &Value, field: &str) -> Result<String> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| bad_request(&format!("{field} requires a string argument")))
}

fn string_array(v: &Value, field: &str) -> Result<Vec<String>> {
    v.as_array()
        .ok_or_else(|| bad_request(&format!("{field} must be an array of strings")))?
        .iter()
        .map(|item| string(item, field))
        .collect()
}

fn reject_unknown_keys(obj: &serde_json::Map<String, Value>, allowed: &[&str]) -> Result<()> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(bad_request(&format!("unknown key '{key}'")));
        }
    }
    Ok(())
}

fn bad_request(msg: &str) -> Error {
    Error::BadRequest(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_minimal_added_assertion() {
        let raw = json!({
            "version": "0.1",
            "assertions": [
                { "diff_type": "added", "entity": "messages", "where": { "channel_id": "C01" } }
            ]
        });
        let spec = compile(&raw).unwrap();
        assert!(spec.strict);
        assert_eq!(spec.assertions.len(), 1);
        match &spec.assertions[0] {
            Assertion::Added { where_, .. } => {
                assert_eq!(where_.get("channel_id"), Some(&Predicate::Eq(json!("C01"))));
            }
            _ => panic!("expected Added"),
        }
    }

    #[test]
    fn bare_scalar_in_expected_changes_normalizes_to_to_eq() {
        let raw = json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "changed",
                "entity": "channels",
                "expected_changes": { "topic_text": "Weekly standup" }
            }]
        });
        let spec = compile(&raw).unwrap();
        match &spec.assertions[0] {
            Assertion::Changed { expected_changes, .. } => {
                let change = expected_changes.get("topic_text").unwrap();
                assert_eq!(change.from, None);
                assert_eq!(change.to, Some(Predicate::Eq(json!("Weekly standup"))));
            }
            _ => panic!("expected Changed"),
        }
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let raw = json!({
            "version": "0.1",
            "assertions": [{
                "diff_type": "added",
                "entity": "messages",
                "where": { "channel_id": { "matches_regex": "x" } }
            }]
        });
        assert!(compile(&raw).is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let raw = json!({ "version": "9.9", "assertions": [] });
        assert!(compile(&raw).is_err());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let raw = json!({ "version": "0.1", "assertions": [], "bogus": true });
        assert!(compile(&raw).is_err());
    }

    #[test]
    fn compile_is_idempotent_on_already_normalized_documents() {
        let raw = json!({
            "version": "0.1",
            "assertions": [
                { "diff_type": "unchanged", "entity": "messages", "expected_count": { "min": 0 } }
            ]
        });
        let once = compile(&raw).unwrap();
        let twice = compile(&raw).unwrap();
        assert_eq!(once, twice);
    }
}
