use serde_json::Value;
use tracing::debug;

use crate::application::format::number_string;
use crate::domain::{
    change_record::{ChangeRecord, Operation, Snapshot},
    field_change::{FieldChange, RecordDiff},
    ports::ChangeDiffer,
};

// ─── Record Differ (implementation of the port) ───

#[derive(Default)]
pub struct RecordDiffer;

impl RecordDiffer {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeDiffer for RecordDiffer {
    fn diff(&self, record: &ChangeRecord) -> RecordDiff {
        let changes = match (record.operation, record.after_data.as_ref()) {
            (Operation::Update, Some(after)) => diff_snapshots(record.before_data.as_ref(), after),
            (_, Some(after)) => after
                .iter()
                .map(|(key, value)| FieldChange {
                    key: key.clone(),
                    before: None,
                    after: value.clone(),
                })
                .collect(),
            (op, None) => {
                debug!(
                    record_id = record.id,
                    operation = %op,
                    "no after_data, nothing to render"
                );
                Vec::new()
            }
        };

        RecordDiff {
            record_id: record.id,
            operation: record.operation,
            changes,
        }
    }
}

// ─── Snapshot comparison ───

/// Fields of `after` whose canonical form differs from `before`.
///
/// Only keys of `after` are visited, in `after` order: a key that exists only
/// in `before` is never reported.
fn diff_snapshots(before: Option<&Snapshot>, after: &Snapshot) -> Vec<FieldChange> {
    after
        .iter()
        .filter_map(|(key, after_val)| {
            let before_val = before.and_then(|b| b.get(key));
            if values_equal(before_val, after_val) {
                return None;
            }
            Some(FieldChange {
                key: key.clone(),
                before: before_val.cloned(),
                after: after_val.clone(),
            })
        })
        .collect()
}

/// An absent value never equals a present one, not even `null`.
fn values_equal(before: Option<&Value>, after: &Value) -> bool {
    match before {
        None => false,
        Some(b) => canonical_json(b) == canonical_json(after),
    }
}

/// Serialise `v` with object keys sorted and integral floats printed as
/// integers, so `1` and `1.0`, or `{a,b}` and `{b,a}`, compare equal.
fn canonical_json(v: &Value) -> String {
    let mut out = String::new();
    write_canonical(v, &mut out);
    out
}

fn write_canonical(v: &Value, out: &mut String) {
    match v {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => out.push_str(&number_string(f)),
            _ => out.push_str(&n.to_string()),
        },
        Value::Array(arr) => {
            out.push('[');
            for (i, el) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(el, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(k, _)| *k);
            out.push('{');
            for (i, (k, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn snapshot(v: Value) -> Snapshot {
        match v {
            Value::Object(map) => map,
            _ => panic!("snapshot must be an object"),
        }
    }

    fn record(op: Operation, before: Option<Value>, after: Option<Value>) -> ChangeRecord {
        ChangeRecord {
            id: 1,
            table_name: "apartment".into(),
            operation: op,
            user: json!("admin"),
            before_data: before.map(snapshot),
            after_data: after.map(snapshot),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn keys(diff: &RecordDiff) -> Vec<&str> {
        diff.changes.iter().map(|c| c.key.as_str()).collect()
    }

    // ── canonical_json ──

    #[test]
    fn canonical_ignores_object_key_order() {
        assert_eq!(
            canonical_json(&json!({"a": 1, "b": [1, 2]})),
            canonical_json(&json!({"b": [1, 2], "a": 1}))
        );
    }

    #[test]
    fn canonical_treats_integral_float_as_integer() {
        assert_eq!(canonical_json(&json!(1.0)), canonical_json(&json!(1)));
        assert_ne!(canonical_json(&json!(1.5)), canonical_json(&json!(1)));
    }

    #[test]
    fn canonical_keeps_types_apart() {
        assert_ne!(canonical_json(&json!("1")), canonical_json(&json!(1)));
        assert_ne!(canonical_json(&json!(false)), canonical_json(&json!(0)));
    }

    // ── RecordDiffer ──

    #[test]
    fn update_emits_only_changed_fields() {
        let rec = record(
            Operation::Update,
            Some(json!({"price": 100, "title": "A"})),
            Some(json!({"price": 150, "title": "A"})),
        );
        let diff = RecordDiffer::new().diff(&rec);
        assert_eq!(
            diff.changes,
            vec![FieldChange {
                key: "price".into(),
                before: Some(json!(100)),
                after: json!(150),
            }]
        );
        assert!(diff.is_side_by_side());
    }

    #[test]
    fn update_follows_after_data_key_order() {
        let rec = record(
            Operation::Update,
            Some(json!({"a": 1, "z": 1, "m": 1})),
            Some(json!({"z": 2, "a": 2, "m": 2})),
        );
        assert_eq!(keys(&RecordDiffer::new().diff(&rec)), vec!["z", "a", "m"]);
    }

    #[test]
    fn update_ignores_keys_removed_from_after() {
        let rec = record(
            Operation::Update,
            Some(json!({"price": 1, "gone": true})),
            Some(json!({"price": 1})),
        );
        assert!(RecordDiffer::new().diff(&rec).is_empty());
    }

    #[test]
    fn update_reports_new_key_even_when_null() {
        let rec = record(
            Operation::Update,
            Some(json!({"price": 1})),
            Some(json!({"price": 1, "metro": null})),
        );
        let diff = RecordDiffer::new().diff(&rec);
        assert_eq!(keys(&diff), vec!["metro"]);
        assert_eq!(diff.changes[0].before, None);
    }

    #[test]
    fn update_compares_nested_values_structurally() {
        let rec = record(
            Operation::Update,
            Some(json!({"meta": {"a": 1, "b": 2}, "tags": [1, 2]})),
            Some(json!({"meta": {"b": 2, "a": 1}, "tags": [2, 1]})),
        );
        assert_eq!(keys(&RecordDiffer::new().diff(&rec)), vec!["tags"]);
    }

    #[test]
    fn update_without_before_reports_every_field() {
        let rec = record(Operation::Update, None, Some(json!({"a": 1, "b": null})));
        assert_eq!(keys(&RecordDiffer::new().diff(&rec)), vec!["a", "b"]);
    }

    #[test]
    fn create_lists_all_after_fields_without_before() {
        let rec = record(
            Operation::Create,
            None,
            Some(json!({"title": "New", "price": 10, "furnished": false})),
        );
        let diff = RecordDiffer::new().diff(&rec);
        assert_eq!(keys(&diff), vec!["title", "price", "furnished"]);
        assert!(diff.changes.iter().all(|c| c.before.is_none()));
        assert!(!diff.is_side_by_side());
    }

    #[test]
    fn delete_without_after_data_is_empty() {
        let rec = record(Operation::Delete, Some(json!({"id": 1})), None);
        assert!(RecordDiffer::new().diff(&rec).is_empty());
    }

    #[test]
    fn update_without_after_data_is_empty() {
        let rec = record(Operation::Update, Some(json!({"id": 1})), None);
        assert!(RecordDiffer::new().diff(&rec).is_empty());
    }
}
