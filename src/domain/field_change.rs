use serde::Serialize;
use serde_json::Value;

use crate::domain::change_record::Operation;

/// One changed field of a change record.
///
/// `before` is `None` when the field had no previous value at all (every field
/// of a CREATE, or a key that is new in `after_data`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub key: String,
    pub before: Option<Value>,
    pub after: Value,
}

/// The diff of a single change record, ready to be laid out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDiff {
    pub record_id: i64,
    pub operation: Operation,
    /// Rendered in `after_data` key order.
    pub changes: Vec<FieldChange>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// CREATE renders as a single flat listing, UPDATE as two columns.
    pub fn is_side_by_side(&self) -> bool {
        self.operation == Operation::Update
    }
}
