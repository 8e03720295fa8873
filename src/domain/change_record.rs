use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row's field values at one point in time, in the key order the backend
/// sent them.
pub type Snapshot = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// One audit-log row. Server-owned and append-only: the client only pages
/// through these and renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: i64,
    pub table_name: String,
    pub operation: Operation,
    /// Display name or id of the user who made the change, as sent by the backend.
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub before_data: Option<Snapshot>,
    #[serde(default)]
    pub after_data: Option<Snapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// The user column rendered as plain text.
    pub fn user_label(&self) -> String {
        match &self.user {
            Value::Null => "—".to_string(),
            Value::String(s) => s.clone(),
            Value::Object(map) => ["full_name", "username", "phone", "id"]
                .iter()
                .find_map(|k| map.get(*k).filter(|v| !v.is_null()))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "—".to_string()),
            other => other.to_string(),
        }
    }
}
