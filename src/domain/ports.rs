use crate::domain::{
    change_log::ChangeLogPage, change_record::ChangeRecord, error::ApiError,
    field_change::RecordDiff, request::ApiRequest,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Port: one round trip to the backend (implemented by HttpClient)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the decoded JSON body (`Null` when empty).
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

/// Port: where the bearer token lives between runs (implemented by
/// FileTokenStore, MemoryTokenStore)
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Port: change-record diff algorithm (implemented by RecordDiffer)
pub trait ChangeDiffer: Send + Sync {
    fn diff(&self, record: &ChangeRecord) -> RecordDiff;
}

/// Port: output formatting (implemented by JsonWriter, HtmlWriter)
pub trait OutputWriter: Send + Sync {
    /// Serializes the change-log page to a string (JSON, HTML)
    fn format(&self, page: &ChangeLogPage) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "html")
    fn extension(&self) -> &'static str;
}
