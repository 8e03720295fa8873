use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::application::format::{format_optional, format_value};
use crate::domain::{
    change_log::{ChangeEntry, ChangeLogPage, Summary},
    change_record::Operation,
    pagination::PageItem,
    ports::OutputWriter,
};

// ─── JSON view model ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonPage<'a> {
    report_id: &'a str,
    generated_at: &'a str,
    page: u32,
    total_pages: u32,
    count: u64,
    window: &'a [PageItem],
    summary: &'a Summary,
    records: Vec<JsonRecord<'a>>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    id: i64,
    table_name: &'a str,
    operation: Operation,
    user: String,
    created_at: String,
    changes: Vec<JsonChange<'a>>,
}

/// Raw values plus the text an operator would see.
#[derive(Serialize)]
struct JsonChange<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    before: Option<&'a Value>,
    after: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    before_display: Option<String>,
    after_display: String,
}

fn build_record(entry: &ChangeEntry) -> JsonRecord<'_> {
    let side_by_side = entry.diff.is_side_by_side();
    JsonRecord {
        id: entry.record.id,
        table_name: &entry.record.table_name,
        operation: entry.record.operation,
        user: entry.record.user_label(),
        created_at: entry.record.created_at.to_rfc3339(),
        changes: entry
            .diff
            .changes
            .iter()
            .map(|c| JsonChange {
                key: &c.key,
                before: c.before.as_ref(),
                after: &c.after,
                before_display: side_by_side.then(|| format_optional(&c.key, c.before.as_ref())),
                after_display: format_value(&c.key, &c.after),
            })
            .collect(),
    }
}

// ─── Writer ───────────────────────────────────────────────────────────────────

pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, page: &ChangeLogPage) -> Result<String> {
        let view = JsonPage {
            report_id: &page.report_id,
            generated_at: &page.generated_at,
            page: page.page,
            total_pages: page.total_pages,
            count: page.count,
            window: &page.window,
            summary: &page.summary,
            records: page.entries.iter().map(build_record).collect(),
        };

        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
