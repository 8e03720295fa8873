use anyhow::Result;
use sailfish::TemplateOnce;

use crate::application::format::{format_optional, format_value};
use crate::domain::{
    change_log::{ChangeEntry, ChangeLogPage},
    pagination::PageItem,
    ports::OutputWriter,
};

struct FieldView {
    key: String,
    before: String,
    after: String,
}

struct RecordView {
    id: i64,
    table_name: String,
    operation: &'static str,
    user: String,
    created_at: String,
    side_by_side: bool,
    fields: Vec<FieldView>,
}

fn record_view(entry: &ChangeEntry) -> RecordView {
    RecordView {
        id: entry.record.id,
        table_name: entry.record.table_name.clone(),
        operation: entry.record.operation.as_str(),
        user: entry.record.user_label(),
        created_at: format_value(
            "created_at",
            &serde_json::Value::String(entry.record.created_at.to_rfc3339()),
        ),
        side_by_side: entry.diff.is_side_by_side(),
        fields: entry
            .diff
            .changes
            .iter()
            .map(|c| FieldView {
                key: c.key.clone(),
                before: format_optional(&c.key, c.before.as_ref()),
                after: format_value(&c.key, &c.after),
            })
            .collect(),
    }
}

#[derive(TemplateOnce)]
#[template(path = "change_log.stpl")] // base dir declared inside sailfish.toml
struct ChangeLogTemplate<'a> {
    page: &'a ChangeLogPage,
    records: Vec<RecordView>,
}

pub struct HtmlWriter;

impl OutputWriter for HtmlWriter {
    fn format(&self, page: &ChangeLogPage) -> Result<String> {
        let records = page.entries.iter().map(record_view).collect();
        Ok(ChangeLogTemplate { page, records }.render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diff::RecordDiffer;
    use crate::domain::change_record::ChangeRecord;
    use crate::domain::ports::ChangeDiffer;
    use serde_json::json;

    fn page_of(records: serde_json::Value, page: u32, total: u32) -> ChangeLogPage {
        let records: Vec<ChangeRecord> = serde_json::from_value(records).unwrap();
        let differ = RecordDiffer::new();
        let entries = records
            .into_iter()
            .map(|record| ChangeEntry {
                diff: differ.diff(&record),
                record,
            })
            .collect();
        ChangeLogPage::new(page, total, u64::from(total) * 10, entries)
    }

    #[test]
    fn update_renders_two_columns_and_escapes_values() {
        let page = page_of(
            json!([{
                "id": 4, "table_name": "clients", "operation": "UPDATE", "user": "admin",
                "before_data": {"full_name": "<b>Old</b>"},
                "after_data": {"full_name": "New"},
                "created_at": "2026-10-16T09:30:00Z", "updated_at": "2026-10-16T09:30:00Z"
            }]),
            5,
            10,
        );
        let html = HtmlWriter.format(&page).unwrap();

        assert!(html.contains("class=\"before\""));
        assert!(html.contains("&lt;b&gt;Old&lt;/b&gt;"));
        assert!(!html.contains("<b>Old</b>"));
        assert!(html.contains("16 октября 2026 г. в 14:30"));
        assert!(html.contains("<span class=\"current\">5</span>"));
        assert!(html.contains("…"));
    }

    #[test]
    fn create_renders_flat_listing() {
        let page = page_of(
            json!([{
                "id": 1, "table_name": "district", "operation": "CREATE", "user": "root",
                "before_data": null, "after_data": {"name": "Mirobod"},
                "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
            }]),
            1,
            1,
        );
        let html = HtmlWriter.format(&page).unwrap();
        assert!(html.contains("Mirobod"));
        assert!(!html.contains("class=\"before\""));
    }
}
