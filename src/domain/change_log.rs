use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::change_record::{ChangeRecord, Operation};
use crate::domain::field_change::RecordDiff;
use crate::domain::pagination::{page_window, PageItem};

/// A change record together with its computed diff.
#[derive(Debug, Serialize, Clone)]
pub struct ChangeEntry {
    pub record: ChangeRecord,
    pub diff: RecordDiff,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub changed_fields: usize,
}

/// One server-side page of the audit log, diffed and ready to render.
#[derive(Debug, Serialize, Clone)]
pub struct ChangeLogPage {
    pub report_id: String,
    pub generated_at: String,
    pub page: u32,
    pub total_pages: u32,
    /// Total number of records across all pages.
    pub count: u64,
    pub window: Vec<PageItem>,
    pub entries: Vec<ChangeEntry>,
    pub summary: Summary,
}

impl ChangeLogPage {
    pub fn new(page: u32, total_pages: u32, count: u64, entries: Vec<ChangeEntry>) -> Self {
        let count_op = |op: Operation| entries.iter().filter(|e| e.record.operation == op).count();
        let summary = Summary {
            creates: count_op(Operation::Create),
            updates: count_op(Operation::Update),
            deletes: count_op(Operation::Delete),
            changed_fields: entries.iter().map(|e| e.diff.changes.len()).sum(),
        };

        ChangeLogPage {
            report_id: format!(
                "cl_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            generated_at: Utc::now().to_rfc3339(),
            page,
            total_pages,
            count,
            window: page_window(page, total_pages),
            entries,
            summary,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Server-side filters for the change-log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLogQuery {
    pub table_name: Option<String>,
    pub operation: Option<Operation>,
    pub user: Option<String>,
}

impl ChangeLogQuery {
    pub fn query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        if let Some(t) = &self.table_name {
            q.push(("table_name".to_string(), t.clone()));
        }
        if let Some(op) = self.operation {
            q.push(("operation".to_string(), op.as_str().to_string()));
        }
        if let Some(u) = &self.user {
            q.push(("user".to_string(), u.clone()));
        }
        q
    }
}
