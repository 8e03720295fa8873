use std::sync::Arc;
use tracing::debug;

use crate::domain::{
    change_log::{ChangeEntry, ChangeLogPage, ChangeLogQuery},
    change_record::ChangeRecord,
    error::ApiError,
    page::{total_pages, Page, PageRequest},
    ports::{ChangeDiffer, Transport},
    request::{call, ApiRequest},
};

pub const CHANGES_PATH: &str = "changes/";

// ─────────────────────────────────────────────────────────────────────────────
// ChangeLogService
// ─────────────────────────────────────────────────────────────────────────────

/// Pages through the audit log and diffs every record on the page.
///
/// Pagination is server-side: each call asks the backend for exactly one page
/// of `page_size` records.
pub struct ChangeLogService {
    transport: Arc<dyn Transport>,
    differ: Arc<dyn ChangeDiffer>,
    page_size: u32,
}

impl ChangeLogService {
    pub fn new(transport: Arc<dyn Transport>, differ: Arc<dyn ChangeDiffer>, page_size: u32) -> Self {
        Self {
            transport,
            differ,
            page_size: page_size.max(1),
        }
    }

    pub async fn page(&self, page: u32, filter: &ChangeLogQuery) -> Result<ChangeLogPage, ApiError> {
        let request = PageRequest::new(page, self.page_size);
        let mut query = request.query();
        query.extend(filter.query());

        let fetched: Page<ChangeRecord> = call(
            self.transport.as_ref(),
            ApiRequest::get(CHANGES_PATH).with_query(query),
        )
        .await?;

        let entries: Vec<ChangeEntry> = fetched
            .items
            .into_iter()
            .map(|record| ChangeEntry {
                diff: self.differ.diff(&record),
                record,
            })
            .collect();

        let pages = total_pages(fetched.count, self.page_size);
        debug!(page = request.page, pages, records = entries.len(), "change log page loaded");
        Ok(ChangeLogPage::new(request.page, pages, fetched.count, entries))
    }
}
