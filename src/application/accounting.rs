use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{
    accounting::{AccountingFilter, AccountingRecord, AccountingReport, AccountingStats},
    error::ApiError,
    page::Page,
    ports::Transport,
    request::{call, ApiRequest},
};

pub const RECORDS_PATH: &str = "accounting/records/";
pub const STATS_PATH: &str = "accounting/stats/";

/// Loads the accounting screen: the record list and the summary statistics,
/// requested concurrently and only returned together.
pub struct AccountingService {
    transport: Arc<dyn Transport>,
}

impl AccountingService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Either both requests succeed or the whole load fails; partial
    /// statistics are never returned.
    pub async fn load(&self, filter: &AccountingFilter) -> Result<AccountingReport, ApiError> {
        let query = filter.query();
        let records_req = ApiRequest::get(RECORDS_PATH).with_query(query.clone());
        let stats_req = ApiRequest::get(STATS_PATH).with_query(query);

        let (records, stats) = tokio::try_join!(
            call::<Page<AccountingRecord>>(self.transport.as_ref(), records_req),
            call::<AccountingStats>(self.transport.as_ref(), stats_req),
        )
        .map_err(|e| {
            warn!(error = %e, "accounting load failed");
            e
        })?;

        info!(records = records.items.len(), "accounting loaded");
        Ok(AccountingReport {
            records: records.items,
            stats,
        })
    }
}
