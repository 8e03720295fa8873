use anyhow::Result;
use std::sync::{Arc, Mutex};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of brokerdesk's internal tracing output.
///
/// | Variant | `tracing` level | When to use                              |
/// |---------|-----------------|------------------------------------------|
/// | `Error` | `error`         | `--quiet` / scripting                    |
/// | `Info`  | `info`          | Default, one line per request            |
/// | `Debug` | `debug`         | `--verbose`, shows no-ops and cache hits |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber. `RUST_LOG` wins when set.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "brokerdesk=error",
        LogLevel::Info => "brokerdesk=info",
        LogLevel::Debug => "brokerdesk=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::changelog::ChangeLogService;
pub use application::diff::RecordDiffer;
pub use application::format::{format_currency, format_datetime, format_value};
pub use application::media::{MediaEdit, MediaEditor};
pub use application::monitoring::PerfReport;
pub use application::session::Session;
pub use application::store::EntityStore;
pub use domain::change_log::{ChangeLogPage, ChangeLogQuery};
pub use domain::change_record::{ChangeRecord, Operation};
pub use domain::error::{ApiError, Detail, FieldErrors};
pub use domain::field_change::{FieldChange, RecordDiff};
pub use domain::page::PageRequest;
pub use domain::pagination::{page_window, PageItem};
pub use domain::ports::{ChangeDiffer, TokenStore, Transport};
pub use infrastructure::config::{ApiConfig, AppConfig, OutputConfig, SessionConfig};

use crate::application::accounting::AccountingService;
use crate::application::monitoring::MonitoringTransport;
use crate::infrastructure::http::HttpClient;
use crate::infrastructure::token_store::FileTokenStore;

// ─── Backend handle ───

/// Everything a command needs to talk to the backend: a monitored HTTP
/// transport, the token store it reads from and the shared timing report.
#[derive(Clone)]
pub struct Backend {
    pub transport: Arc<dyn Transport>,
    pub tokens: Arc<dyn TokenStore>,
    report: Arc<Mutex<PerfReport>>,
    page_size: u32,
}

/// Build a [`Backend`] with the token file configured in `cfg.session`.
pub fn connect(cfg: &AppConfig) -> Result<Backend> {
    let tokens: Arc<dyn TokenStore> =
        Arc::new(FileTokenStore::new(cfg.session.resolved_token_path()));
    connect_with(cfg, tokens)
}

/// Same as [`connect`] with a caller-provided token store.
pub fn connect_with(cfg: &AppConfig, tokens: Arc<dyn TokenStore>) -> Result<Backend> {
    let report = PerfReport::new();
    let http = Arc::new(HttpClient::new(&cfg.api, Arc::clone(&tokens))?);
    let transport: Arc<dyn Transport> =
        Arc::new(MonitoringTransport::new(http, Arc::clone(&report)));
    Ok(Backend {
        transport,
        tokens,
        report,
        page_size: cfg.api.page_size,
    })
}

impl Backend {
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.transport), Arc::clone(&self.tokens))
    }

    pub fn change_log(&self) -> ChangeLogService {
        ChangeLogService::new(
            Arc::clone(&self.transport),
            Arc::new(RecordDiffer::new()),
            self.page_size,
        )
    }

    pub fn accounting(&self) -> AccountingService {
        AccountingService::new(Arc::clone(&self.transport))
    }

    pub fn media_editor(&self) -> MediaEditor {
        MediaEditor::new(Arc::clone(&self.transport))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Snapshot of the request timings collected so far.
    pub fn perf(&self) -> PerfReport {
        self.report
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

// ─── Public entry points ───

/// Fetch and diff one page of the change log.
pub async fn change_log_page(
    cfg: &AppConfig,
    page: u32,
    filter: &ChangeLogQuery,
) -> Result<(ChangeLogPage, PerfReport)> {
    let backend = connect(cfg)?;
    let result = backend.change_log().page(page, filter).await?;
    Ok((result, backend.perf()))
}
