use std::sync::Arc;

use cori_core::{DataLoader, FilterOutcome, FilterSelection, Record, apply_filters};
use cori_types::AppConfig;
use tokio::sync::RwLock;

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in cori-core.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    /// None when no data source could be configured at launch
    loader: Option<Arc<DataLoader>>,
    /// Requested filters; unavailable year/month fall back at apply time
    pub selection: Arc<RwLock<FilterSelection>>,
}

impl CliContext {
    pub fn new(config: AppConfig, loader: Option<DataLoader>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            loader: loader.map(Arc::new),
            selection: Arc::new(RwLock::new(FilterSelection::default())),
        }
    }

    pub fn loader(&self) -> Result<&DataLoader, String> {
        self.loader.as_deref().ok_or_else(|| {
            "No data source configured. Use --snapshot, --db-url or set CORI_DB_URL.\n"
                .to_string()
        })
    }

    /// Cached records, fetching when the cache is empty or expired.
    pub async fn records(&self) -> Result<Arc<[Record]>, String> {
        self.loader()?
            .load()
            .await
            .map_err(|e| format!("Failed to load data: {}\n", error_chain(&e)))
    }

    /// Run the filter chain over the current records and selection.
    pub async fn outcome(&self) -> Result<FilterOutcome, String> {
        let records = self.records().await?;
        let selection = self.selection.read().await.clone();
        Ok(apply_filters(&records, &selection))
    }
}

/// Error message with its `source()` chain joined by ": ".
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
