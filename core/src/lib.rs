pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod echarts;
pub mod error;
pub mod filter;
pub mod format;
pub mod record;
pub mod source;

// Re-exports for convenience
pub use cache::{CacheEntry, DataLoader};
pub use config::{AppConfigExt, SourceChoice, SourceOverrides, apply_setting, build_loader};
pub use dashboard::build_dashboard;
pub use echarts::chart_option;
pub use error::{ConfigError, LoadError};
pub use filter::{FilterOutcome, FilterSelection, apply_filters};
pub use record::{Measure, RawRecord, Record};
pub use source::{MemorySource, MySqlSource, RecordSource, SnapshotInput, SnapshotSource};
