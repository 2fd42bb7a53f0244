//! Error types for loading and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors while fetching the record set. Any of these aborts the current load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data source configured (set CORI_DB_URL, database_url or snapshot_path)")]
    MissingSource,

    #[error("invalid table name '{name}'")]
    InvalidTable { name: String },

    #[error("failed to connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("query against {table} failed")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to read snapshot {path}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: datafusion::error::DataFusionError,
    },

    #[error("table {table} has no '{column}' column")]
    MissingColumn { table: String, column: String },

    #[error("failed to list columns of {table}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("unexpected column layout in snapshot: {detail}")]
    Decode { detail: String },
}

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),

    #[error("unknown setting '{0}' (expected one of: {keys})", keys = crate::config::SETTING_KEYS.join(", "))]
    UnknownSetting(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidSetting { key: String, value: String },
}
