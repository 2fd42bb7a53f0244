//! Configuration persistence and data source selection.

use std::path::PathBuf;
use std::time::Duration;

use cori_types::AppConfig;

use crate::cache::DataLoader;
use crate::error::{ConfigError, LoadError};
use crate::source::{
    MySqlSource, RecordSource, SnapshotInput, SnapshotSource, validate_table_name,
};

const APP_NAME: &str = "cori";
const CONFIG_NAME: &str = "config";

/// Environment variable holding the MySQL URL; beats the config file.
pub const DB_URL_ENV: &str = "CORI_DB_URL";

pub trait AppConfigExt: Sized {
    fn load() -> Result<Self, ConfigError>;
    /// Load, falling back to defaults when the file cannot be read
    fn load_or_default() -> Self;
    fn save(&self) -> Result<(), ConfigError>;
    fn config_path() -> Option<PathBuf>;
    fn cache_ttl(&self) -> Duration;
    fn connect_timeout(&self) -> Duration;
}

impl AppConfigExt for AppConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            Self::default()
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Keys accepted by [`apply_setting`]
pub const SETTING_KEYS: [&str; 6] = [
    "database_url",
    "snapshot_path",
    "table",
    "cache_ttl_secs",
    "connect_timeout_secs",
    "factory_name",
];

/// Set one field of `config` from its textual value. An empty or `-` value
/// clears the optional source fields.
pub fn apply_setting(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    };
    let value = value.trim();
    let cleared = value.is_empty() || value == "-";
    match key {
        "database_url" => {
            config.database_url = (!cleared).then(|| value.to_string());
        }
        "snapshot_path" => {
            config.snapshot_path = (!cleared).then(|| PathBuf::from(value));
        }
        "table" => {
            validate_table_name(value).map_err(|_| invalid())?;
            config.table = value.to_string();
        }
        "cache_ttl_secs" => {
            config.cache_ttl_secs = value.parse().map_err(|_| invalid())?;
        }
        "connect_timeout_secs" => {
            config.connect_timeout_secs = value.parse().map_err(|_| invalid())?;
        }
        "factory_name" => {
            if value.is_empty() {
                return Err(invalid());
            }
            config.factory_name = value.to_string();
        }
        other => return Err(ConfigError::UnknownSetting(other.to_string())),
    }
    Ok(())
}

/// Launch-time overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub snapshot: Option<PathBuf>,
    pub database_url: Option<String>,
}

/// Where records will be read from after applying precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    Snapshot(PathBuf),
    Database(String),
}

/// Precedence: flags, then environment, then config file. A snapshot at any
/// level wins over a database URL at the same level.
pub fn choose_source(
    config: &AppConfig,
    overrides: &SourceOverrides,
    env_url: Option<String>,
) -> Result<SourceChoice, LoadError> {
    if let Some(path) = &overrides.snapshot {
        return Ok(SourceChoice::Snapshot(path.clone()));
    }
    if let Some(url) = non_blank(overrides.database_url.clone()) {
        return Ok(SourceChoice::Database(url));
    }
    if let Some(url) = non_blank(env_url) {
        return Ok(SourceChoice::Database(url));
    }
    if let Some(path) = &config.snapshot_path {
        return Ok(SourceChoice::Snapshot(path.clone()));
    }
    if let Some(url) = non_blank(config.database_url.clone()) {
        return Ok(SourceChoice::Database(url));
    }
    Err(LoadError::MissingSource)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn build_source(
    config: &AppConfig,
    choice: SourceChoice,
) -> Result<Box<dyn RecordSource>, LoadError> {
    let source: Box<dyn RecordSource> = match choice {
        SourceChoice::Snapshot(path) => Box::new(SnapshotSource::new(
            SnapshotInput::from_path(path),
            config.table.clone(),
        )?),
        SourceChoice::Database(url) => Box::new(MySqlSource::new(
            url,
            config.table.clone(),
            config.connect_timeout(),
        )?),
    };
    tracing::info!(source = %source.describe(), "Data source selected");
    Ok(source)
}

/// Resolve the source from config, flags and `CORI_DB_URL`, and wrap it in a
/// caching loader.
pub fn build_loader(
    config: &AppConfig,
    overrides: &SourceOverrides,
) -> Result<DataLoader, LoadError> {
    let env_url = std::env::var(DB_URL_ENV).ok();
    let choice = choose_source(config, overrides, env_url)?;
    let source = build_source(config, choice)?;
    Ok(DataLoader::new(source, config.cache_ttl()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(db: Option<&str>, snapshot: Option<&str>) -> AppConfig {
        AppConfig {
            database_url: db.map(str::to_string),
            snapshot_path: snapshot.map(PathBuf::from),
            ..AppConfig::default()
        }
    }

    #[test]
    fn nothing_configured_is_missing_source() {
        let result = choose_source(&AppConfig::default(), &SourceOverrides::default(), None);
        assert!(matches!(result, Err(LoadError::MissingSource)));
    }

    #[test]
    fn blank_urls_are_ignored() {
        let config = config_with(Some("  "), None);
        let result = choose_source(&config, &SourceOverrides::default(), Some(String::new()));
        assert!(matches!(result, Err(LoadError::MissingSource)));
    }

    #[test]
    fn env_beats_config_file() {
        let config = config_with(Some("mysql://file@db/x"), Some("/tmp/a.parquet"));
        let choice = choose_source(
            &config,
            &SourceOverrides::default(),
            Some("mysql://env@db/x".to_string()),
        )
        .unwrap();
        assert_eq!(choice, SourceChoice::Database("mysql://env@db/x".to_string()));
    }

    #[test]
    fn flags_beat_env() {
        let overrides = SourceOverrides {
            snapshot: Some(PathBuf::from("/tmp/flag.csv")),
            database_url: Some("mysql://flag@db/x".to_string()),
        };
        let choice = choose_source(
            &AppConfig::default(),
            &overrides,
            Some("mysql://env@db/x".to_string()),
        )
        .unwrap();
        assert_eq!(choice, SourceChoice::Snapshot(PathBuf::from("/tmp/flag.csv")));
    }

    #[test]
    fn config_snapshot_beats_config_url() {
        let config = config_with(Some("mysql://file@db/x"), Some("/tmp/a.parquet"));
        let choice = choose_source(&config, &SourceOverrides::default(), None).unwrap();
        assert_eq!(choice, SourceChoice::Snapshot(PathBuf::from("/tmp/a.parquet")));
    }

    #[test]
    fn invalid_table_is_rejected_before_connecting() {
        let config = AppConfig {
            table: "oee; DROP TABLE x".to_string(),
            ..AppConfig::default()
        };
        let result = build_source(
            &config,
            SourceChoice::Database("mysql://u:p@localhost/db".to_string()),
        );
        assert!(matches!(result, Err(LoadError::InvalidTable { .. })));
    }

    #[test]
    fn settings_update_matching_fields() {
        let mut config = AppConfig::default();
        apply_setting(&mut config, "snapshot_path", "/data/oee.csv").unwrap();
        apply_setting(&mut config, "cache_ttl_secs", "60").unwrap();
        apply_setting(&mut config, "factory_name", "Cori Três Lagoas").unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/data/oee.csv")));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.factory_name, "Cori Três Lagoas");

        apply_setting(&mut config, "snapshot_path", "-").unwrap();
        assert_eq!(config.snapshot_path, None);
    }

    #[test]
    fn bad_settings_leave_config_untouched() {
        let mut config = AppConfig::default();
        assert!(matches!(
            apply_setting(&mut config, "cache_ttl_secs", "soon"),
            Err(ConfigError::InvalidSetting { .. })
        ));
        assert!(matches!(
            apply_setting(&mut config, "table", "x; DROP TABLE y"),
            Err(ConfigError::InvalidSetting { .. })
        ));
        assert!(matches!(
            apply_setting(&mut config, "colour", "blue"),
            Err(ConfigError::UnknownSetting(_))
        ));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn durations_follow_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }
}
