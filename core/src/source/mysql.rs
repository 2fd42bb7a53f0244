//! MySQL source for the live OEE table.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use super::{RecordSource, fixed_query, validate_table_name};
use crate::error::LoadError;
use crate::record::RawRecord;

pub struct MySqlSource {
    url: String,
    table: String,
    connect_timeout: Duration,
}

impl MySqlSource {
    pub fn new(
        url: impl Into<String>,
        table: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, LoadError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            url: url.into(),
            table,
            connect_timeout,
        })
    }

    /// Column names of the table in the connection's default schema.
    async fn columns(&self, pool: &MySqlPool) -> Result<Vec<String>, LoadError> {
        sqlx::query_scalar::<_, String>(
            "SELECT CAST(column_name AS CHAR) FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(&self.table)
        .fetch_all(pool)
        .await
        .map_err(|source| LoadError::Schema {
            table: self.table.clone(),
            source,
        })
    }

    async fn query(&self, pool: &MySqlPool) -> Result<Vec<RawRecord>, LoadError> {
        let columns = self.columns(pool).await?;
        let sql = fixed_query(&self.table, "CHAR", &columns, '`')?;
        sqlx::query_as::<_, RawRecord>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|source| LoadError::Query {
                table: self.table.clone(),
                source,
            })
    }
}

#[async_trait]
impl RecordSource for MySqlSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>, LoadError> {
        // One short-lived connection per load; the cache decides how often this runs
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect(&self.url)
            .await
            .map_err(|source| LoadError::Connect {
                target: redact_url(&self.url),
                source,
            })?;

        let result = self.query(&pool).await;
        pool.close().await;
        result
    }

    fn describe(&self) -> String {
        format!("mysql {} ({})", redact_url(&self.url), self.table)
    }
}

/// Strip user info from a connection URL so it can be logged.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "<redacted>".to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}
