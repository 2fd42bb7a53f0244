//! Time-boxed memoization of the fixed query.
//!
//! One entry, keyed implicitly by the source's fixed query. A valid entry is
//! served as-is (same `Arc`); an expired or missing one triggers a single
//! fetch whose result replaces the entry wholesale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::error::LoadError;
use crate::record::Record;
use crate::source::{RecordSource, load_records};

/// Snapshot of the table plus the moment it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<[Record]>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn new(data: Arc<[Record]>, fetched_at: Instant) -> Self {
        Self { data, fetched_at }
    }

    /// True while less than `ttl` has elapsed since the fetch.
    pub fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Loads records through a source, reusing the last snapshot within the TTL.
pub struct DataLoader {
    source: Box<dyn RecordSource>,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl DataLoader {
    pub fn new(source: Box<dyn RecordSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    /// Current snapshot, fetching when the cached one is missing or expired.
    pub async fn load(&self) -> Result<Arc<[Record]>, LoadError> {
        self.load_at(Instant::now()).await
    }

    /// `load` with an explicit clock reading.
    pub async fn load_at(&self, now: Instant) -> Result<Arc<[Record]>, LoadError> {
        // Fast path: valid entry under the read lock
        {
            let entry = self.entry.read().await;
            if let Some(entry) = entry.as_ref()
                && entry.is_valid(now, self.ttl)
            {
                tracing::debug!("record cache hit");
                return Ok(Arc::clone(&entry.data));
            }
        }

        // Slow path: fetch under the write lock so concurrent callers wait for one fetch
        let mut entry = self.entry.write().await;

        // Double-check after acquiring write lock
        if let Some(current) = entry.as_ref()
            && current.is_valid(now, self.ttl)
        {
            return Ok(Arc::clone(&current.data));
        }

        // On failure the previous entry stays, but it is expired and will not be served
        let data = load_records(self.source.as_ref()).await?;
        *entry = Some(CacheEntry::new(Arc::clone(&data), now));
        Ok(data)
    }

    /// Fetch now regardless of the cached entry.
    pub async fn reload(&self) -> Result<Arc<[Record]>, LoadError> {
        let mut entry = self.entry.write().await;
        let data = load_records(self.source.as_ref()).await?;
        *entry = Some(CacheEntry::new(Arc::clone(&data), Instant::now()));
        Ok(data)
    }

    /// Drop the cached entry; the next `load` fetches.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    /// When the cached snapshot was fetched, if there is one.
    pub async fn fetched_at(&self) -> Option<Instant> {
        self.entry.read().await.as_ref().map(|e| e.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::record::RawRecord;

    const TTL: Duration = Duration::from_secs(300);

    /// Counts fetches; can be switched to fail.
    #[derive(Default)]
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        async fn fetch(&self) -> Result<Vec<RawRecord>, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(LoadError::MissingSource);
            }
            Ok(vec![RawRecord {
                inicio: Some("2024-01-01 00:00:00".to_string()),
                ..Default::default()
            }])
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn loader() -> (DataLoader, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let source = CountingSource::default();
        let fetches = Arc::clone(&source.fetches);
        let failing = Arc::clone(&source.failing);
        (DataLoader::new(Box::new(source), TTL), fetches, failing)
    }

    #[test]
    fn entry_validity_is_bounded_by_ttl() {
        let t0 = Instant::now();
        let entry = CacheEntry::new(Arc::from(Vec::new()), t0);
        assert!(entry.is_valid(t0, TTL));
        assert!(entry.is_valid(t0 + TTL - Duration::from_millis(1), TTL));
        assert!(!entry.is_valid(t0 + TTL, TTL));
        assert!(!entry.is_valid(t0, Duration::ZERO));
    }

    #[tokio::test]
    async fn cache_hit_returns_same_snapshot_without_fetching() {
        let (loader, fetches, _) = loader();
        let t0 = Instant::now();

        let first = loader.load_at(t0).await.unwrap();
        let second = loader.load_at(t0 + Duration::from_secs(10)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let (loader, fetches, _) = loader();
        let t0 = Instant::now();

        let first = loader.load_at(t0).await.unwrap();
        let second = loader.load_at(t0 + TTL).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refetch_surfaces_error_instead_of_stale_data() {
        let (loader, _, failing) = loader();
        let t0 = Instant::now();
        loader.load_at(t0).await.unwrap();

        failing.store(true, Ordering::SeqCst);
        assert!(loader.load_at(t0 + TTL).await.is_err());
        // The t0 entry is left in place, not replaced
        assert_eq!(loader.fetched_at().await, Some(t0));
    }

    #[tokio::test]
    async fn reload_and_invalidate_force_a_fetch() {
        let (loader, fetches, _) = loader();
        loader.load().await.unwrap();
        loader.reload().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        loader.invalidate().await;
        assert_eq!(loader.fetched_at().await, None);
        loader.load().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }
}
