//! Single-entry snapshot cache with TTL and stale fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::aggregate::CapacityMatrix;
use crate::error::CapacityError;
use crate::record::ModelKey;

/// One complete aggregation result plus its construction time.
///
/// `fresh` is true when the snapshot came from a successful fetch within
/// the TTL; a stale snapshot served after a failed refresh carries
/// `fresh = false`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub matrix: Arc<CapacityMatrix>,
    pub failed_models: Vec<ModelKey>,
    pub taken_at: OffsetDateTime,
    pub fresh: bool,
}

#[derive(Debug)]
struct StoredSnapshot {
    matrix: Arc<CapacityMatrix>,
    failed_models: Vec<ModelKey>,
    taken_at: OffsetDateTime,
    stored_at: Instant,
}

impl StoredSnapshot {
    fn to_snapshot(&self, fresh: bool) -> Snapshot {
        Snapshot {
            matrix: Arc::clone(&self.matrix),
            failed_models: self.failed_models.clone(),
            taken_at: self.taken_at,
            fresh,
        }
    }
}

/// Read-through cache holding at most one snapshot.
///
/// Create one at process start and hand it to consumers by reference;
/// replacement is atomic under the lock, so readers never observe a
/// half-built matrix.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    slot: Mutex<Option<StoredSnapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the held snapshot if it is within the TTL; otherwise runs
    /// `fetch` and commits its result. A failed refresh falls back to
    /// the stale snapshot when one exists, and propagates the error only
    /// when nothing has ever been fetched.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<Snapshot, CapacityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(CapacityMatrix, Vec<ModelKey>), CapacityError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(stored) = slot.as_ref() {
            if stored.stored_at.elapsed() < self.ttl {
                return Ok(stored.to_snapshot(true));
            }
        }

        match fetch().await {
            Ok((matrix, failed_models)) => {
                let stored = StoredSnapshot {
                    matrix: Arc::new(matrix),
                    failed_models,
                    taken_at: OffsetDateTime::now_utc(),
                    stored_at: Instant::now(),
                };
                let snapshot = stored.to_snapshot(true);
                *slot = Some(stored);
                Ok(snapshot)
            }
            Err(error) => match slot.as_ref() {
                Some(stored) => {
                    tracing::warn!(error = %error, "refresh failed, serving stale snapshot");
                    Ok(stored.to_snapshot(false))
                }
                None => Err(error),
            },
        }
    }

    /// Drops the held snapshot so the next call must refresh.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn matrix() -> CapacityMatrix {
        CapacityMatrix::build(&[], &[])
    }

    #[tokio::test]
    async fn second_call_within_ttl_skips_fetch() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let snapshot = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok((matrix(), Vec::new()))
                })
                .await
                .expect("refresh succeeds");
            assert!(snapshot.fresh);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_triggers_refetch() {
        let cache = SnapshotCache::new(Duration::from_millis(20));
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok((matrix(), Vec::new()))
        };

        cache.get_or_refresh(fetch).await.expect("first refresh");
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.get_or_refresh(fetch).await.expect("second refresh");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_snapshot() {
        let cache = SnapshotCache::new(Duration::from_millis(10));

        cache
            .get_or_refresh(|| async { Ok((matrix(), Vec::new())) })
            .await
            .expect("first refresh");
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snapshot = cache
            .get_or_refresh(|| async { Err(CapacityError::transport("down")) })
            .await
            .expect("stale fallback");
        assert!(!snapshot.fresh);
    }

    #[tokio::test]
    async fn failure_with_no_snapshot_propagates() {
        let cache = SnapshotCache::new(Duration::from_secs(300));

        let result = cache
            .get_or_refresh(|| async { Err(CapacityError::transport("down")) })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok((matrix(), Vec::new()))
        };

        cache.get_or_refresh(fetch).await.expect("first");
        cache.invalidate().await;
        cache.get_or_refresh(fetch).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
