use crate::error::BrokerError;
use crate::types::PerformanceRow;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Time-bounded memo for the performance table, keyed by the exact symbol
/// set (order-independent). The lock is held across the upstream call, so
/// concurrent refreshes collapse into a single computation and the late
/// caller reads the fresh entry instead of re-fetching.
///
/// A failed recompute serves the stale entry when one exists for the same
/// key; a bar-feed outage never blanks rows that were on screen before.
/// Nothing propagates past this boundary.
pub struct PerformanceCache {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

struct CacheEntry {
    key: BTreeSet<String>,
    rows: Vec<PerformanceRow>,
    computed_at: Instant,
}

impl PerformanceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_or_compute<F, Fut>(&self, symbols: &[String], compute: F) -> Vec<PerformanceRow>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PerformanceRow>, BrokerError>>,
    {
        let key: BTreeSet<String> = symbols.iter().cloned().collect();
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.key == key && entry.computed_at.elapsed() < self.ttl {
                return entry.rows.clone();
            }
        }

        match compute().await {
            Ok(rows) => {
                *slot = Some(CacheEntry {
                    key,
                    rows: rows.clone(),
                    computed_at: Instant::now(),
                });
                rows
            }
            Err(e) => match slot.as_ref() {
                Some(stale) if stale.key == key => {
                    warn!("performance refresh failed, serving stale rows: {e}");
                    stale.rows.clone()
                }
                _ => {
                    warn!("performance refresh failed with nothing cached: {e}");
                    Vec::new()
                }
            },
        }
    }
}
