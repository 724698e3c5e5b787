//! Chat snapshot source with a TTL cache.
//!
//! The chat platform exports its chat list to `chats.json`. Parsing it is
//! the expensive part of a refresh, so the resulting pool is reused until
//! the TTL runs out or a caller busts the cache.

use crate::error::{ServiceError, ServiceResult};
use chrono::Utc;
use ghost_core::ChatPool;
use ghost_protocol::{build_pool, dedup_chats, parse_snapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
struct CachedPool {
    pool: Arc<ChatPool>,
    loaded_at: Instant,
}

/// Loads the chat pool from a snapshot file.
#[derive(Debug)]
pub struct ChatSource {
    path: PathBuf,
    ttl: Duration,
    cache: Mutex<Option<CachedPool>>,
}

impl ChatSource {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the chat pool, reading the snapshot when the cache is stale.
    ///
    /// `bust` forces a re-read.
    ///
    /// # Errors
    ///
    /// `ServiceError::Unavailable` when the snapshot is missing or
    /// unreadable, `ServiceError::Protocol` when it is not chat JSON.
    pub async fn pool(&self, bust: bool) -> ServiceResult<Arc<ChatPool>> {
        let mut cache = self.cache.lock().await;

        if let (false, Some(cached)) = (bust, cache.as_ref()) {
            if cached.loaded_at.elapsed() < self.ttl {
                debug!(age_ms = cached.loaded_at.elapsed().as_millis() as u64, "Chat cache hit");
                return Ok(Arc::clone(&cached.pool));
            }
        }

        let pool = Arc::new(self.read().await?);
        *cache = Some(CachedPool {
            pool: Arc::clone(&pool),
            loaded_at: Instant::now(),
        });
        Ok(pool)
    }

    /// Drops the cached pool.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn read(&self) -> ServiceResult<ChatPool> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ServiceError::Unavailable(format!("{}: {e}", self.path.display()))
        })?;
        let chats = dedup_chats(parse_snapshot(&text)?);
        let pool = build_pool(&chats, Utc::now());
        info!(
            contacts = pool.contacts.len(),
            groups = pool.groups.len(),
            "Chat snapshot loaded"
        );
        Ok(pool)
    }
}
