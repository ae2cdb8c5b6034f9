//! Deployment status cache

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::models::status::DeploymentStatus;

/// Default time-to-live for cached statuses
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(30);

/// Storage for last-known deployment statuses.
///
/// The in-process implementation is [`StatusCache`]; a shared key-value
/// store can be plugged in behind the same contract.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Get a live entry. Expired entries are reported absent.
    async fn get(&self, key: &str) -> Option<DeploymentStatus>;

    /// Insert or replace an entry, restarting its TTL
    async fn set(&self, key: &str, status: DeploymentStatus);

    /// Drop an entry
    async fn invalidate(&self, key: &str);
}

/// Status cache entry
#[derive(Debug, Clone)]
struct StatusCacheEntry {
    status: DeploymentStatus,
    expires_at: Instant,
}

/// In-memory TTL cache with lazy eviction
pub struct StatusCache {
    entries: RwLock<HashMap<String, StatusCacheEntry>>,
    ttl: Duration,
}

impl StatusCache {
    /// Create a new status cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of physically stored entries, expired ones included
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<DeploymentStatus> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return None,
                Some(entry) if now < entry.expires_at => return Some(entry.status.clone()),
                Some(_) => {}
            }
        }

        // Expired: remove it unless another writer refreshed it meanwhile
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|e| now >= e.expires_at) {
            entries.remove(key);
        }
        None
    }

    fn store(&self, key: &str, status: DeploymentStatus) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            StatusCacheEntry {
                status,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

#[async_trait]
impl StatusStore for StatusCache {
    async fn get(&self, key: &str) -> Option<DeploymentStatus> {
        self.lookup(key)
    }

    async fn set(&self, key: &str, status: DeploymentStatus) {
        self.store(key, status);
    }

    async fn invalidate(&self, key: &str) {
        self.remove(key);
    }
}
