//! Status cache tests

use std::sync::Arc;
use std::time::Duration;

use argobridge::cache::status::{StatusCache, StatusStore, DEFAULT_STATUS_TTL};
use argobridge::models::status::{DeploymentStatus, HealthStatus, SyncStatus};

fn status(app: &str, health: HealthStatus) -> DeploymentStatus {
    DeploymentStatus {
        application_name: app.to_string(),
        health,
        sync: SyncStatus::Synced,
        last_sync_time: None,
        environment: "production".to_string(),
        namespace: "payments".to_string(),
        errors: vec![],
        can_sync: false,
    }
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache = StatusCache::default();
    assert_eq!(cache.ttl(), DEFAULT_STATUS_TTL);

    cache.set("payments-prod", status("payments-prod", HealthStatus::Healthy)).await;

    tokio::time::advance(Duration::from_secs(29)).await;
    assert!(cache.get("payments-prod").await.is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("payments-prod").await.is_none());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_removed_on_access() {
    let cache = StatusCache::new(Duration::from_secs(5));
    cache.set("a", status("a", HealthStatus::Healthy)).await;
    cache.set("b", status("b", HealthStatus::Healthy)).await;

    tokio::time::advance(Duration::from_secs(6)).await;
    // No background sweep
    assert_eq!(cache.len(), 2);

    assert!(cache.get("a").await.is_none());
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_restarts_ttl() {
    let cache = StatusCache::new(Duration::from_secs(10));
    cache.set("svc", status("svc", HealthStatus::Healthy)).await;

    tokio::time::advance(Duration::from_secs(8)).await;
    cache.set("svc", status("svc", HealthStatus::Degraded)).await;

    tokio::time::advance(Duration::from_secs(8)).await;
    let cached = cache.get("svc").await.unwrap();
    assert_eq!(cached.health, HealthStatus::Degraded);
}

#[tokio::test]
async fn test_invalidate() {
    let cache: Arc<dyn StatusStore> = Arc::new(StatusCache::default());
    cache.set("a", status("a", HealthStatus::Healthy)).await;
    cache.set("b", status("b", HealthStatus::Healthy)).await;

    cache.invalidate("a").await;
    assert!(cache.get("a").await.is_none());
    assert!(cache.get("b").await.is_some());

    // Invalidating a missing key is a no-op
    cache.invalidate("missing").await;
}
