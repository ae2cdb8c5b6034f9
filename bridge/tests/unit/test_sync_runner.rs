//! Sync execution tests: tracker, executor and workers together

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use argobridge::argocd::simulated::SimulatedArgoCd;
use argobridge::argocd::{ApplicationSnapshot, ArgoCdApi, TriggeredSync};
use argobridge::diagnose::classifier::ErrorClassifier;
use argobridge::errors::BridgeError;
use argobridge::models::diagnosis::ErrorType;
use argobridge::models::sync::{ManualSyncOperation, SyncOperationStatus, SyncOptions};
use argobridge::sync::executor::ExecutorSettings;
use argobridge::sync::tracker::SyncOperationTracker;
use argobridge::workers::{janitor, sync_runner};

/// Argo CD whose syncs never return in time
struct StalledArgoCd;

#[async_trait]
impl ArgoCdApi for StalledArgoCd {
    async fn fetch_application(&self, name: &str) -> Result<ApplicationSnapshot, BridgeError> {
        Ok(ApplicationSnapshot::healthy(name, name))
    }

    async fn trigger_sync(
        &self,
        _name: &str,
        _options: &SyncOptions,
    ) -> Result<TriggeredSync, BridgeError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(TriggeredSync {
            resources_changed: 1,
        })
    }

    async fn version(&self) -> Result<String, BridgeError> {
        Ok("v0".to_string())
    }
}

/// Argo CD client that panics when asked to sync
struct PanickingArgoCd;

#[async_trait]
impl ArgoCdApi for PanickingArgoCd {
    async fn fetch_application(&self, name: &str) -> Result<ApplicationSnapshot, BridgeError> {
        Ok(ApplicationSnapshot::healthy(name, name))
    }

    async fn trigger_sync(
        &self,
        _name: &str,
        _options: &SyncOptions,
    ) -> Result<TriggeredSync, BridgeError> {
        panic!("malformed sync response");
    }

    async fn version(&self) -> Result<String, BridgeError> {
        Ok("v0".to_string())
    }
}

struct Harness {
    tracker: Arc<SyncOperationTracker>,
    stop: Option<oneshot::Sender<()>>,
    runner: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn start(api: Arc<dyn ArgoCdApi>, executor: ExecutorSettings) -> Self {
        let (tracker, jobs) =
            SyncOperationTracker::new(ErrorClassifier::new("https://argocd.example.com"));
        let tracker = Arc::new(tracker);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let options = sync_runner::Options { executor };
        let runner_tracker = tracker.clone();
        let runner = tokio::spawn(async move {
            sync_runner::run(
                &options,
                runner_tracker,
                api,
                jobs,
                Box::pin(async move {
                    let _ = stop_rx.await;
                }),
            )
            .await;
        });

        Self {
            tracker,
            stop: Some(stop_tx),
            runner,
        }
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.runner.await.unwrap();
    }
}

/// Poll until the operation is terminal, returning every observed state
async fn poll_until_terminal(
    tracker: &SyncOperationTracker,
    sync_id: &str,
) -> Vec<ManualSyncOperation> {
    let mut observed = Vec::new();
    loop {
        let op = tracker.get_status(sync_id).await.unwrap();
        let terminal = op.status.is_terminal();
        observed.push(op);
        if terminal {
            return observed;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

fn rank(status: SyncOperationStatus) -> u8 {
    match status {
        SyncOperationStatus::Pending => 0,
        SyncOperationStatus::InProgress => 1,
        SyncOperationStatus::Completed | SyncOperationStatus::Failed => 2,
    }
}

#[tokio::test(start_paused = true)]
async fn test_sync_walks_phases_to_completion() {
    let argocd = Arc::new(SimulatedArgoCd::new());
    let harness = Harness::start(argocd.clone(), ExecutorSettings::default());

    let op = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;
    assert_eq!(op.status, SyncOperationStatus::Pending);

    let observed = poll_until_terminal(&harness.tracker, &op.sync_id).await;

    // Status and progress never move backwards
    for pair in observed.windows(2) {
        assert!(rank(pair[0].status) <= rank(pair[1].status));
        let before = pair[0].progress.as_ref().map(|p| p.percentage).unwrap_or(0);
        let after = pair[1].progress.as_ref().map(|p| p.percentage).unwrap_or(0);
        assert!(before <= after);
    }
    assert!(observed
        .iter()
        .any(|op| op.status == SyncOperationStatus::InProgress));

    let last = observed.last().unwrap();
    assert_eq!(last.status, SyncOperationStatus::Completed);
    assert_eq!(last.progress.as_ref().unwrap().percentage, 100);
    let result = last.result.as_ref().unwrap();
    assert!(result.success);
    assert!(result.resources_changed >= 1);
    assert!(last.classified_error.is_none());
    assert_eq!(argocd.sync_count(), 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_changes_nothing() {
    let harness = Harness::start(Arc::new(SimulatedArgoCd::new()), ExecutorSettings::default());
    let options = SyncOptions {
        dry_run: true,
        ..Default::default()
    };
    let op = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", options)
        .await;

    let observed = poll_until_terminal(&harness.tracker, &op.sync_id).await;
    let result = observed.last().unwrap().result.clone().unwrap();
    assert!(result.success);
    assert_eq!(result.resources_changed, 0);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_upstream_sync_failure_is_recorded() {
    let argocd = Arc::new(SimulatedArgoCd::new());
    argocd.set_sync_failure("payments-prod", "one or more objects failed to apply");
    let harness = Harness::start(argocd, ExecutorSettings::default());

    let op = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;
    let observed = poll_until_terminal(&harness.tracker, &op.sync_id).await;

    let last = observed.last().unwrap();
    assert_eq!(last.status, SyncOperationStatus::Failed);
    let result = last.result.as_ref().unwrap();
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("one or more objects failed to apply")
    );
    assert_eq!(
        last.classified_error.as_ref().unwrap().error_type,
        ErrorType::SyncFailed
    );

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_deadline_fails_stalled_sync() {
    let executor = ExecutorSettings {
        phase_delay: Duration::from_secs(2),
        deadline: Duration::from_secs(60),
    };
    let harness = Harness::start(Arc::new(StalledArgoCd), executor);

    let op = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;
    let observed = poll_until_terminal(&harness.tracker, &op.sync_id).await;

    let last = observed.last().unwrap();
    assert_eq!(last.status, SyncOperationStatus::Failed);
    let error = last.result.as_ref().unwrap().error.clone().unwrap();
    assert!(error.contains("timed out"));
    assert_eq!(
        last.classified_error.as_ref().unwrap().error_type,
        ErrorType::NetworkError
    );
    // The deadline cut the sync off mid-walk
    assert!(last.progress.as_ref().unwrap().percentage < 100);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_sync_is_recorded_as_failed() {
    let harness = Harness::start(Arc::new(PanickingArgoCd), ExecutorSettings::default());

    let op = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;
    let observed = poll_until_terminal(&harness.tracker, &op.sync_id).await;

    let last = observed.last().unwrap();
    assert_eq!(last.status, SyncOperationStatus::Failed);
    let result = last.result.as_ref().unwrap();
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some(sync_runner::SYNC_PANICKED));
    assert!(last.classified_error.is_some());

    // The runner keeps serving after a panic
    let next = harness
        .tracker
        .create_operation("ledger-prod", "production", "bob", SyncOptions::default())
        .await;
    let observed = poll_until_terminal(&harness.tracker, &next.sync_id).await;
    assert_eq!(observed.last().unwrap().status, SyncOperationStatus::Failed);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_syncs_of_different_applications() {
    let harness = Harness::start(Arc::new(SimulatedArgoCd::new()), ExecutorSettings::default());

    let a = harness
        .tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;
    let b = harness
        .tracker
        .create_operation("ledger-prod", "production", "bob", SyncOptions::default())
        .await;

    let start = tokio::time::Instant::now();
    poll_until_terminal(&harness.tracker, &a.sync_id).await;
    poll_until_terminal(&harness.tracker, &b.sync_id).await;

    // Both finish within a single sync's walk when run side by side
    assert!(start.elapsed() < Duration::from_secs(10));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_leaves_nothing_pending() {
    let harness = Harness::start(Arc::new(SimulatedArgoCd::new()), ExecutorSettings::default());

    let mut ids = Vec::new();
    for app in ["a-prod", "b-prod", "c-prod"] {
        let op = harness
            .tracker
            .create_operation(app, "production", "alice", SyncOptions::default())
            .await;
        ids.push(op.sync_id);
    }

    let tracker = harness.tracker.clone();
    harness.stop().await;

    for id in ids {
        let op = tracker.get_status(&id).await.unwrap();
        assert!(op.status.is_terminal(), "{} left {:?}", id, op.status);
        assert!(op.result.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn test_janitor_removes_old_operations() {
    let (tracker, _jobs) =
        SyncOperationTracker::new(ErrorClassifier::new("https://argocd.example.com"));
    tracker
        .create_operation("payments-prod", "production", "alice", SyncOptions::default())
        .await;

    // Retention is measured on the wall clock
    std::thread::sleep(Duration::from_millis(5));

    let options = janitor::Options {
        interval: Duration::from_secs(3600),
        retention: Duration::from_millis(1),
    };
    janitor::run(
        &options,
        &tracker,
        tokio::time::sleep,
        Box::pin(tokio::time::sleep(Duration::from_secs(5400))),
    )
    .await;

    assert!(tracker.is_empty().await);
}
