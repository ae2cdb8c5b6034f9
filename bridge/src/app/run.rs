//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::argocd::ArgoCdApi;
use crate::errors::BridgeError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::sync::tracker::{SyncJobReceiver, SyncOperationTracker};
use crate::workers::{janitor, sync_runner};

/// Run the bridge until `shutdown_signal` resolves
pub async fn run(
    bridge_version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BridgeError> {
    info!("Initializing Argo CD bridge {}...", bridge_version);

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start bridge: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), BridgeError> {
    let (app_state, jobs) = AppState::init(options)?;

    init_sync_runner(
        options.sync_runner.clone(),
        app_state.tracker.clone(),
        app_state.argocd.clone(),
        jobs,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_janitor(
        options.janitor.clone(),
        app_state.tracker.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_server(options, &app_state, shutdown_manager, shutdown_tx.subscribe()).await
}

fn init_sync_runner(
    options: sync_runner::Options,
    tracker: Arc<SyncOperationTracker>,
    argocd: Arc<dyn ArgoCdApi>,
    jobs: SyncJobReceiver,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing sync runner worker...");

    let handle = tokio::spawn(async move {
        sync_runner::run(
            &options,
            tracker,
            argocd,
            jobs,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_sync_runner_handle(handle)
}

fn init_janitor(
    options: janitor::Options,
    tracker: Arc<SyncOperationTracker>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing janitor worker...");

    let handle = tokio::spawn(async move {
        janitor::run(
            &options,
            tracker.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_janitor_handle(handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: &AppState,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::from(app_state);
    let handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), BridgeError>>>,
    sync_runner_handle: Option<JoinHandle<()>>,
    janitor_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            server_handle: None,
            sync_runner_handle: None,
            janitor_handle: None,
        }
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), BridgeError>>,
    ) -> Result<(), BridgeError> {
        if self.server_handle.is_some() {
            return Err(BridgeError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub fn with_sync_runner_handle(&mut self, handle: JoinHandle<()>) -> Result<(), BridgeError> {
        if self.sync_runner_handle.is_some() {
            return Err(BridgeError::ShutdownError("sync_runner_handle already set".to_string()));
        }
        self.sync_runner_handle = Some(handle);
        Ok(())
    }

    pub fn with_janitor_handle(&mut self, handle: JoinHandle<()>) -> Result<(), BridgeError> {
        if self.janitor_handle.is_some() {
            return Err(BridgeError::ShutdownError("janitor_handle already set".to_string()));
        }
        self.janitor_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), BridgeError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), BridgeError> {
        info!("Shutting down Argo CD bridge...");

        // 1. Server, so no new syncs are accepted
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| BridgeError::ShutdownError(e.to_string()))??;
        }

        // 2. Sync runner, which drains in-flight syncs
        if let Some(handle) = self.sync_runner_handle.take() {
            handle.await.map_err(|e| BridgeError::ShutdownError(e.to_string()))?;
        }

        // 3. Janitor
        if let Some(handle) = self.janitor_handle.take() {
            handle.await.map_err(|e| BridgeError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
