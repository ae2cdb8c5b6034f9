//! In-process Argo CD stand-in

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::argocd::{ApplicationSnapshot, ArgoCdApi, TriggeredSync};
use crate::errors::BridgeError;
use crate::models::sync::SyncOptions;

/// Version reported by the simulated server
pub const SIMULATED_VERSION: &str = "v2.10.0+simulated";

#[derive(Debug, Clone)]
enum Fixture {
    Snapshot(ApplicationSnapshot),
    Failure(String),
}

/// Simulated Argo CD.
///
/// Unknown applications are reported Healthy and Synced. Fixtures override
/// individual applications with a fixed snapshot or a fetch failure, and
/// sync failures can be injected per application.
#[derive(Default)]
pub struct SimulatedArgoCd {
    fixtures: RwLock<HashMap<String, Fixture>>,
    sync_failures: RwLock<HashMap<String, String>>,
    unreachable: RwLock<Option<String>>,
    fetches: AtomicUsize,
    syncs: AtomicUsize,
}

impl SimulatedArgoCd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a fixed snapshot for `snapshot.name`
    pub fn set_application(&self, snapshot: ApplicationSnapshot) {
        let mut fixtures = self.fixtures.write().unwrap_or_else(|e| e.into_inner());
        fixtures.insert(snapshot.name.clone(), Fixture::Snapshot(snapshot));
    }

    /// Make fetches for `name` fail with `message`
    pub fn set_fetch_failure(&self, name: &str, message: &str) {
        let mut fixtures = self.fixtures.write().unwrap_or_else(|e| e.into_inner());
        fixtures.insert(name.to_string(), Fixture::Failure(message.to_string()));
    }

    /// Make syncs of `name` fail with `message`
    pub fn set_sync_failure(&self, name: &str, message: &str) {
        let mut failures = self.sync_failures.write().unwrap_or_else(|e| e.into_inner());
        failures.insert(name.to_string(), message.to_string());
    }

    /// Make the version probe fail
    pub fn set_unreachable(&self, message: Option<&str>) {
        let mut unreachable = self.unreachable.write().unwrap_or_else(|e| e.into_inner());
        *unreachable = message.map(|m| m.to_string());
    }

    /// Number of `fetch_application` calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `trigger_sync` calls so far
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArgoCdApi for SimulatedArgoCd {
    async fn fetch_application(&self, name: &str) -> Result<ApplicationSnapshot, BridgeError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated fetch for application: {}", name);

        let fixture = {
            let fixtures = self.fixtures.read().unwrap_or_else(|e| e.into_inner());
            fixtures.get(name).cloned()
        };

        match fixture {
            Some(Fixture::Snapshot(snapshot)) => Ok(snapshot),
            Some(Fixture::Failure(message)) => Err(BridgeError::UpstreamError(message)),
            None => {
                let mut snapshot = ApplicationSnapshot::healthy(name, name);
                snapshot.last_sync_time = Some(Utc::now());
                Ok(snapshot)
            }
        }
    }

    async fn trigger_sync(
        &self,
        name: &str,
        options: &SyncOptions,
    ) -> Result<TriggeredSync, BridgeError> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated sync for application: {} ({:?})", name, options);

        let failure = {
            let failures = self.sync_failures.read().unwrap_or_else(|e| e.into_inner());
            failures.get(name).cloned()
        };
        if let Some(message) = failure {
            return Err(BridgeError::UpstreamError(message));
        }

        let resources_changed = if options.dry_run {
            0
        } else {
            3 + u32::from(options.prune)
        };
        Ok(TriggeredSync { resources_changed })
    }

    async fn version(&self) -> Result<String, BridgeError> {
        let unreachable = self.unreachable.read().unwrap_or_else(|e| e.into_inner()).clone();
        match unreachable {
            Some(message) => Err(BridgeError::UpstreamError(message)),
            None => Ok(SIMULATED_VERSION.to_string()),
        }
    }
}
