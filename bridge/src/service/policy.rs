//! Manual sync permission policy

use serde::{Deserialize, Serialize};

/// Caller used when a request carries no identity
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Who may trigger manual syncs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Master switch for manual syncs
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Callers allowed to sync. Empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            allowed_users: vec![],
        }
    }
}

impl SyncPolicy {
    pub fn allows(&self, caller: &str) -> bool {
        self.enabled
            && (self.allowed_users.is_empty() || self.allowed_users.iter().any(|u| u == caller))
    }
}
