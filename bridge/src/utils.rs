//! Utility functions

use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::app::options::AppOptions;
use crate::app::state::AppState;

/// Version information for the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Generate a sync operation ID: `sync-<unix millis>-<random v4 uuid>`
pub fn generate_sync_id() -> String {
    format!(
        "sync-{}-{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Entity name used to probe the catalog
const CHECK_ENTITY: &str = "argobridge-check";

/// Probe the configured upstreams and print the results.
///
/// Returns whether every check passed.
pub async fn run_diagnostic(options: &AppOptions) -> bool {
    println!("{}", "Argo CD bridge diagnostic".bold());

    let state = match AppState::init(options) {
        Ok((state, _jobs)) => state,
        Err(e) => {
            println!("  {} configuration: {}", "FAIL".red().bold(), e);
            return false;
        }
    };
    println!("  {} configuration", "OK".green().bold());

    let mut passed = true;

    match state.argocd.version().await {
        Ok(version) => println!(
            "  {} Argo CD at {} ({})",
            "OK".green().bold(),
            options.argocd.base_url,
            version
        ),
        Err(e) => {
            passed = false;
            println!(
                "  {} Argo CD at {}: {}",
                "FAIL".red().bold(),
                options.argocd.base_url,
                e
            );
        }
    }

    match state.catalog.get_entity_by_name(CHECK_ENTITY).await {
        Ok(_) => println!("  {} catalog", "OK".green().bold()),
        Err(e) => {
            passed = false;
            println!("  {} catalog: {}", "FAIL".red().bold(), e);
        }
    }

    if !options.policy.enabled {
        println!("  {} manual syncs are disabled", "WARN".yellow().bold());
    }

    passed
}
