//! Recovery actions for classified errors

use std::collections::HashSet;

use crate::models::diagnosis::{DeploymentError, ErrorType, RecoveryAction, RiskLevel};

fn action(
    id: &str,
    title: &str,
    description: &str,
    automated: bool,
    risk_level: RiskLevel,
    estimated_time: &str,
    prerequisites: &[&str],
) -> RecoveryAction {
    RecoveryAction {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        automated,
        risk_level,
        estimated_time: estimated_time.to_string(),
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
    }
}

/// Build the recovery actions for one error.
///
/// Every error gets manual sync, force sync and view logs; some types add
/// their own follow-ups.
pub fn generate_recovery_actions(error: &DeploymentError) -> Vec<RecoveryAction> {
    let mut actions = vec![
        action(
            "manual-sync",
            "Trigger manual sync",
            "Sync the application with its Git source",
            true,
            RiskLevel::Low,
            "1-2 minutes",
            &["Sync permission"],
        ),
        action(
            "force-sync",
            "Force sync",
            "Sync and replace resources that fail to apply",
            true,
            RiskLevel::Medium,
            "2-5 minutes",
            &["Sync permission", "Confirm no manual changes must be kept"],
        ),
        action(
            "view-logs",
            "View application logs",
            &format!(
                "Inspect pod logs for {} in {}",
                error.application_name, error.environment
            ),
            false,
            RiskLevel::Low,
            "5 minutes",
            &[],
        ),
    ];

    match error.error_type {
        ErrorType::ResourceError => actions.push(action(
            "scale-down",
            "Scale down",
            "Scale the failing workload to zero while investigating",
            false,
            RiskLevel::High,
            "1 minute",
            &["Cluster access", "Approval from service owner"],
        )),
        ErrorType::PermissionError => actions.push(action(
            "contact-platform-team",
            "Contact platform team",
            "Request the missing project or RBAC permissions",
            false,
            RiskLevel::Low,
            "1 business day",
            &[],
        )),
        ErrorType::NetworkError => actions.push(action(
            "check-network-policies",
            "Check network policies",
            "Verify connectivity between Argo CD, the repository and the cluster",
            false,
            RiskLevel::Low,
            "15 minutes",
            &["Cluster access"],
        )),
        ErrorType::SyncFailed => actions.push(action(
            "sync-with-prune",
            "Sync with prune",
            "Sync and delete resources no longer present in Git",
            true,
            RiskLevel::High,
            "2-5 minutes",
            &["Sync permission", "Review resources that will be pruned"],
        )),
        ErrorType::HealthCheckFailed => {}
    }

    actions
}

/// Recovery actions for several errors, first occurrence of each id kept
pub fn collect_recovery_actions(errors: &[DeploymentError]) -> Vec<RecoveryAction> {
    let mut seen = HashSet::new();
    errors
        .iter()
        .flat_map(generate_recovery_actions)
        .filter(|a| seen.insert(a.id.clone()))
        .collect()
}
