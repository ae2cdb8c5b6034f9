//! Deployment error classification
//!
//! Raw messages from Argo CD (conditions, operation messages, transport
//! errors) are matched against an ordered rule table. The first matching
//! rule decides the category, severity, recoverability and suggested
//! actions; anything unmatched falls through to a generic health-check
//! classification, so every input yields a well-formed error.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::models::diagnosis::{DeploymentError, ErrorType, Severity};

/// One row of the classification table
pub struct ClassificationRule {
    pub pattern: Regex,
    pub error_type: ErrorType,
    pub severity: Severity,
    pub recoverable: bool,
    pub suggested_actions: &'static [&'static str],
}

impl ClassificationRule {
    fn new(
        pattern: &str,
        error_type: ErrorType,
        severity: Severity,
        recoverable: bool,
        suggested_actions: &'static [&'static str],
    ) -> Self {
        Self {
            // Patterns are compile-time literals covered by tests
            pattern: Regex::new(pattern).expect("invalid classification pattern"),
            error_type,
            severity,
            recoverable,
            suggested_actions,
        }
    }
}

/// Ordered classification rules. First match wins.
pub static CLASSIFICATION_RULES: LazyLock<Vec<ClassificationRule>> = LazyLock::new(|| {
    vec![
        ClassificationRule::new(
            r"(?i)crashloopbackoff|back-off restarting|failed to start",
            ErrorType::ResourceError,
            Severity::High,
            true,
            &[
                "Check application logs for startup errors",
                "Verify environment variables and mounted configuration",
                "Check resource limits and liveness probe settings",
            ],
        ),
        ClassificationRule::new(
            r"(?i)imagepullbackoff|errimagepull|manifest unknown",
            ErrorType::ResourceError,
            Severity::High,
            true,
            &[
                "Verify the image name and tag exist in the registry",
                "Check image pull secrets for the namespace",
            ],
        ),
        ClassificationRule::new(
            r"(?i)oomkilled|out of memory|insufficient (cpu|memory)|exceeded quota",
            ErrorType::ResourceError,
            Severity::Critical,
            true,
            &[
                "Increase memory or CPU limits for the workload",
                "Check namespace resource quotas",
                "Scale down other workloads to free capacity",
            ],
        ),
        ClassificationRule::new(
            r"(?i)forbidden|unauthorized|permission denied|rbac",
            ErrorType::PermissionError,
            Severity::High,
            false,
            &[
                "Verify the Argo CD project allows this destination and resource kinds",
                "Check service account RBAC permissions",
                "Contact the platform team for access",
            ],
        ),
        ClassificationRule::new(
            r"(?i)timeout|timed out|connection refused|no such host|network unreachable|dial tcp",
            ErrorType::NetworkError,
            Severity::Medium,
            true,
            &[
                "Retry the sync once connectivity is restored",
                "Check cluster API server and repository reachability",
                "Review network policies between Argo CD and the cluster",
            ],
        ),
        ClassificationRule::new(
            r"(?i)sync failed|comparisonerror|one or more objects failed to apply|hook failed|operation failed",
            ErrorType::SyncFailed,
            Severity::High,
            true,
            &[
                "Review the sync result for the failing resources",
                "Validate the manifests rendered from the repository",
                "Retry the sync",
            ],
        ),
        ClassificationRule::new(
            r"(?i)readiness probe failed|liveness probe failed|health check|degraded",
            ErrorType::HealthCheckFailed,
            Severity::Medium,
            true,
            &[
                "Check application health endpoints",
                "Review probe configuration and startup time",
            ],
        ),
    ]
});

static DEFAULT_ACTIONS: &[&str] = &[
    "Check the application status in Argo CD",
    "Review recent changes to the application",
    "Check application logs",
];

/// Matches `Kind/name` references and `resource "name"` mentions
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\b[A-Z][A-Za-z]+/([a-z0-9][a-z0-9.-]*)|(?i:resource)\s+"([^"]+)")"#)
        .expect("invalid resource name pattern")
});

/// Classifies raw error messages into [`DeploymentError`]s
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    argocd_url: String,
}

impl ErrorClassifier {
    /// Create a classifier that links errors to the given Argo CD UI
    pub fn new(argocd_url: &str) -> Self {
        Self {
            argocd_url: argocd_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link to the logs view of an application
    pub fn log_url(&self, application_name: &str) -> String {
        format!(
            "{}/applications/{}?view=pods&tab=logs",
            self.argocd_url, application_name
        )
    }

    /// Classify a raw message. Never fails.
    pub fn classify(
        &self,
        raw_message: &str,
        application_name: &str,
        environment: &str,
    ) -> DeploymentError {
        let rule = CLASSIFICATION_RULES
            .iter()
            .find(|rule| rule.pattern.is_match(raw_message));

        let (error_type, severity, recoverable, actions) = match rule {
            Some(rule) => (
                rule.error_type,
                rule.severity,
                rule.recoverable,
                rule.suggested_actions,
            ),
            None => (
                ErrorType::HealthCheckFailed,
                Severity::Medium,
                true,
                DEFAULT_ACTIONS,
            ),
        };

        DeploymentError {
            error_type,
            severity,
            recoverable,
            suggested_actions: actions.iter().map(|a| a.to_string()).collect(),
            message: raw_message.to_string(),
            timestamp: Utc::now(),
            application_name: application_name.to_string(),
            environment: environment.to_string(),
            log_url: Some(self.log_url(application_name)),
            resource_name: extract_resource_name(raw_message),
        }
    }
}

fn extract_resource_name(message: &str) -> Option<String> {
    let captures = RESOURCE_NAME.captures(message)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}
