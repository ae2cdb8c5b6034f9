//! Environment naming conventions for Argo CD applications
//!
//! Applications are named `<base>-<env token>`, e.g. `payments-prod`. The
//! helpers here map between environments and application names.

/// Environments queried for multi-environment status, in display order
pub const ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

/// Tokens recognised in application names, with the environment they denote
const ENVIRONMENT_TOKENS: [(&str, &str); 6] = [
    ("dev", "development"),
    ("development", "development"),
    ("stg", "staging"),
    ("staging", "staging"),
    ("prod", "production"),
    ("production", "production"),
];

/// Suffix appended for an environment
pub fn environment_suffix(environment: &str) -> &str {
    match environment {
        "development" => "dev",
        "staging" => "staging",
        "production" => "prod",
        other => other,
    }
}

fn token_environment(token: &str) -> Option<&'static str> {
    ENVIRONMENT_TOKENS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(token))
        .map(|(_, env)| *env)
}

/// Application name of `base_name` in `environment`.
///
/// If `base_name` already contains an environment token as a hyphen
/// separated segment, the last such segment is replaced; otherwise the
/// environment suffix is appended.
pub fn environment_application_name(base_name: &str, environment: &str) -> String {
    let suffix = environment_suffix(environment);
    let mut segments: Vec<&str> = base_name.split('-').collect();

    match segments
        .iter()
        .rposition(|segment| token_environment(segment).is_some())
    {
        Some(index) if segments.len() > 1 => {
            segments[index] = suffix;
            segments.join("-")
        }
        _ => format!("{}-{}", base_name, suffix),
    }
}

/// Environment an application belongs to, from its last environment token
pub fn infer_environment(application_name: &str, default_environment: &str) -> String {
    application_name
        .rsplit('-')
        .find_map(token_environment)
        .filter(|_| application_name.contains('-'))
        .unwrap_or(default_environment)
        .to_string()
}
