//! HTTP handler tests through the router

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use argobridge::app::options::AppOptions;
use argobridge::app::state::AppState;
use argobridge::argocd::simulated::{SimulatedArgoCd, SIMULATED_VERSION};
use argobridge::argocd::ApplicationSnapshot;
use argobridge::catalog::{Entity, StaticCatalog, ARGOCD_APP_ANNOTATION};
use argobridge::models::status::HealthStatus;
use argobridge::server::handlers::CALLER_HEADER;
use argobridge::server::serve::router;
use argobridge::server::state::ServerState;
use argobridge::service::policy::SyncPolicy;
use argobridge::sync::tracker::SyncJobReceiver;

struct TestApp {
    router: Router,
    argocd: Arc<SimulatedArgoCd>,
    _jobs: SyncJobReceiver,
}

fn test_app(policy: SyncPolicy) -> TestApp {
    let argocd = Arc::new(SimulatedArgoCd::new());
    let catalog = Arc::new(StaticCatalog::new([
        Entity::new("payments").with_annotation(ARGOCD_APP_ANNOTATION, "payments-prod"),
        Entity::new("ledger").with_annotation(ARGOCD_APP_ANNOTATION, "ledger-staging"),
        Entity::new("docs"),
    ]));
    let options = AppOptions {
        policy,
        ..Default::default()
    };

    let (state, jobs) = AppState::with_upstreams(argocd.clone(), catalog, &options);
    TestApp {
        router: router(Arc::new(ServerState::from(&state))),
        argocd,
        _jobs: jobs,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, caller: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CALLER_HEADER, caller)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_status() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/status/payments")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serviceName"], "payments");
    assert_eq!(body["status"]["applicationName"], "payments-prod");
    assert_eq!(body["status"]["health"], "Healthy");
    assert_eq!(body["status"]["environment"], "production");
    assert_eq!(body["status"]["canSync"], true);
    assert_eq!(
        body["applicationUrl"],
        "https://argocd.example.com/applications/payments-prod"
    );
    assert_eq!(
        body["logsUrl"],
        "https://argocd.example.com/applications/payments-prod?view=pods&tab=logs"
    );
}

#[tokio::test]
async fn test_status_unknown_entity() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/status/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_missing_annotation() {
    let app = test_app(SyncPolicy::default());

    for uri in [
        "/status/docs",
        "/status/docs/environments",
        "/logs/docs",
        "/errors/docs",
        "/sync-history/docs",
    ] {
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("No Argo CD application annotation found"));
    }

    let (status, body) = send(&app.router, post("/sync/docs", "alice", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("No Argo CD application annotation found"));
    assert_eq!(app.argocd.fetch_count(), 0);
}

#[tokio::test]
async fn test_environments() {
    let app = test_app(SyncPolicy::default());
    app.argocd.set_fetch_failure("ledger-dev", "connection refused");
    let mut degraded = ApplicationSnapshot::healthy("ledger-prod", "ledger");
    degraded.health = HealthStatus::Degraded;
    app.argocd.set_application(degraded);

    let (status, body) = send(&app.router, get("/status/ledger/environments")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serviceName"], "ledger");
    assert_eq!(body["overallHealth"], "Degraded");
    assert!(body["environments"].get("development").is_none());
    assert_eq!(
        body["environments"]["staging"]["applicationName"],
        "ledger-staging"
    );
    assert_eq!(
        body["urls"]["production"]["applicationUrl"],
        "https://argocd.example.com/applications/ledger-prod"
    );
}

#[tokio::test]
async fn test_environments_none_resolve() {
    let app = test_app(SyncPolicy::default());
    for name in ["payments-dev", "payments-staging", "payments-prod"] {
        app.argocd.set_fetch_failure(name, "connection refused");
    }

    let (status, body) = send(&app.router, get("/status/payments/environments")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_sync_and_status_lookup() {
    let app = test_app(SyncPolicy::default());

    let (status, body) = send(
        &app.router,
        post("/sync/payments", "alice", json!({"prune": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["operation"]["status"], "pending");
    assert_eq!(body["operation"]["triggeredBy"], "alice");
    assert_eq!(body["operation"]["options"]["prune"], true);
    assert_eq!(body["estimatedDuration"], 6000);
    assert_eq!(
        body["applicationUrl"],
        "https://argocd.example.com/applications/payments-prod"
    );

    let sync_id = body["syncId"].as_str().unwrap().to_string();
    assert!(sync_id.starts_with("sync-"));

    let (status, body) = send(&app.router, get(&format!("/sync/{}/status", sync_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["syncId"], sync_id.as_str());
    assert_eq!(body["operation"]["applicationName"], "payments-prod");
}

#[tokio::test]
async fn test_sync_with_explicit_environment() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(
        &app.router,
        post("/sync/payments", "alice", json!({"environment": "staging", "dryRun": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operation"]["environment"], "staging");
    assert_eq!(body["operation"]["applicationName"], "payments-staging");
    assert_eq!(body["operation"]["options"]["dryRun"], true);
    assert_eq!(
        body["applicationUrl"],
        "https://argocd.example.com/applications/payments-staging"
    );

    let (_, body) = send(&app.router, get("/sync-history/payments")).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_unknown_environment() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(
        &app.router,
        post("/sync/payments", "alice", json!({"environment": "qa"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("qa"));
}

#[tokio::test]
async fn test_sync_without_body() {
    let app = test_app(SyncPolicy::default());
    let request = Request::builder()
        .method("POST")
        .uri("/sync/payments")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operation"]["triggeredBy"], "anonymous");
}

#[tokio::test]
async fn test_sync_invalid_body() {
    let app = test_app(SyncPolicy::default());
    let request = Request::builder()
        .method("POST")
        .uri("/sync/payments")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_sync_permission_denied() {
    let app = test_app(SyncPolicy {
        enabled: true,
        allowed_users: vec!["alice".to_string()],
    });

    let (status, body) = send(&app.router, post("/sync/payments", "bob", json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, _) = send(&app.router, post("/sync/payments", "alice", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_sync_id() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/sync/sync-0-missing/status")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_sync_history() {
    let app = test_app(SyncPolicy::default());
    for _ in 0..3 {
        let (status, _) = send(&app.router, post("/sync/payments", "alice", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app.router, get("/sync-history/payments?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app.router, get("/sync-history/payments")).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app.router, get("/sync-history/ledger")).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_errors() {
    let app = test_app(SyncPolicy::default());
    let mut snapshot = ApplicationSnapshot::healthy("payments-prod", "payments");
    snapshot.health = HealthStatus::Degraded;
    snapshot.error_messages = vec!["Deployment/payments-api: CrashLoopBackOff".to_string()];
    app.argocd.set_application(snapshot);

    let (status, body) = send(&app.router, get("/errors/payments")).await;
    assert_eq!(status, StatusCode::OK);

    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["type"], "resource_error");
    assert_eq!(errors[0]["severity"], "high");
    assert_eq!(errors[0]["resourceName"], "payments-api");

    let ids: Vec<&str> = body["recoveryActions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["manual-sync", "force-sync", "view-logs", "scale-down"]);
}

#[tokio::test]
async fn test_logs() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/logs/ledger")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["logsUrl"],
        "https://argocd.example.com/applications/ledger-staging?view=pods&tab=logs"
    );
}

#[tokio::test]
async fn test_health() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["version"], SIMULATED_VERSION);

    app.argocd.set_unreachable(Some("connection refused"));
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["healthy"], false);
    assert_eq!(body["error"], "connection refused");
}

#[tokio::test]
async fn test_version() {
    let app = test_app(SyncPolicy::default());
    let (status, body) = send(&app.router, get("/version")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["gitHash"].is_string());
    assert!(body["buildTime"].is_string());
}
