//! API 路由

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use vaultonic_telemetry::HealthStatus;
use vaultonic_vault::SessionState;

use crate::middleware::{VaultLayer, VaultSession};
use crate::secrets::secret_routes;

/// 组装完整的应用路由
pub fn app(vault: VaultLayer, metrics: Option<PrometheusHandle>) -> Router {
    let mut router = secret_routes().merge(api_routes());
    if let Some(handle) = metrics {
        router = router.merge(metrics_routes(handle));
    }

    vault.apply(router).layer(TraceLayer::new_for_http())
}

pub fn api_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

fn metrics_routes(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(handle)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub session: SessionState,
    #[serde(flatten)]
    pub health: HealthStatus,
}

async fn readiness_check(VaultSession(session): VaultSession) -> (StatusCode, Json<ReadinessResponse>) {
    let state = session.state();
    let mut health = HealthStatus::new();
    match state {
        SessionState::Authenticated => health.add_check("vault-session", true, None),
        SessionState::Invalid => health.add_check(
            "vault-session",
            false,
            Some("token rejected by Vault; restart to log in again".to_string()),
        ),
    }

    let status = if health.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: health.healthy,
            session: state,
            health,
        }),
    )
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

#[cfg(test)]
mod tests {
    use crate::test_support::{app, get_json, stub};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let (app, _vault) = app(stub()).await;

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_while_authenticated() {
        let (app, _vault) = app(stub()).await;

        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["session"], "authenticated");
    }

    #[tokio::test]
    async fn test_denied_path_keeps_service_ready() {
        let (app, _vault) = app(stub().with_denied_path("secret", "go-test/forbidden")).await;

        let (status, _) = get_json(&app, "/secret/read/forbidden").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"], "authenticated");
    }

    #[tokio::test]
    async fn test_not_ready_after_token_rejected() {
        let (app, vault) = app(stub()).await;
        vault.revoke_all_tokens();

        let (status, _) = get_json(&app, "/encrypt/hello").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["session"], "invalid");
        assert_eq!(body["checks"][0]["name"], "vault-session");
    }
}
