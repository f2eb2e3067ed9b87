use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use vaultonic_vault::memory::InMemoryVault;
use vaultonic_vault::{VaultConfig, VaultConfigBuilder};

use crate::middleware::VaultLayer;

pub fn plain_config() -> VaultConfig {
    VaultConfigBuilder::new("http://127.0.0.1:8200")
        .with_approle("r1", "s1")
        .with_key_name("test-key")
        .with_kv("secret", "/go-test")
        .build()
}

pub fn stub() -> InMemoryVault {
    InMemoryVault::new()
        .with_role("r1", "s1")
        .with_transit_key("test-key")
}

/// Full application router over an in-memory Vault
pub async fn app(vault: InMemoryVault) -> (Router, InMemoryVault) {
    let layer = VaultLayer::establish(plain_config(), &vault).await.unwrap();
    (crate::routing::app(layer, None), vault)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}
