//! 加密与密钥读写路由

use std::collections::HashMap;

use axum::{extract::Path, routing::get, Json, Router};
use tracing::info;

use crate::error::{ApiError, MessageResponse};
use crate::middleware::VaultSession;

pub fn secret_routes() -> Router {
    Router::new()
        .route("/encrypt/{plaintext}", get(encrypt))
        .route("/secret/write/{name}/{field}/{value}", get(write_secret))
        .route("/secret/read/{name}", get(read_secret))
}

async fn encrypt(
    VaultSession(session): VaultSession,
    Path(plaintext): Path<String>,
) -> Result<Json<MessageResponse<String>>, ApiError> {
    let ciphertext = session.encrypt(plaintext.as_bytes()).await?;
    Ok(Json(MessageResponse::new(ciphertext)))
}

async fn write_secret(
    VaultSession(session): VaultSession,
    Path((name, field, value)): Path<(String, String, String)>,
) -> Result<Json<MessageResponse<&'static str>>, ApiError> {
    let ack = session.put_secret(&name, &field, &value).await?;
    info!(secret = %name, version = ack.version, "Secret written");
    Ok(Json(MessageResponse::new("ok")))
}

async fn read_secret(
    VaultSession(session): VaultSession,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse<HashMap<String, String>>>, ApiError> {
    let secret = session.get_secret(&name).await?;
    Ok(Json(MessageResponse::new(secret)))
}
