//! Seam between the session and the remote secrets service

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Raw failure reported by a backend, before classification
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The service answered with a non-success status
    #[error("status {status}: {}", .errors.join("; "))]
    Api { status: u16, errors: Vec<String> },

    /// The request never produced a service answer
    #[error("transport: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn api(status: u16, error: impl Into<String>) -> Self {
        Self::Api {
            status,
            errors: vec![error.into()],
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Acknowledgement of a KV v2 write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    /// Version created by the write
    pub version: u64,
}

/// Unauthenticated entry point: credential exchange
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// Exchange a wrapping token for the secret id it wraps
    async fn unwrap_secret_id(&self, wrapping_token: &str) -> Result<String, BackendError>;

    /// AppRole login; the returned client is bound to the issued token
    async fn approle_login(
        &self,
        mount: &str,
        role_id: &str,
        secret_id: &str,
    ) -> Result<Box<dyn AuthenticatedClient>, BackendError>;
}

/// Client bound to one token
#[async_trait]
pub trait AuthenticatedClient: Send + Sync {
    fn token(&self) -> &str;

    /// `plaintext_b64` must already be base64 encoded
    async fn transit_encrypt(
        &self,
        mount: &str,
        key_name: &str,
        plaintext_b64: &str,
    ) -> Result<String, BackendError>;

    async fn kv_put(
        &self,
        mount: &str,
        path: &str,
        fields: &HashMap<String, String>,
    ) -> Result<WriteAck, BackendError>;

    async fn kv_get(&self, mount: &str, path: &str) -> Result<HashMap<String, String>, BackendError>;
}
