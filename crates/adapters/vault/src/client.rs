//! Vault client implementation backed by vaultrs

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};
use vaultrs::client::{VaultClient as VaultRsClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::{kv2, sys, transit};
use vaultrs_login::engines::approle::AppRoleLogin;
use vaultrs_login::LoginClient;
use vaultonic_errors::{AppError, AppResult};

use crate::backend::{AuthenticatedClient, BackendError, VaultBackend, WriteAck};

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::APIError { code, errors } => BackendError::Api {
                status: code,
                errors,
            },
            other => BackendError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnwrappedSecretId {
    secret_id: String,
}

/// Backend talking to a real Vault server
pub struct VaultRsBackend {
    address: String,
}

impl VaultRsBackend {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    fn client(&self, token: Option<&str>) -> Result<VaultRsClient, BackendError> {
        let mut builder = VaultClientSettingsBuilder::default();
        builder.address(&self.address);
        if let Some(token) = token {
            builder.token(token);
        }

        let settings = builder
            .build()
            .map_err(|e| BackendError::Transport(format!("invalid client settings: {}", e)))?;

        Ok(VaultRsClient::new(settings)?)
    }

    /// Fail early when the address cannot produce a client at all
    pub fn check(&self) -> AppResult<()> {
        self.client(None)
            .map(|_| ())
            .map_err(|e| AppError::config(format!("Failed to create Vault client: {}", e)))
    }
}

#[async_trait]
impl VaultBackend for VaultRsBackend {
    async fn unwrap_secret_id(&self, wrapping_token: &str) -> Result<String, BackendError> {
        // The wrapping token authenticates its own unwrap request.
        let client = self.client(Some(wrapping_token))?;
        let unwrapped: UnwrappedSecretId = sys::wrapping::unwrap(&client, None).await?;
        Ok(unwrapped.secret_id)
    }

    async fn approle_login(
        &self,
        mount: &str,
        role_id: &str,
        secret_id: &str,
    ) -> Result<Box<dyn AuthenticatedClient>, BackendError> {
        let mut client = self.client(None)?;

        info!(%role_id, "Authenticating with AppRole");
        let login = AppRoleLogin::new(role_id, secret_id);
        client.login(mount, &login).await?;

        let token = client.settings.token.clone();
        Ok(Box::new(VaultRsSession { client, token }))
    }
}

/// vaultrs client carrying the token issued by AppRole login
struct VaultRsSession {
    client: VaultRsClient,
    token: String,
}

#[async_trait]
impl AuthenticatedClient for VaultRsSession {
    fn token(&self) -> &str {
        &self.token
    }

    async fn transit_encrypt(
        &self,
        mount: &str,
        key_name: &str,
        plaintext_b64: &str,
    ) -> Result<String, BackendError> {
        let response = transit::data::encrypt(&self.client, mount, key_name, plaintext_b64, None).await?;
        Ok(response.ciphertext)
    }

    async fn kv_put(
        &self,
        mount: &str,
        path: &str,
        fields: &HashMap<String, String>,
    ) -> Result<WriteAck, BackendError> {
        let metadata = kv2::set(&self.client, mount, path, fields).await?;
        debug!(%path, version = metadata.version, "KV write acknowledged");
        Ok(WriteAck {
            version: metadata.version,
        })
    }

    async fn kv_get(&self, mount: &str, path: &str) -> Result<HashMap<String, String>, BackendError> {
        let secret: HashMap<String, String> = kv2::read(&self.client, mount, path).await?;
        Ok(secret)
    }
}
