//! Authenticated AppRole session and the operations that need its token

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use vaultonic_errors::{AppError, AppResult};

use crate::backend::{AuthenticatedClient, BackendError, VaultBackend, WriteAck};
use crate::client::VaultRsBackend;
use crate::config::{KvConfig, SecretIdKind, VaultConfig};
use crate::error::{is_token_rejected, map_backend_error, Operation};

/// Lifecycle of an established session.
///
/// A session that never logged in does not exist as a value: `Session::establish`
/// either returns an authenticated session or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Authenticated,
    /// The service rejected the token; a new `establish` is required
    Invalid,
}

/// One authenticated session against Vault.
///
/// Shared read-only between concurrent requests. The token is fixed at
/// establish time; the only mutable bit is the invalid marker.
pub struct Session {
    config: VaultConfig,
    client: Box<dyn AuthenticatedClient>,
    invalidated: AtomicBool,
}

impl Session {
    /// Establish a session against a real Vault server
    pub async fn connect(config: VaultConfig) -> AppResult<Self> {
        // check() builds a client from the address, so it must be validated first
        config.validate()?;
        let backend = VaultRsBackend::new(config.address.clone());
        backend.check()?;
        Self::establish(config, &backend).await
    }

    /// Unwrap the secret id when needed, then log in with AppRole
    pub async fn establish(config: VaultConfig, backend: &dyn VaultBackend) -> AppResult<Self> {
        config.validate()?;
        info!(address = %config.address, role_id = %config.role_id, "Connecting to Vault");

        let client = tokio::time::timeout(config.login_timeout(), login(&config, backend))
            .await
            .map_err(|_| {
                AppError::unauthenticated(format!(
                    "login at {} timed out after {}s",
                    config.address, config.login_timeout_secs
                ))
            })??;

        if client.token().is_empty() {
            return Err(AppError::unauthenticated("login returned an empty token"));
        }

        info!("Successfully authenticated with Vault");

        Ok(Self {
            config,
            client,
            invalidated: AtomicBool::new(false),
        })
    }

    pub fn token(&self) -> &str {
        self.client.token()
    }

    pub fn state(&self) -> SessionState {
        if self.invalidated.load(Ordering::Acquire) {
            SessionState::Invalid
        } else {
            SessionState::Authenticated
        }
    }

    /// Encrypt `plaintext` under the configured transit key, returning the
    /// service's ciphertext token (`vault:v1:...`)
    pub async fn encrypt(&self, plaintext: &[u8]) -> AppResult<String> {
        let key_name = &self.config.key_name;
        let encoded = STANDARD.encode(plaintext);
        debug!(%key_name, bytes = plaintext.len(), "Encrypting data");

        self.call(
            Operation::Encrypt,
            key_name,
            self.client
                .transit_encrypt(&self.config.transit_mount, key_name, &encoded),
        )
        .await
    }

    /// Write `{field: value}` at `secret_path/name`.
    ///
    /// KV v2 writes replace the whole record with a new version, so any other
    /// fields of the previous version are not carried over.
    pub async fn put_secret(&self, name: &str, field: &str, value: &str) -> AppResult<WriteAck> {
        let kv = self.kv()?;
        if field.is_empty() {
            return Err(AppError::validation("secret field name is empty"));
        }
        let path = secret_path(&kv.secret_path, name)?;
        let target = format!("{}/{}", kv.mount, path);
        debug!(%target, %field, "Writing secret");

        let fields = HashMap::from([(field.to_string(), value.to_string())]);
        self.call(Operation::KvPut, &target, self.client.kv_put(&kv.mount, &path, &fields))
            .await
    }

    /// Read the latest version of the record at `secret_path/name`
    pub async fn get_secret(&self, name: &str) -> AppResult<HashMap<String, String>> {
        let kv = self.kv()?;
        let path = secret_path(&kv.secret_path, name)?;
        let target = format!("{}/{}", kv.mount, path);
        debug!(%target, "Reading secret");

        self.call(Operation::KvGet, &target, self.client.kv_get(&kv.mount, &path))
            .await
    }

    fn kv(&self) -> AppResult<&KvConfig> {
        self.config
            .kv
            .as_ref()
            .ok_or_else(|| AppError::failed_precondition("KV storage is not configured for this session"))
    }

    /// Run one backend request under the request timeout and classify its outcome
    async fn call<T, F>(&self, op: Operation, target: &str, request: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let result = match tokio::time::timeout(self.config.request_timeout(), request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if is_token_rejected(&err) && !self.invalidated.swap(true, Ordering::AcqRel) {
                    warn!(operation = %op, "Vault rejected the session token; session is now invalid");
                }
                Err(map_backend_error(err, op, target))
            }
            Err(_) => Err(AppError::timeout(format!(
                "{} {}: no answer within {}s",
                op, target, self.config.request_timeout_secs
            ))),
        };

        record(op, if result.is_ok() { "ok" } else { "error" });
        result
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

async fn login(config: &VaultConfig, backend: &dyn VaultBackend) -> AppResult<Box<dyn AuthenticatedClient>> {
    let secret_id = match config.secret_id_kind {
        SecretIdKind::Wrapped => {
            debug!("Unwrapping AppRole secret id");
            let secret_id = backend
                .unwrap_secret_id(config.secret_id.expose_secret())
                .await
                .map_err(|e| map_backend_error(e, Operation::Unwrap, "sys/wrapping/unwrap"))?;
            Secret::new(secret_id)
        }
        SecretIdKind::Plain => config.secret_id.clone(),
    };

    let target = format!("auth/{}/login", config.approle_mount);
    backend
        .approle_login(&config.approle_mount, &config.role_id, secret_id.expose_secret())
        .await
        .map_err(|e| map_backend_error(e, Operation::Login, &target))
}

fn record(op: Operation, outcome: &'static str) {
    metrics::counter!("vault_operations_total", "operation" => op.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Join the configured prefix and a secret name into a KV path
pub fn secret_path(prefix: &str, name: &str) -> AppResult<String> {
    let name = name.trim_matches('/');
    if name.is_empty() {
        return Err(AppError::validation("secret name is empty"));
    }
    if name.split('/').any(|segment| segment == "..") {
        return Err(AppError::validation(format!("secret name '{}' escapes the secret path", name)));
    }

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(name.to_string())
    } else {
        Ok(format!("{}/{}", prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfigBuilder;
    use crate::memory::InMemoryVault;

    fn config() -> VaultConfig {
        VaultConfigBuilder::new("http://127.0.0.1:8200")
            .with_approle("r1", "s1")
            .with_key_name("test-key")
            .with_kv("secret", "/go-test")
            .build()
    }

    #[test]
    fn test_secret_path_joins_prefix() {
        assert_eq!(secret_path("/go-test", "mysecret").unwrap(), "go-test/mysecret");
        assert_eq!(secret_path("app/", "db").unwrap(), "app/db");
        assert_eq!(secret_path("", "db").unwrap(), "db");
        assert_eq!(secret_path("/", "nested/db").unwrap(), "nested/db");
    }

    #[test]
    fn test_secret_path_rejects_bad_names() {
        assert!(matches!(secret_path("app", ""), Err(AppError::Validation(_))));
        assert!(matches!(secret_path("app", "/"), Err(AppError::Validation(_))));
        assert!(matches!(secret_path("app", "../other"), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_establish_plain_secret_id() {
        let vault = InMemoryVault::new()
            .with_role("r1", "s1")
            .with_issued_token("t1");

        let session = Session::establish(config(), &vault).await.unwrap();
        assert_eq!(session.token(), "t1");
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_invalid_config_never_contacts_backend() {
        let vault = InMemoryVault::new().with_role("r1", "s1");
        let config = VaultConfigBuilder::new("http://127.0.0.1:8200")
            .with_approle("r1", "s1")
            .build();

        let err = Session::establish(config, &vault).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(vault.login_count(), 0);
    }

    #[tokio::test]
    async fn test_debug_hides_token() {
        let vault = InMemoryVault::new()
            .with_role("r1", "s1")
            .with_issued_token("t1-very-secret");
        let session = Session::establish(config(), &vault).await.unwrap();

        let debug_output = format!("{:?}", session);
        assert!(!debug_output.contains("t1-very-secret"));
        assert!(debug_output.contains("Authenticated"));
    }

    #[tokio::test]
    async fn test_empty_field_is_rejected() {
        let vault = InMemoryVault::new().with_role("r1", "s1");
        let session = Session::establish(config(), &vault).await.unwrap();

        let err = session.put_secret("mysecret", "", "v").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
