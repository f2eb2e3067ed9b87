//! Vault session configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use vaultonic_errors::{AppError, AppResult};

/// How the configured secret id must be turned into an AppRole secret id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretIdKind {
    /// A single-use wrapping token that unwraps to the secret id
    #[default]
    Wrapped,
    /// The secret id itself
    Plain,
}

/// KV v2 storage settings. Absent means KV operations are disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    /// KV v2 secrets engine mount path
    #[serde(default = "default_kv_mount")]
    pub mount: String,

    /// Prefix prepended to every secret name
    #[serde(default)]
    pub secret_path: String,
}

/// Vault client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Vault server address
    pub address: String,

    /// AppRole role ID for authentication
    pub role_id: String,

    /// AppRole secret ID, or a wrapping token for one
    pub secret_id: Secret<String>,

    #[serde(default)]
    pub secret_id_kind: SecretIdKind,

    /// AppRole auth method mount path
    #[serde(default = "default_approle_mount")]
    pub approle_mount: String,

    /// Transit secrets engine mount path
    #[serde(default = "default_transit_mount")]
    pub transit_mount: String,

    /// Transit key used by encrypt
    pub key_name: String,

    #[serde(default)]
    pub kv: Option<KvConfig>,

    /// Upper bound for unwrap + login at startup
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,

    /// Upper bound for each transit / KV request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_kv_mount() -> String {
    "secret".to_string()
}

fn default_approle_mount() -> String {
    "approle".to_string()
}

fn default_transit_mount() -> String {
    "transit".to_string()
}

fn default_login_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            mount: default_kv_mount(),
            secret_path: String::new(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            role_id: String::new(),
            secret_id: Secret::new(String::new()),
            secret_id_kind: SecretIdKind::default(),
            approle_mount: default_approle_mount(),
            transit_mount: default_transit_mount(),
            key_name: String::new(),
            kv: None,
            login_timeout_secs: default_login_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl VaultConfig {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject configurations that can never produce a working session
    pub fn validate(&self) -> AppResult<()> {
        let url = Url::parse(&self.address)
            .map_err(|e| AppError::config(format!("invalid vault address '{}': {}", self.address, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "unsupported vault address scheme '{}'",
                url.scheme()
            )));
        }
        if self.role_id.trim().is_empty() {
            return Err(AppError::config("vault role_id is empty"));
        }
        if self.secret_id.expose_secret().trim().is_empty() {
            return Err(AppError::config("vault secret_id is empty"));
        }
        if self.key_name.trim().is_empty() {
            return Err(AppError::config("vault key_name is empty"));
        }
        if self.login_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(AppError::config("vault timeouts must be greater than zero"));
        }
        Ok(())
    }
}

/// Builder for VaultConfig
pub struct VaultConfigBuilder {
    config: VaultConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder with address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            config: VaultConfig {
                address: address.into(),
                ..Default::default()
            },
        }
    }

    /// Set AppRole credentials with a plain secret id
    pub fn with_approle(mut self, role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.config.role_id = role_id.into();
        self.config.secret_id = Secret::new(secret_id.into());
        self.config.secret_id_kind = SecretIdKind::Plain;
        self
    }

    /// Set AppRole credentials with a wrapping token for the secret id
    pub fn with_wrapped_approle(
        mut self,
        role_id: impl Into<String>,
        wrapping_token: impl Into<String>,
    ) -> Self {
        self.config.role_id = role_id.into();
        self.config.secret_id = Secret::new(wrapping_token.into());
        self.config.secret_id_kind = SecretIdKind::Wrapped;
        self
    }

    pub fn with_approle_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.approle_mount = mount.into();
        self
    }

    /// Set transit key name
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.config.key_name = key_name.into();
        self
    }

    pub fn with_transit_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.transit_mount = mount.into();
        self
    }

    /// Enable KV v2 operations
    pub fn with_kv(mut self, mount: impl Into<String>, secret_path: impl Into<String>) -> Self {
        self.config.kv = Some(KvConfig {
            mount: mount.into(),
            secret_path: secret_path.into(),
        });
        self
    }

    pub fn with_login_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.login_timeout_secs = timeout_secs;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = timeout_secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> VaultConfig {
        self.config
    }
}
