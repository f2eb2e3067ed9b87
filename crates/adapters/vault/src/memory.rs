//! In-memory Vault double for tests and local development
//!
//! Mirrors the status codes a real Vault returns for the cases the session
//! distinguishes: 400 on bad credentials or unknown transit keys, 403 with
//! `invalid token` on unknown or revoked tokens, plain 403 on paths the
//! policy denies, 404 on missing KV paths.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{AuthenticatedClient, BackendError, VaultBackend, WriteAck};

/// One transit encrypt request as the service received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitRequest {
    pub mount: String,
    pub key_name: String,
    pub plaintext: String,
}

#[derive(Default)]
struct State {
    roles: HashMap<String, String>,
    wrapped: HashMap<String, String>,
    transit_keys: HashSet<String>,
    fixed_ciphertext: Option<String>,
    next_tokens: Vec<String>,
    issued: HashSet<String>,
    denied_paths: HashSet<(String, String)>,
    token_counter: u64,
    logins: usize,
    transit_requests: Vec<TransitRequest>,
    kv: HashMap<(String, String), Vec<HashMap<String, String>>>,
}

/// Shared in-memory Vault; clones see the same state
#[derive(Clone, Default)]
pub struct InMemoryVault {
    state: Arc<Mutex<State>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Accept `secret_id` for `role_id`
    pub fn with_role(self, role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.lock().roles.insert(role_id.into(), secret_id.into());
        self
    }

    /// Register a single-use wrapping token that unwraps to `secret_id`
    pub fn with_wrapped_secret_id(self, wrapping_token: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.lock().wrapped.insert(wrapping_token.into(), secret_id.into());
        self
    }

    pub fn with_transit_key(self, key_name: impl Into<String>) -> Self {
        self.lock().transit_keys.insert(key_name.into());
        self
    }

    /// Answer every encrypt with this ciphertext instead of a derived one
    pub fn with_ciphertext(self, ciphertext: impl Into<String>) -> Self {
        self.lock().fixed_ciphertext = Some(ciphertext.into());
        self
    }

    /// Hand out this token on the next login instead of a generated one
    pub fn with_issued_token(self, token: impl Into<String>) -> Self {
        self.lock().next_tokens.push(token.into());
        self
    }

    /// Deny KV access to `mount/path` for every token, as a narrow policy would
    pub fn with_denied_path(self, mount: impl Into<String>, path: impl Into<String>) -> Self {
        self.lock().denied_paths.insert((mount.into(), path.into()));
        self
    }

    /// Revoke every token issued so far
    pub fn revoke_all_tokens(&self) {
        self.lock().issued.clear();
    }

    pub fn login_count(&self) -> usize {
        self.lock().logins
    }

    pub fn transit_requests(&self) -> Vec<TransitRequest> {
        self.lock().transit_requests.clone()
    }

    /// Number of versions written at `mount/path`
    pub fn version_count(&self, mount: &str, path: &str) -> usize {
        self.lock()
            .kv
            .get(&(mount.to_string(), path.to_string()))
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl VaultBackend for InMemoryVault {
    async fn unwrap_secret_id(&self, wrapping_token: &str) -> Result<String, BackendError> {
        self.lock()
            .wrapped
            .remove(wrapping_token)
            .ok_or_else(|| BackendError::api(400, "wrapping token is not valid or does not exist"))
    }

    async fn approle_login(
        &self,
        _mount: &str,
        role_id: &str,
        secret_id: &str,
    ) -> Result<Box<dyn AuthenticatedClient>, BackendError> {
        let mut state = self.lock();
        state.logins += 1;

        match state.roles.get(role_id) {
            Some(expected) if expected == secret_id => {}
            _ => return Err(BackendError::api(400, "invalid role or secret ID")),
        }

        let token = if state.next_tokens.is_empty() {
            state.token_counter += 1;
            format!("hvs.memory{}", state.token_counter)
        } else {
            state.next_tokens.remove(0)
        };
        state.issued.insert(token.clone());

        Ok(Box::new(MemoryClient {
            token,
            vault: self.clone(),
        }))
    }
}

struct MemoryClient {
    token: String,
    vault: InMemoryVault,
}

impl MemoryClient {
    fn authorized(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        let state = self.vault.lock();
        if state.issued.contains(&self.token) {
            Ok(state)
        } else {
            Err(BackendError::Api {
                status: 403,
                errors: vec!["permission denied".into(), "invalid token".into()],
            })
        }
    }

    fn kv_authorized(&self, mount: &str, path: &str) -> Result<MutexGuard<'_, State>, BackendError> {
        let state = self.authorized()?;
        if state.denied_paths.contains(&(mount.to_string(), path.to_string())) {
            return Err(BackendError::api(403, "1 error occurred:\n\t* permission denied"));
        }
        Ok(state)
    }
}

#[async_trait]
impl AuthenticatedClient for MemoryClient {
    fn token(&self) -> &str {
        &self.token
    }

    async fn transit_encrypt(
        &self,
        mount: &str,
        key_name: &str,
        plaintext_b64: &str,
    ) -> Result<String, BackendError> {
        let mut state = self.authorized()?;
        state.transit_requests.push(TransitRequest {
            mount: mount.to_string(),
            key_name: key_name.to_string(),
            plaintext: plaintext_b64.to_string(),
        });

        if !state.transit_keys.contains(key_name) {
            return Err(BackendError::api(400, "encryption key not found"));
        }

        Ok(state
            .fixed_ciphertext
            .clone()
            .unwrap_or_else(|| format!("vault:v1:{}", plaintext_b64)))
    }

    async fn kv_put(
        &self,
        mount: &str,
        path: &str,
        fields: &HashMap<String, String>,
    ) -> Result<WriteAck, BackendError> {
        let mut state = self.kv_authorized(mount, path)?;
        let versions = state
            .kv
            .entry((mount.to_string(), path.to_string()))
            .or_default();
        versions.push(fields.clone());

        Ok(WriteAck {
            version: versions.len() as u64,
        })
    }

    async fn kv_get(&self, mount: &str, path: &str) -> Result<HashMap<String, String>, BackendError> {
        let state = self.kv_authorized(mount, path)?;
        state
            .kv
            .get(&(mount.to_string(), path.to_string()))
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or(BackendError::Api {
                status: 404,
                errors: vec![],
            })
    }
}
