//! vaultonic-vault - HashiCorp Vault AppRole session
//!
//! Provides:
//! - AppRole login, with optional unwrapping of a wrapped secret id
//! - Transit encryption under a configured key
//! - KV v2 secret read/write under a configured path prefix
//! - Automatic error mapping to AppError

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod session;

pub use backend::{AuthenticatedClient, BackendError, VaultBackend, WriteAck};
pub use client::VaultRsBackend;
pub use config::{KvConfig, SecretIdKind, VaultConfig, VaultConfigBuilder};
pub use error::Operation;
pub use session::{secret_path, Session, SessionState};
