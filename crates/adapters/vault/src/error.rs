//! Classification of backend failures into AppError

use std::fmt;
use vaultonic_errors::AppError;

use crate::backend::BackendError;

/// Remote operation a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Unwrap,
    Login,
    Encrypt,
    KvPut,
    KvGet,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unwrap => "unwrap",
            Self::Login => "login",
            Self::Encrypt => "encrypt",
            Self::KvPut => "kv_put",
            Self::KvGet => "kv_get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker Vault adds to a 403 when the token itself is unknown, expired or revoked
const INVALID_TOKEN: &str = "invalid token";

/// Whether the service rejected the token rather than the request.
///
/// A 403 without the marker is a policy denial on one path; the token stays usable.
pub fn is_token_rejected(err: &BackendError) -> bool {
    match err {
        BackendError::Api { status: 401, .. } => true,
        BackendError::Api { status: 403, errors } => errors.iter().any(|e| e.contains(INVALID_TOKEN)),
        _ => false,
    }
}

/// Convert a backend error to AppError, tagged with operation and target key/path
pub fn map_backend_error(err: BackendError, op: Operation, target: &str) -> AppError {
    let message = format!("{} {}: {}", op, target, err);

    if is_token_rejected(&err) {
        return AppError::unauthenticated(message);
    }

    match (op, err.status()) {
        (Operation::Unwrap | Operation::Login, _) => AppError::unauthenticated(message),
        (Operation::KvGet, Some(404)) => AppError::not_found(message),
        (Operation::Encrypt, _) => AppError::encryption(message),
        (Operation::KvPut | Operation::KvGet, _) => AppError::storage(message),
    }
}
