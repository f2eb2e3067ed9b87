//! vaultonic-errors - 统一错误处理
//!
//! 所有 crate 共用的错误分类，以及到 HTTP 状态码的映射

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// Login, unwrap, or a token the secrets service rejected mid-session
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A secret path that does not exist; a storage error subtype
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 令牌被拒绝或登录失败，调用方可据此决定是否重新建立会话
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }

    /// KV 存储错误（包括 NotFound 子类）
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::NotFound(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Timeout(_) => 504,
            Self::Unauthenticated(_) => 500,
            Self::Encryption(_) => 500,
            Self::Storage(_) => 500,
            Self::FailedPrecondition(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
