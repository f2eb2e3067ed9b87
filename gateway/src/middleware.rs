//! 中间件

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tracing::info;
use vaultonic_errors::{AppError, AppResult};
use vaultonic_vault::{Session, VaultBackend, VaultConfig};

use crate::error::ApiError;

/// 启动时建立一次的 Vault 会话，挂载到每个请求上
#[derive(Clone)]
pub struct VaultLayer {
    session: Arc<Session>,
}

impl VaultLayer {
    /// 连接真实的 Vault 服务器
    pub async fn connect(config: VaultConfig) -> AppResult<Self> {
        let session = Session::connect(config).await?;
        Ok(Self::from_session(session))
    }

    pub async fn establish(config: VaultConfig, backend: &dyn VaultBackend) -> AppResult<Self> {
        let session = Session::establish(config, backend).await?;
        Ok(Self::from_session(session))
    }

    fn from_session(session: Session) -> Self {
        info!(state = ?session.state(), "Vault session ready");
        Self {
            session: Arc::new(session),
        }
    }

    /// 给路由挂上会话注入中间件
    pub fn apply(self, router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(self.session, attach_session))
    }
}

/// 将会话注入到请求扩展中
pub async fn attach_session(
    State(session): State<Arc<Session>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Vault 会话提取器
///
/// 应该在 attach_session 之后使用
pub struct VaultSession(pub Arc<Session>);

impl<S> FromRequestParts<S> for VaultSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<Session>>()
            .cloned()
            .map(VaultSession)
            .ok_or_else(|| {
                ApiError(AppError::internal(
                    "Missing vault session in request extensions (attach_session may not have run)",
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{plain_config, stub};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    async fn handler(VaultSession(session): VaultSession) -> String {
        session.token().to_string()
    }

    #[tokio::test]
    async fn test_session_attached_to_every_request() {
        let vault = stub().with_issued_token("t1");
        let layer = VaultLayer::establish(plain_config(), &vault).await.unwrap();
        let app = layer.apply(Router::new().route("/", get(handler)));

        for _ in 0..3 {
            let req = Request::builder().uri("/").body(Body::empty()).unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"t1");
        }
        assert_eq!(vault.login_count(), 1);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let app: Router = Router::new().route("/", get(handler));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_establish_failure_returns_error() {
        let vault = stub();
        let config = vaultonic_vault::VaultConfigBuilder::new("http://127.0.0.1:8200")
            .with_approle("r1", "wrong")
            .with_key_name("test-key")
            .build();

        let result = VaultLayer::establish(config, &vault).await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }
}
