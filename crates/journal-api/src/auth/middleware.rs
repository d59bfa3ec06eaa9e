//! Axum용 인증 추출기.
//!
//! 보호된 핸들러는 [`AuthUser`]를 인자로 받아 검증된 사용자 ID를 주입받습니다.
//! 핸들러 안에서 인증 정보를 직접 조회하지 않습니다.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::jwt::{decode_token, JwtError};
use crate::error::ApiErrorResponse;

/// 인증된 사용자 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn list_accounts(
///     AuthUser(user_id): AuthUser,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<AccountsListResponse>> {
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// 인증 실패.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse::new("NOT_AUTHENTICATED", self.to_string()));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// JWT 검증 설정.
///
/// 라우터에 `Extension`으로 등록되어 추출기에서 사용됩니다.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Authorization 헤더에서 토큰 추출
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let jwt_secret = parts
            .extensions
            .get::<JwtConfig>()
            .map(|c| c.secret.clone())
            .unwrap_or_else(|| {
                // 개발/테스트 환경용 기본 시크릿 (프로덕션에서는 반드시 설정 필요)
                std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "development-secret-key-change-in-production".to_string())
            });

        let token_data = decode_token(token, &jwt_secret).map_err(|e| match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let user_id = token_data
            .claims
            .user_id()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{create_token, Claims};
    use axum::{body::Body, http::Request, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret-key-0123456789";

    async fn whoami(AuthUser(user_id): AuthUser) -> String {
        user_id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(Extension(JwtConfig {
                secret: SECRET.to_string(),
            }))
    }

    #[tokio::test]
    async fn test_valid_token_injects_user() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, 5), SECRET).unwrap();

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_bad_scheme_and_signature() {
        let token = create_token(&Claims::new(Uuid::new_v4(), 5), "other-secret").unwrap();

        for header in [format!("Token {}", token), format!("Bearer {}", token)] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .uri("/me")
                        .header(AUTHORIZATION, header)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
