//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/accounts` - 계좌 관리, 잔고 동기화, 계좌별 거래/지표
//! - `/api/v1/trades` - 개별 거래 조회/수정/삭제
//! - `/api/v1/leaderboard` - 리더보드 및 참여 설정
//!
//! `/health`를 제외한 모든 엔드포인트는 Bearer 토큰 인증이 필요합니다.

pub mod accounts;
pub mod dashboard;
pub mod health;
pub mod leaderboard;
pub mod trades;

pub use accounts::{accounts_router, AccountResponse, AccountsListResponse, SyncResponse};
pub use dashboard::DashboardResponse;
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use leaderboard::{leaderboard_router, OptInResponse};
pub use trades::{trades_router, TradeResponse, TradesListResponse};

use axum::{
    http::{Method, StatusCode, Uri},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::services::JournalServices;
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/accounts", accounts_router())
        .nest("/api/v1/trades", trades_router())
        .nest("/api/v1/leaderboard", leaderboard_router())
}

/// 상태와 인증 설정이 적용된 애플리케이션 라우터.
pub fn create_app(state: Arc<AppState>) -> Router {
    create_api_router()
        .fallback(not_found)
        .layer(Extension(state.jwt_config()))
        .with_state(state)
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(
            ApiErrorResponse::new("ROUTE_NOT_FOUND", "요청한 경로가 없습니다")
                .with_request_info(&method, &uri),
        ),
    )
}

/// 서비스 가져오기 (저장소 미설정 시 503).
pub(crate) fn get_services(state: &AppState) -> ApiResult<&JournalServices> {
    state.services.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiErrorResponse::new(
                "DB_NOT_CONNECTED",
                "Database connection is not available",
            )),
        )
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::{create_token, Claims};
    use crate::repository::MemoryStore;
    use crate::state::create_test_state;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    pub struct TestApp {
        pub router: Router,
        pub store: Arc<MemoryStore>,
        secret: String,
    }

    impl TestApp {
        pub fn new() -> Self {
            let (state, store) = create_test_state();
            let secret = state.config.auth.jwt_secret.clone();
            Self {
                router: create_app(Arc::new(state)),
                store,
                secret,
            }
        }

        pub fn token(&self, user_id: Uuid) -> String {
            create_token(&Claims::new(user_id, 5), &self.secret).unwrap()
        }

        /// 인증된 요청을 보내고 상태 코드와 JSON 본문을 반환합니다.
        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            user_id: Option<Uuid>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user_id) = user_id {
                builder = builder.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", self.token(user_id)),
                );
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }

        /// 계좌를 만들고 ID를 반환합니다.
        pub async fn create_account(&self, user_id: Uuid, initial_balance: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/v1/accounts",
                    Some(user_id),
                    Some(serde_json::json!({
                        "name": "main",
                        "initial_balance": initial_balance,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }

        /// 손익이 확정된 거래를 만들고 ID를 반환합니다.
        pub async fn create_trade(&self, user_id: Uuid, account_id: &str, pnl: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    &format!("/api/v1/accounts/{}/trades", account_id),
                    Some(user_id),
                    Some(serde_json::json!({
                        "symbol": "NQ",
                        "direction": "long",
                        "entry_price": "18000",
                        "quantity": "1",
                        "entry_date": "2024-06-03T14:30:00Z",
                        "pnl": pnl,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/v2/nothing", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "ROUTE_NOT_FOUND");
        assert_eq!(body["path"], "/api/v2/nothing");
    }
}
