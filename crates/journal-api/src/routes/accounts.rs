//! 계좌 관리 endpoint.
//!
//! 계좌 생성/조회/삭제와 잔고 동기화를 제공합니다.
//! 계좌별 거래 목록과 대시보드 지표도 이 라우터 아래에 연결됩니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/accounts` - 내 계좌 목록
//! - `POST /api/v1/accounts` - 계좌 생성
//! - `GET /api/v1/accounts/{id}` - 계좌 조회
//! - `DELETE /api/v1/accounts/{id}` - 계좌 삭제 (거래 포함)
//! - `PATCH /api/v1/accounts/{id}/balance` - 현재 잔고 직접 수정
//! - `POST /api/v1/accounts/{id}/sync` - 잔고 동기화
//! - `GET|POST /api/v1/accounts/{id}/trades` - 계좌별 거래
//! - `GET /api/v1/accounts/{id}/metrics` - 대시보드 지표

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use journal_core::{Account, JournalError, NewAccount, SyncOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{dashboard, get_services, trades};
use crate::auth::AuthUser;
use crate::error::{journal_error, validation_error, ApiResult};
use crate::state::AppState;

// ==================== 커스텀 검증 함수 ====================

/// 잔고 검증 (0 이상)
fn validate_balance(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("balance_negative")
            .with_message("잔고는 0 이상이어야 합니다".into()));
    }
    Ok(())
}

/// 최대 낙폭 검증 (0 ~ 100%)
fn validate_max_drawdown(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("max_drawdown_out_of_range")
            .with_message("최대 낙폭은 0% 초과 100% 이하여야 합니다".into()));
    }
    Ok(())
}

// ==================== 요청/응답 타입 ====================

/// 계좌 생성 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100, message = "계좌 이름은 1-100자여야 합니다"))]
    pub name: String,
    /// 초기 잔고
    #[validate(custom(function = "validate_balance"))]
    pub initial_balance: Decimal,
    /// 통화 코드 (기본: USD)
    #[serde(default)]
    #[validate(length(equal = 3, message = "통화 코드는 3자여야 합니다"))]
    pub currency: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 1000, message = "레버리지는 1-1000 사이여야 합니다"))]
    pub leverage: Option<i32>,
    /// 허용 최대 낙폭 (%)
    #[serde(default)]
    #[validate(custom(function = "validate_max_drawdown"))]
    pub max_drawdown: Option<Decimal>,
}

/// 잔고 직접 수정 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBalanceRequest {
    #[validate(custom(function = "validate_balance"))]
    pub balance: Decimal,
}

/// 계좌 응답.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub currency: String,
    pub leverage: Option<i32>,
    pub max_drawdown: Option<Decimal>,
    /// 초기 잔고 대비 수익률 (%)
    pub return_pct: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            return_pct: account.return_pct().round_dp(2),
            id: account.id,
            name: account.name,
            initial_balance: account.initial_balance,
            current_balance: account.current_balance,
            currency: account.currency,
            leverage: account.leverage,
            max_drawdown: account.max_drawdown,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// 계좌 목록 응답.
#[derive(Debug, Serialize)]
pub struct AccountsListResponse {
    pub accounts: Vec<AccountResponse>,
    pub total: usize,
}

/// 잔고 동기화 응답.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub account_id: Uuid,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

// ==================== 핸들러 ====================

/// 내 계좌 목록.
///
/// GET /api/v1/accounts
pub async fn list_accounts(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AccountsListResponse>> {
    let services = get_services(&state)?;
    let accounts = services
        .store
        .list_accounts(user_id)
        .await
        .map_err(journal_error)?;

    let accounts: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(AccountsListResponse {
        total: accounts.len(),
        accounts,
    }))
}

/// 계좌 생성.
///
/// POST /api/v1/accounts
pub async fn create_account(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    request.validate().map_err(validation_error)?;
    let services = get_services(&state)?;

    let account = services
        .store
        .create_account(NewAccount {
            user_id,
            name: request.name.trim().to_string(),
            initial_balance: request.initial_balance,
            currency: request
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| "USD".to_string()),
            leverage: request.leverage,
            max_drawdown: request.max_drawdown,
        })
        .await
        .map_err(journal_error)?;

    info!(account_id = %account.id, %user_id, "Account created");
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// 계좌 조회.
///
/// GET /api/v1/accounts/{id}
pub async fn get_account(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<AccountResponse>> {
    let services = get_services(&state)?;
    let account = services
        .store
        .get_account(account_id, user_id)
        .await
        .map_err(journal_error)?
        .ok_or_else(|| journal_error(JournalError::account_not_found(account_id)))?;

    Ok(Json(account.into()))
}

/// 계좌 삭제. 소속 거래도 함께 삭제됩니다.
///
/// DELETE /api/v1/accounts/{id}
pub async fn delete_account(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let services = get_services(&state)?;
    let deleted = services
        .store
        .delete_account(account_id, user_id)
        .await
        .map_err(journal_error)?;

    if !deleted {
        return Err(journal_error(JournalError::account_not_found(account_id)));
    }

    info!(%account_id, %user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 현재 잔고 직접 수정.
///
/// 다음 동기화에서 거래 손익 합계 기준으로 다시 맞춰집니다.
/// PATCH /api/v1/accounts/{id}/balance
pub async fn update_balance(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<UpdateBalanceRequest>,
) -> ApiResult<Json<AccountResponse>> {
    request.validate().map_err(validation_error)?;
    let services = get_services(&state)?;

    let account = services
        .store
        .update_balance(account_id, user_id, request.balance)
        .await
        .map_err(journal_error)?
        .ok_or_else(|| journal_error(JournalError::account_not_found(account_id)))?;

    info!(%account_id, balance = %account.current_balance, "Balance updated manually");
    Ok(Json(account.into()))
}

/// 잔고 동기화.
///
/// POST /api/v1/accounts/{id}/sync
pub async fn sync_account(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<SyncResponse>> {
    let services = get_services(&state)?;
    let outcome = services
        .balance
        .sync_balance(account_id, user_id)
        .await
        .map_err(journal_error)?;

    Ok(Json(SyncResponse {
        account_id,
        outcome,
    }))
}

/// 계좌 라우터 생성.
pub fn accounts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/{id}", get(get_account).delete(delete_account))
        .route("/{id}/balance", patch(update_balance))
        .route("/{id}/sync", post(sync_account))
        .route(
            "/{id}/trades",
            get(trades::list_account_trades).post(trades::create_trade),
        )
        .route("/{id}/metrics", get(dashboard::get_account_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::TestApp;
    use axum::http::Method;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    async fn current_balance(app: &TestApp, user_id: Uuid, account_id: &str) -> Decimal {
        let (status, body) = app
            .send(
                Method::GET,
                &format!("/api/v1/accounts/{}", account_id),
                Some(user_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        decimal(&body["current_balance"])
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/v1/accounts", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_create_and_list_accounts() {
        let app = TestApp::new();
        let user_id = Uuid::new_v4();
        let account_id = app.create_account(user_id, "1000").await;

        let (status, body) = app
            .send(Method::GET, "/api/v1/accounts", Some(user_id), None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["accounts"][0]["id"], account_id.as_str());
        assert_eq!(body["accounts"][0]["currency"], "USD");
        assert_eq!(decimal(&body["accounts"][0]["current_balance"]), dec!(1000));

        // 다른 사용자에게는 보이지 않음
        let (_, body) = app
            .send(Method::GET, "/api/v1/accounts", Some(Uuid::new_v4()), None)
            .await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_balance_follows_trades() {
        let app = TestApp::new();
        let user_id = Uuid::new_v4();
        let account_id = app.create_account(user_id, "1000").await;

        app.create_trade(user_id, &account_id, "50").await;
        assert_eq!(current_balance(&app, user_id, &account_id).await, dec!(1050));

        app.create_trade(user_id, &account_id, "-20").await;
        assert_eq!(current_balance(&app, user_id, &account_id).await, dec!(1030));
    }

    #[tokio::test]
    async fn test_deleting_trades_restores_initial_balance() {
        let app = TestApp::new();
        let user_id = Uuid::new_v4();
        let account_id = app.create_account(user_id, "1000").await;
        let first = app.create_trade(user_id, &account_id, "120.50").await;
        let second = app.create_trade(user_id, &account_id, "-45.25").await;

        for trade_id in [first, second] {
            let (status, _) = app
                .send(
                    Method::DELETE,
                    &format!("/api/v1/trades/{}", trade_id),
                    Some(user_id),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        assert_eq!(current_balance(&app, user_id, &account_id).await, dec!(1000));
    }

    #[tokio::test]
    async fn test_sync_endpoint_corrects_manual_edit() {
        let app = TestApp::new();
        let user_id = Uuid::new_v4();
        let account_id = app.create_account(user_id, "1000").await;
        app.create_trade(user_id, &account_id, "50").await;

        let (status, body) = app
            .send(
                Method::PATCH,
                &format!("/api/v1/accounts/{}/balance", account_id),
                Some(user_id),
                Some(json!({ "balance": "5000" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["current_balance"]), dec!(5000));

        let sync_uri = format!("/api/v1/accounts/{}/sync", account_id);
        let (status, body) = app.send(Method::POST, &sync_uri, Some(user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "updated");
        assert_eq!(decimal(&body["previous"]), dec!(5000));
        assert_eq!(decimal(&body["current"]), dec!(1050));

        let (_, body) = app.send(Method::POST, &sync_uri, Some(user_id), None).await;
        assert_eq!(body["status"], "unchanged");
        assert_eq!(decimal(&body["balance"]), dec!(1050));
    }

    #[tokio::test]
    async fn test_create_account_validation() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/accounts",
                Some(Uuid::new_v4()),
                Some(json!({ "name": "", "initial_balance": "-10" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_foreign_account_is_not_found() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let account_id = app.create_account(owner, "1000").await;
        let uri = format!("/api/v1/accounts/{}", account_id);

        let (status, body) = app.send(Method::GET, &uri, Some(stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = app.send(Method::DELETE, &uri, Some(stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .send(
                Method::POST,
                &format!("{}/sync", uri),
                Some(stranger),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::DELETE, &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send(Method::GET, &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
