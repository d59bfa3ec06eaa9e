//! 거래 기록 endpoint.
//!
//! 거래를 생성/수정/삭제하면 소속 계좌의 잔고를 동기화합니다.
//! 동기화 실패는 로그만 남기고 거래 작업의 응답에는 영향을 주지 않습니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/accounts/{id}/trades` - 계좌별 거래 목록
//! - `POST /api/v1/accounts/{id}/trades` - 거래 생성
//! - `GET /api/v1/trades/{id}` - 거래 조회
//! - `PUT /api/v1/trades/{id}` - 거래 수정
//! - `DELETE /api/v1/trades/{id}` - 거래 삭제

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use journal_core::{JournalError, NewTrade, Trade, TradeDirection, TradeOutcome, TradeUpdate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::get_services;
use crate::auth::AuthUser;
use crate::error::{journal_error, validation_error, ApiResult};
use crate::services::JournalServices;
use crate::state::AppState;

/// 가격/수량 검증 (0 초과)
fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("not_positive")
            .with_message("가격과 수량은 0보다 커야 합니다".into()));
    }
    Ok(())
}

/// 거래 생성 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTradeRequest {
    /// 거래 심볼 (예: "NQ", "EURUSD")
    #[validate(length(min = 1, max = 20, message = "심볼은 1-20자여야 합니다"))]
    pub symbol: String,
    pub direction: TradeDirection,
    #[validate(custom(function = "validate_positive"))]
    pub entry_price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_positive"))]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    #[validate(custom(function = "validate_positive"))]
    pub stop_loss: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    pub entry_date: DateTime<Utc>,
    #[serde(default)]
    pub exit_date: Option<DateTime<Utc>>,
    /// 실현 손익 (미청산이면 생략)
    #[serde(default)]
    pub pnl: Option<Decimal>,
    /// 생략하면 손익으로부터 추론
    #[serde(default)]
    pub outcome: Option<TradeOutcome>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "메모는 2000자 이하여야 합니다"))]
    pub notes: Option<String>,
}

/// 거래 수정 요청 (생략한 필드는 유지).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTradeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "심볼은 1-20자여야 합니다"))]
    pub symbol: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_positive"))]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    #[validate(custom(function = "validate_positive"))]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub exit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub outcome: Option<TradeOutcome>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "메모는 2000자 이하여야 합니다"))]
    pub notes: Option<String>,
}

impl From<UpdateTradeRequest> for TradeUpdate {
    fn from(req: UpdateTradeRequest) -> Self {
        Self {
            symbol: req.symbol.map(|s| s.trim().to_uppercase()),
            exit_price: req.exit_price,
            stop_loss: req.stop_loss,
            exit_date: req.exit_date,
            pnl: req.pnl,
            outcome: req.outcome,
            notes: req.notes,
        }
    }
}

/// 거래 응답.
#[derive(Debug, Serialize)]
pub struct TradeResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub quantity: Decimal,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    pub outcome: TradeOutcome,
    pub r_multiple: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Trade> for TradeResponse {
    fn from(t: Trade) -> Self {
        Self {
            id: t.id,
            account_id: t.account_id,
            symbol: t.symbol,
            direction: t.direction,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            stop_loss: t.stop_loss,
            quantity: t.quantity,
            entry_date: t.entry_date,
            exit_date: t.exit_date,
            pnl: t.pnl,
            outcome: t.outcome,
            r_multiple: t.r_multiple,
            notes: t.notes,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// 거래 목록 응답.
#[derive(Debug, Serialize)]
pub struct TradesListResponse {
    pub trades: Vec<TradeResponse>,
    pub total: i64,
}

/// 계좌 소유권 확인.
async fn ensure_account(
    services: &JournalServices,
    account_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    services
        .store
        .get_account(account_id, user_id)
        .await
        .map_err(journal_error)?
        .map(|_| ())
        .ok_or_else(|| journal_error(JournalError::account_not_found(account_id)))
}

/// 계좌별 거래 목록.
///
/// GET /api/v1/accounts/{id}/trades
pub async fn list_account_trades(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<TradesListResponse>> {
    let services = get_services(&state)?;
    ensure_account(services, account_id, user_id).await?;

    let (trades, total) = tokio::try_join!(
        services.store.list_trades(account_id, user_id),
        services.store.count_trades(account_id, user_id),
    )
    .map_err(journal_error)?;

    Ok(Json(TradesListResponse {
        trades: trades.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// 거래 생성.
///
/// POST /api/v1/accounts/{id}/trades
pub async fn create_trade(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<CreateTradeRequest>,
) -> ApiResult<(StatusCode, Json<TradeResponse>)> {
    request.validate().map_err(validation_error)?;
    let services = get_services(&state)?;
    ensure_account(services, account_id, user_id).await?;

    let trade = services
        .store
        .create_trade(NewTrade {
            account_id,
            user_id,
            symbol: request.symbol.trim().to_uppercase(),
            direction: request.direction,
            entry_price: request.entry_price,
            exit_price: request.exit_price,
            stop_loss: request.stop_loss,
            quantity: request.quantity,
            entry_date: request.entry_date,
            exit_date: request.exit_date,
            pnl: request.pnl,
            outcome: request.outcome,
            notes: request.notes,
        })
        .await
        .map_err(journal_error)?;

    info!(trade_id = %trade.id, %account_id, outcome = %trade.outcome, "Trade recorded");
    services
        .balance
        .sync_balance_best_effort(account_id, user_id)
        .await;

    Ok((StatusCode::CREATED, Json(trade.into())))
}

/// 거래 조회.
///
/// GET /api/v1/trades/{id}
pub async fn get_trade(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(trade_id): Path<Uuid>,
) -> ApiResult<Json<TradeResponse>> {
    let services = get_services(&state)?;
    let trade = services
        .store
        .get_trade(trade_id, user_id)
        .await
        .map_err(journal_error)?
        .ok_or_else(|| journal_error(JournalError::trade_not_found(trade_id)))?;

    Ok(Json(trade.into()))
}

/// 거래 수정.
///
/// PUT /api/v1/trades/{id}
pub async fn update_trade(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(trade_id): Path<Uuid>,
    Json(request): Json<UpdateTradeRequest>,
) -> ApiResult<Json<TradeResponse>> {
    request.validate().map_err(validation_error)?;
    let services = get_services(&state)?;

    let trade = services
        .store
        .update_trade(trade_id, user_id, request.into())
        .await
        .map_err(journal_error)?
        .ok_or_else(|| journal_error(JournalError::trade_not_found(trade_id)))?;

    info!(%trade_id, outcome = %trade.outcome, "Trade updated");
    services
        .balance
        .sync_balance_best_effort(trade.account_id, user_id)
        .await;

    Ok(Json(trade.into()))
}

/// 거래 삭제.
///
/// DELETE /api/v1/trades/{id}
pub async fn delete_trade(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(trade_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let services = get_services(&state)?;

    let trade = services
        .store
        .delete_trade(trade_id, user_id)
        .await
        .map_err(journal_error)?
        .ok_or_else(|| journal_error(JournalError::trade_not_found(trade_id)))?;

    info!(%trade_id, account_id = %trade.account_id, "Trade deleted");
    services
        .balance
        .sync_balance_best_effort(trade.account_id, user_id)
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// 거래 라우터 생성.
///
/// 계좌별 목록/생성은 [`super::accounts_router`]에 연결됩니다.
pub fn trades_router() -> Router<Arc<AppState>> {
    Router::new().route("/{id}", get(get_trade).put(update_trade).delete(delete_trade))
}
