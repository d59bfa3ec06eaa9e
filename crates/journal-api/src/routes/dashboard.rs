//! 대시보드 지표 endpoint.
//!
//! GET /api/v1/accounts/{id}/metrics

use axum::{
    extract::{Path, State},
    Json,
};
use journal_core::{DashboardMetrics, JournalError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::get_services;
use crate::auth::AuthUser;
use crate::error::{journal_error, ApiResult};
use crate::state::AppState;

/// 대시보드 응답.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub account_id: Uuid,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    /// 초기 잔고 대비 수익률 (%)
    pub return_pct: Decimal,
    pub metrics: DashboardMetrics,
}

/// 계좌 대시보드 지표.
pub async fn get_account_metrics(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<DashboardResponse>> {
    let services = get_services(&state)?;

    let (account, metrics) = tokio::try_join!(
        services.store.get_account(account_id, user_id),
        services.metrics.compute_metrics(account_id, user_id),
    )
    .map_err(journal_error)?;

    let account =
        account.ok_or_else(|| journal_error(JournalError::account_not_found(account_id)))?;

    Ok(Json(DashboardResponse {
        account_id,
        initial_balance: account.initial_balance,
        current_balance: account.current_balance,
        return_pct: account.return_pct().round_dp(2),
        metrics,
    }))
}
