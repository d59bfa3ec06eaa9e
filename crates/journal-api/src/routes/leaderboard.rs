//! 리더보드 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/leaderboard?sort=pnl&limit=50` - 리더보드 조회
//! - `GET /api/v1/leaderboard/opt-in` - 내 참여 설정
//! - `PUT /api/v1/leaderboard/opt-in` - 참여/공개 설정 변경
//! - `DELETE /api/v1/leaderboard/opt-in` - 참여 해제

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use journal_core::{JournalError, Leaderboard, LeaderboardOptIn, LeaderboardSort, OptInPreferences};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::get_services;
use crate::auth::AuthUser;
use crate::error::{journal_error, validation_error, ApiResult};
use crate::state::AppState;

/// 리더보드 조회 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// 정렬 기준 (pnl, win_rate, trades, avg_r)
    pub sort: Option<String>,
    /// 최대 항목 수 (기본 50, 최대 100)
    pub limit: Option<i64>,
}

/// 참여 설정 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct OptInRequest {
    #[validate(length(min = 1, max = 50, message = "표시 이름은 1-50자여야 합니다"))]
    pub display_name: String,
    #[serde(default)]
    pub show_win_rate: Option<bool>,
    #[serde(default)]
    pub show_pnl: Option<bool>,
    #[serde(default)]
    pub show_trade_count: Option<bool>,
    #[serde(default)]
    pub show_avg_r: Option<bool>,
}

impl From<OptInRequest> for OptInPreferences {
    fn from(req: OptInRequest) -> Self {
        Self {
            display_name: req.display_name.trim().to_string(),
            show_win_rate: req.show_win_rate.unwrap_or(true),
            show_pnl: req.show_pnl.unwrap_or(true),
            show_trade_count: req.show_trade_count.unwrap_or(true),
            show_avg_r: req.show_avg_r.unwrap_or(true),
        }
    }
}

/// 참여 설정 응답.
#[derive(Debug, Serialize)]
pub struct OptInResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub show_win_rate: bool,
    pub show_pnl: bool,
    pub show_trade_count: bool,
    pub show_avg_r: bool,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<LeaderboardOptIn> for OptInResponse {
    fn from(o: LeaderboardOptIn) -> Self {
        Self {
            user_id: o.user_id,
            display_name: o.display_name,
            show_win_rate: o.show_win_rate,
            show_pnl: o.show_pnl,
            show_trade_count: o.show_trade_count,
            show_avg_r: o.show_avg_r,
            is_active: o.is_active,
            updated_at: o.updated_at,
        }
    }
}

/// 리더보드 조회.
///
/// 뷰를 사용할 수 없으면 참여자 목록만으로 응답합니다 (`source: "opt_ins"`).
/// GET /api/v1/leaderboard
pub async fn get_leaderboard(
    AuthUser(_user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Leaderboard>> {
    let services = get_services(&state)?;

    let sort = match query.sort.as_deref() {
        Some(s) => s.parse::<LeaderboardSort>().map_err(journal_error)?,
        None => LeaderboardSort::default(),
    };

    let board = services.leaderboard.get_leaderboard(sort, query.limit).await;
    Ok(Json(board))
}

/// 내 참여 설정 조회.
///
/// GET /api/v1/leaderboard/opt-in
pub async fn get_opt_in(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<OptInResponse>> {
    let services = get_services(&state)?;
    let opt_in = services
        .leaderboard
        .get_opt_in(user_id)
        .await
        .map_err(journal_error)?
        .ok_or_else(|| {
            journal_error(JournalError::NotFound(
                "Leaderboard opt-in not found".to_string(),
            ))
        })?;

    Ok(Json(opt_in.into()))
}

/// 참여/공개 설정 변경.
///
/// PUT /api/v1/leaderboard/opt-in
pub async fn put_opt_in(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptInRequest>,
) -> ApiResult<Json<OptInResponse>> {
    request.validate().map_err(validation_error)?;
    let services = get_services(&state)?;

    let opt_in = services
        .leaderboard
        .opt_in(user_id, request.into())
        .await
        .map_err(journal_error)?;

    Ok(Json(opt_in.into()))
}

/// 참여 해제.
///
/// DELETE /api/v1/leaderboard/opt-in
pub async fn delete_opt_in(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let services = get_services(&state)?;
    let changed = services
        .leaderboard
        .opt_out(user_id)
        .await
        .map_err(journal_error)?;

    if !changed {
        return Err(journal_error(JournalError::NotFound(
            "Leaderboard opt-in not found".to_string(),
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 리더보드 라우터 생성.
pub fn leaderboard_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_leaderboard)).route(
        "/opt-in",
        get(get_opt_in).put(put_opt_in).delete(delete_opt_in),
    )
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    async fn join(app: &TestApp, user_id: Uuid, name: &str, show_pnl: bool) {
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/v1/leaderboard/opt-in",
                Some(user_id),
                Some(json!({ "display_name": name, "show_pnl": show_pnl })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["is_active"], true);
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_and_masks() {
        let app = TestApp::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let account = app.create_account(alice, "1000").await;
        app.create_trade(alice, &account, "200").await;
        join(&app, alice, "alice", false).await;

        let account = app.create_account(bob, "1000").await;
        app.create_trade(bob, &account, "50").await;
        join(&app, bob, "bob", true).await;

        let (status, body) = app
            .send(Method::GET, "/api/v1/leaderboard?sort=pnl", Some(bob), None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "view");
        assert_eq!(body["sort"], "pnl");
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        // 손익을 숨겨도 순위는 실제 손익 기준
        assert_eq!(entries[0]["display_name"], "alice");
        assert_eq!(entries[0]["rank"], 1);
        assert!(entries[0]["total_pnl"].is_null());
        assert_eq!(entries[1]["total_pnl"], "50");
    }

    #[tokio::test]
    async fn test_leaderboard_falls_back_when_view_fails() {
        let app = TestApp::new();
        let alice = Uuid::new_v4();
        let account = app.create_account(alice, "1000").await;
        app.create_trade(alice, &account, "200").await;
        join(&app, alice, "alice", true).await;
        app.store.set_view_failure(true);

        let (status, body) = app
            .send(Method::GET, "/api/v1/leaderboard", Some(alice), None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "opt_ins");
        assert_eq!(body["entries"][0]["display_name"], "alice");
        assert_eq!(body["entries"][0]["trade_count"], 0);
    }

    #[tokio::test]
    async fn test_invalid_sort_is_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::GET,
                "/api/v1/leaderboard?sort=luck",
                Some(Uuid::new_v4()),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_opt_in_lifecycle() {
        let app = TestApp::new();
        let user_id = Uuid::new_v4();
        let uri = "/api/v1/leaderboard/opt-in";

        let (status, _) = app.send(Method::GET, uri, Some(user_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        join(&app, user_id, "carol", true).await;
        let (status, body) = app.send(Method::GET, uri, Some(user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display_name"], "carol");
        assert_eq!(body["show_win_rate"], true);

        let (status, _) = app.send(Method::DELETE, uri, Some(user_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send(Method::DELETE, uri, Some(user_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app
            .send(Method::GET, "/api/v1/leaderboard", Some(user_id), None)
            .await;
        assert_eq!(body["entries"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_opt_in_validation() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/v1/leaderboard/opt-in",
                Some(Uuid::new_v4()),
                Some(json!({ "display_name": "" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
