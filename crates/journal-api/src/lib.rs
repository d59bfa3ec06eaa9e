//! 매매일지 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (계좌, 거래, 대시보드, 리더보드)
//! - JWT 인증 추출기
//! - 잔고 동기화 및 리더보드 뷰 관리 서비스
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증
//! - [`services`]: 지표 집계, 잔고 동기화, 리더보드
//! - [`repository`]: PostgreSQL 저장소

pub mod auth;
pub mod error;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AuthUser, Claims};
pub use error::{ApiErrorResponse, ApiResult};
pub use routes::*;
pub use services::{BalanceSynchronizer, JournalServices, LeaderboardService, MetricsAggregator};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
