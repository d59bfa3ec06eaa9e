//! # Journal Core
//!
//! 매매일지 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 계좌 및 거래 기록
//! - 대시보드 지표 집계 (승률, Profit Factor, 연속 승패, 요일별 통계)
//! - 리더보드 참여 설정 및 순위 항목
//! - 저장소 추상화 (계좌/거래/리더보드)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
