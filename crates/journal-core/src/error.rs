//! 매매일지 서비스의 에러 타입.
//!
//! 모든 저장소/서비스 작업은 `JournalResult<T>`를 반환합니다.
//! 던지는 방식과 `{ success, error }` 방식을 섞지 않고 하나의 판별형 결과로 통일합니다.

use thiserror::Error;

/// 매매일지 에러.
#[derive(Debug, Error)]
pub enum JournalError {
    /// 인증 정보 없음
    #[error("인증되지 않았습니다")]
    NotAuthenticated,

    /// 찾을 수 없음 (소유권 불일치 포함)
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 접근 권한 없음
    #[error("권한 없음: {0}")]
    Forbidden(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 매매일지 작업을 위한 Result 타입.
pub type JournalResult<T> = Result<T, JournalError>;

impl JournalError {
    /// 계좌를 찾을 수 없음 에러를 생성합니다.
    pub fn account_not_found(account_id: impl std::fmt::Display) -> Self {
        JournalError::NotFound(format!("Account not found: {}", account_id))
    }

    /// 거래를 찾을 수 없음 에러를 생성합니다.
    pub fn trade_not_found(trade_id: impl std::fmt::Display) -> Self {
        JournalError::NotFound(format!("Trade not found: {}", trade_id))
    }

    /// 하위 데이터 접근 계층에서 발생한 에러인지 확인합니다.
    pub fn is_data_access(&self) -> bool {
        matches!(self, JournalError::Database(_))
    }

    /// 클라이언트 요청 문제로 발생한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JournalError::NotAuthenticated
                | JournalError::NotFound(_)
                | JournalError::Forbidden(_)
                | JournalError::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for JournalError {
    fn from(err: config::ConfigError) -> Self {
        JournalError::Config(err.to_string())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => JournalError::NotFound("row not found".to_string()),
            other => JournalError::Database(other.to_string()),
        }
    }
}
