//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 저장소와 서비스는 `JournalError`를 반환하고, 핸들러 경계에서
//! [`journal_error`]로 HTTP 상태 코드와 응답 본문으로 변환합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use journal_core::JournalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "찾을 수 없음: Account not found: 7f0c...",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "INVALID_INPUT", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

// ==================== Result Type Alias ====================

/// API 핸들러 에러 타입.
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

// ==================== JournalError 변환 ====================

/// 도메인 에러에 대응하는 HTTP 상태 코드.
pub fn status_for(err: &JournalError) -> StatusCode {
    match err {
        JournalError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        JournalError::Forbidden(_) => StatusCode::FORBIDDEN,
        JournalError::NotFound(_) => StatusCode::NOT_FOUND,
        JournalError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        JournalError::Database(_) | JournalError::Config(_) | JournalError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 도메인 에러에 대응하는 에러 코드.
pub fn code_for(err: &JournalError) -> &'static str {
    match err {
        JournalError::NotAuthenticated => "NOT_AUTHENTICATED",
        JournalError::Forbidden(_) => "FORBIDDEN",
        JournalError::NotFound(_) => "NOT_FOUND",
        JournalError::InvalidInput(_) => "INVALID_INPUT",
        JournalError::Database(_) => "DB_ERROR",
        JournalError::Config(_) => "CONFIG_ERROR",
        JournalError::Internal(_) => "INTERNAL_ERROR",
    }
}

/// `JournalError`를 API 에러로 변환합니다.
///
/// 서버 측 에러는 이 지점에서 로그를 남깁니다.
pub fn journal_error(err: JournalError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(ApiErrorResponse::new(code_for(&err), err.to_string())))
}

/// 입력 검증 실패를 API 에러로 변환합니다.
pub fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("VALIDATION_ERROR", message)),
    )
}
