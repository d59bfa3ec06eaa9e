//! 설정 관리.
//!
//! 설정 파일(선택)과 `JOURNAL__` 접두사 환경 변수에서 애플리케이션 설정을 로드합니다.
//!
//! ```text
//! JOURNAL__SERVER__PORT=8080
//! JOURNAL__DATABASE__URL=postgres://localhost/journal
//! JOURNAL__BALANCE__TOLERANCE=0.01
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::JournalResult;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 잔고 동기화 설정
    #[serde(default)]
    pub balance: BalanceConfig,
    /// 리더보드 설정
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 연결 URL (없으면 `DATABASE_URL` 환경 변수 사용)
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
    /// 시작 시 마이그레이션 실행 여부
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// 설정값 또는 `DATABASE_URL` 환경 변수에서 연결 URL을 결정합니다.
    pub fn resolve_url(&self) -> Option<String> {
        self.url
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "journal_api=info,journal_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 인증 설정.
///
/// 토큰은 외부 인증 공급자가 발급하며, 이 서비스는 서명 검증만 수행합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 서명 검증 키
    pub jwt_secret: String,
}

/// 개발용 기본 JWT 서명 키.
const DEFAULT_JWT_SECRET: &str = "development-secret-key-change-in-production";

impl AuthConfig {
    /// 개발용 기본 키를 그대로 쓰는지 여부.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        }
    }
}

/// 잔고 동기화 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BalanceConfig {
    /// 허용 오차 (이 값 이하의 차이는 기록하지 않음)
    pub tolerance: Decimal,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            tolerance: dec!(0.01),
        }
    }
}

/// 리더보드 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeaderboardConfig {
    /// 기본 조회 개수
    pub default_limit: i64,
    /// 최대 조회 개수
    pub max_limit: i64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

impl LeaderboardConfig {
    /// 요청 개수를 `[1, max_limit]` 범위로 보정합니다.
    pub fn clamp_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> JournalResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("JOURNAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> JournalResult<Self> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.balance.tolerance, dec!(0.01));
        assert_eq!(config.leaderboard.default_limit, 50);
        assert!(config.database.run_migrations);
    }

    #[test]
    fn test_clamp_limit() {
        let lb = LeaderboardConfig::default();
        assert_eq!(lb.clamp_limit(None), 50);
        assert_eq!(lb.clamp_limit(Some(0)), 1);
        assert_eq!(lb.clamp_limit(Some(-5)), 1);
        assert_eq!(lb.clamp_limit(Some(500)), 100);
        assert_eq!(lb.clamp_limit(Some(20)), 20);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.leaderboard.max_limit, 100);
        assert!(config.auth.uses_default_secret());
    }

    #[test]
    fn test_custom_secret_is_not_default() {
        let auth = AuthConfig {
            jwt_secret: "rotated-production-secret".to_string(),
        };
        assert!(!auth.uses_default_secret());
        assert!(AuthConfig::default().uses_default_secret());
    }
}
