//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use std::sync::Arc;

use journal_core::{AppConfig, JournalStore};

use crate::auth::JwtConfig;
use crate::repository::PgJournalStore;
use crate::services::JournalServices;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀 (헬스 체크용)
    pub db_pool: Option<sqlx::PgPool>,

    /// 저장소 위에 구성된 서비스 (저장소 미설정 시 None)
    pub services: Option<JournalServices>,

    /// 애플리케이션 설정
    pub config: Arc<AppConfig>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(config: AppConfig) -> Self {
        Self {
            db_pool: None,
            services: None,
            config: Arc::new(config),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// DB 연결 풀과 이를 사용하는 저장소를 설정합니다.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgJournalStore::new(pool.clone()));
        self.db_pool = Some(pool);
        self.with_store(store)
    }

    /// 저장소를 설정하고 서비스를 구성합니다.
    pub fn with_store(mut self, store: Arc<dyn JournalStore>) -> Self {
        self.services = Some(JournalServices::new(store, &self.config));
        self
    }

    /// JWT 검증 설정.
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.config.auth.jwt_secret.clone(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// DB 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
            None => false,
        }
    }
}

/// 테스트용 AppState 생성 (메모리 저장소 사용).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> (AppState, Arc<crate::repository::MemoryStore>) {
    let store = Arc::new(crate::repository::MemoryStore::new());
    let state = AppState::new(AppConfig::default()).with_store(store.clone());
    (state, store)
}
