//! 매매일지 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 계좌/거래 관리, 대시보드 지표, 잔고 동기화, 리더보드 엔드포인트를 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use journal_api::routes::create_app;
use journal_api::state::AppState;
use journal_core::{init_logging, AppConfig, LogConfig};

/// AppState 초기화.
///
/// DB 연결에 실패해도 서버는 시작하며, 데이터 엔드포인트는 503을 반환합니다.
async fn create_app_state(config: AppConfig) -> AppState {
    let database_url = config.database.resolve_url();
    let max_connections = config.database.max_connections;
    let acquire_timeout = Duration::from_secs(config.database.acquire_timeout_secs);
    let run_migrations = config.database.run_migrations;

    let mut state = AppState::new(config);

    let Some(database_url) = database_url else {
        warn!("DATABASE_URL not set, database features will be disabled");
        return state;
    };

    match PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(&database_url)
        .await
    {
        Ok(pool) => {
            // 연결 테스트
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_err() {
                error!("Failed to verify database connection");
                return state;
            }
            info!("Connected to PostgreSQL successfully");

            if run_migrations {
                match sqlx::migrate!("../../migrations").run(&pool).await {
                    Ok(()) => info!("Database migrations applied"),
                    Err(e) => error!("Failed to run migrations: {}", e),
                }
            }

            state = state.with_db_pool(pool);
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
        }
    }

    state
}

/// CORS 레이어 생성.
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://journal.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            // 개발: 모든 origin 허용
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
}

/// 라우터 생성.
fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    create_app(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (없으면 무시)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from_settings(&config.logging))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting trading journal API server");

    if config.auth.uses_default_secret() {
        warn!("JWT secret not configured, using development default (INSECURE - set JOURNAL__AUTH__JWT_SECRET in production)");
    }

    let addr = config.server.bind_address();
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let state = Arc::new(create_app_state(config).await);

    // 리더보드 뷰 생성 (실패 시 조회 때 다시 시도)
    if let Some(services) = &state.services {
        if let Err(e) = services.leaderboard.view().ensure_leaderboard_view().await {
            warn!("Leaderboard view not ready at startup: {}", e);
        }
    }

    let app = create_router(state, request_timeout);

    info!(%addr, "API server listening");
    info!("Health check at http://{}/health/ready", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
