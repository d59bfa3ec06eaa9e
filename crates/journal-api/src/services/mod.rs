//! 서비스 계층.
//!
//! - [`MetricsAggregator`]: 대시보드 지표 집계
//! - [`BalanceSynchronizer`]: 계좌 잔고 동기화
//! - [`LeaderboardService`]: 리더보드 뷰 관리 및 조회

pub mod balance_sync;
pub mod leaderboard;
pub mod metrics;

pub use balance_sync::BalanceSynchronizer;
pub use leaderboard::{LeaderboardService, LeaderboardViewBuilder};
pub use metrics::MetricsAggregator;

use std::sync::Arc;

use journal_core::{AppConfig, JournalStore};

/// 핸들러가 사용하는 서비스 묶음.
#[derive(Clone)]
pub struct JournalServices {
    pub store: Arc<dyn JournalStore>,
    pub metrics: MetricsAggregator,
    pub balance: BalanceSynchronizer,
    pub leaderboard: LeaderboardService,
}

impl JournalServices {
    pub fn new(store: Arc<dyn JournalStore>, config: &AppConfig) -> Self {
        let metrics = MetricsAggregator::new(store.clone());
        let balance =
            BalanceSynchronizer::new(store.clone(), metrics.clone(), config.balance.tolerance);
        let leaderboard = LeaderboardService::new(store.clone(), config.leaderboard.clone());

        Self {
            store,
            metrics,
            balance,
            leaderboard,
        }
    }
}
