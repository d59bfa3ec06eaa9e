//! 리더보드 뷰 관리 및 조회 서비스.
//!
//! `leaderboard_stats` 뷰는 프로세스 시작 시 한 번 생성하고, 성공 여부를 플래그로
//! 보관합니다. 생성에 실패하면 플래그를 세우지 않으므로 다음 조회에서 다시 시도합니다.
//! 뷰를 사용할 수 없을 때 조회는 참여 설정 테이블만으로 결과를 만듭니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use journal_core::{
    rank_entries, JournalResult, JournalStore, Leaderboard, LeaderboardConfig, LeaderboardOptIn,
    LeaderboardSort, LeaderboardSource, LeaderboardStats, OptInPreferences,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 리더보드 뷰 생성기.
#[derive(Clone)]
pub struct LeaderboardViewBuilder {
    store: Arc<dyn JournalStore>,
    ready: Arc<AtomicBool>,
}

impl LeaderboardViewBuilder {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self {
            store,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 뷰가 준비되었는지 여부.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// 뷰가 없으면 생성합니다.
    ///
    /// 한 번 성공하면 이후 호출은 DDL을 실행하지 않습니다.
    pub async fn ensure_leaderboard_view(&self) -> JournalResult<()> {
        if self.is_ready() {
            return Ok(());
        }

        match self.store.create_leaderboard_view().await {
            Ok(()) => {
                self.ready.store(true, Ordering::Release);
                info!("Leaderboard view ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to create leaderboard view");
                Err(e)
            }
        }
    }

    /// 뷰가 사라진 경우 다음 조회에서 다시 생성하도록 플래그를 내립니다.
    fn invalidate(&self) {
        self.ready.store(false, Ordering::Release);
    }

    async fn read_view(&self) -> JournalResult<Vec<LeaderboardStats>> {
        self.ensure_leaderboard_view().await?;
        self.store.query_leaderboard_view().await.inspect_err(|_| {
            self.invalidate();
        })
    }
}

/// 리더보드 조회 및 참여 설정 서비스.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn JournalStore>,
    view: LeaderboardViewBuilder,
    config: LeaderboardConfig,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn JournalStore>, config: LeaderboardConfig) -> Self {
        Self {
            view: LeaderboardViewBuilder::new(store.clone()),
            store,
            config,
        }
    }

    pub fn view(&self) -> &LeaderboardViewBuilder {
        &self.view
    }

    /// 리더보드를 조회합니다.
    ///
    /// 뷰 생성/조회가 실패하면 참여 설정 테이블로 대체하며, 그것마저 실패하면
    /// 빈 목록을 반환합니다. 이 조회는 실패하지 않습니다.
    pub async fn get_leaderboard(&self, sort: LeaderboardSort, limit: Option<i64>) -> Leaderboard {
        let limit = self.config.clamp_limit(limit) as usize;

        let (source, rows) = match self.view.read_view().await {
            Ok(rows) => (LeaderboardSource::View, rows),
            Err(e) => {
                warn!(error = %e, "Leaderboard view unavailable, falling back to opt-ins");
                let rows = match self.store.list_active_opt_ins().await {
                    Ok(opt_ins) => opt_ins.into_iter().map(LeaderboardStats::from).collect(),
                    Err(e) => {
                        error!(error = %e, "Failed to read leaderboard opt-ins");
                        Vec::new()
                    }
                };
                (LeaderboardSource::OptIns, rows)
            }
        };

        debug!(?source, rows = rows.len(), limit, "Leaderboard rows loaded");

        Leaderboard {
            source,
            sort,
            entries: rank_entries(rows, sort, limit),
        }
    }

    pub async fn get_opt_in(&self, user_id: Uuid) -> JournalResult<Option<LeaderboardOptIn>> {
        self.store.get_opt_in(user_id).await
    }

    /// 리더보드에 참여하거나 공개 설정을 변경합니다.
    pub async fn opt_in(
        &self,
        user_id: Uuid,
        preferences: OptInPreferences,
    ) -> JournalResult<LeaderboardOptIn> {
        let opt_in = self.store.upsert_opt_in(user_id, preferences).await?;
        info!(%user_id, display_name = %opt_in.display_name, "Leaderboard opt-in saved");
        Ok(opt_in)
    }

    /// 리더보드 참여를 해제합니다.
    pub async fn opt_out(&self, user_id: Uuid) -> JournalResult<bool> {
        let changed = self.store.deactivate_opt_in(user_id).await?;
        if changed {
            info!(%user_id, "Leaderboard opt-out");
        }
        Ok(changed)
    }
}
