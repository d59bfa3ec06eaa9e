//! 저장소 추상화.
//!
//! 서비스 계층은 이 트레이트를 통해 데이터에 접근합니다. 운영 환경에서는
//! Postgres 구현을, 테스트에서는 메모리 구현을 사용합니다.
//!
//! 모든 조회는 `(id, user_id)` 쌍으로 소유권을 함께 확인하며,
//! 다른 사용자의 레코드는 존재하지 않는 것으로 취급합니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::account::{Account, NewAccount};
use super::leaderboard::{LeaderboardOptIn, LeaderboardStats, OptInPreferences};
use super::trade::{NewTrade, Trade, TradeUpdate};
use crate::error::JournalResult;

/// 계좌 저장소.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Option<Account>>;

    async fn list_accounts(&self, user_id: Uuid) -> JournalResult<Vec<Account>>;

    /// 계좌를 생성합니다. 현재 잔고는 초기 잔고로 시작합니다.
    async fn create_account(&self, input: NewAccount) -> JournalResult<Account>;

    /// 계좌와 소속 거래를 삭제합니다. 삭제 여부를 반환합니다.
    async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<bool>;

    /// 현재 잔고를 직접 기록합니다.
    async fn update_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        balance: Decimal,
    ) -> JournalResult<Option<Account>>;

    /// 현재 잔고를 `initial_balance + Σ pnl`로 원자적으로 맞춥니다.
    ///
    /// 차이가 `tolerance` 이하이면 기록하지 않고 `None`을 반환합니다.
    /// 기록했으면 새 잔고를 반환합니다.
    async fn reconcile_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        tolerance: Decimal,
    ) -> JournalResult<Option<Decimal>>;
}

/// 거래 저장소.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn get_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>>;

    /// 계좌의 거래를 진입 시각 순으로 조회합니다.
    async fn list_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Vec<Trade>>;

    async fn count_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<i64>;

    async fn create_trade(&self, input: NewTrade) -> JournalResult<Trade>;

    async fn update_trade(
        &self,
        trade_id: Uuid,
        user_id: Uuid,
        update: TradeUpdate,
    ) -> JournalResult<Option<Trade>>;

    /// 거래를 삭제하고 삭제된 거래를 반환합니다.
    async fn delete_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>>;
}

/// 리더보드 저장소.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// `leaderboard_stats` 뷰를 생성하거나 교체합니다.
    async fn create_leaderboard_view(&self) -> JournalResult<()>;

    /// 뷰에서 참여 중인 사용자의 집계를 조회합니다.
    async fn query_leaderboard_view(&self) -> JournalResult<Vec<LeaderboardStats>>;

    /// 참여 중인 설정만 조회합니다.
    async fn list_active_opt_ins(&self) -> JournalResult<Vec<LeaderboardOptIn>>;

    async fn get_opt_in(&self, user_id: Uuid) -> JournalResult<Option<LeaderboardOptIn>>;

    /// 참여 설정을 저장합니다. 이미 있으면 갱신하고 다시 활성화합니다.
    async fn upsert_opt_in(
        &self,
        user_id: Uuid,
        preferences: OptInPreferences,
    ) -> JournalResult<LeaderboardOptIn>;

    /// 참여를 해제합니다. 변경 여부를 반환합니다.
    async fn deactivate_opt_in(&self, user_id: Uuid) -> JournalResult<bool>;
}

/// 서비스가 사용하는 전체 저장소.
pub trait JournalStore: AccountStore + TradeStore + LeaderboardStore {}

impl<T> JournalStore for T where T: AccountStore + TradeStore + LeaderboardStore {}
