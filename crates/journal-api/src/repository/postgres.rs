//! Postgres 기반 저장소 구현.
//!
//! 각 저장소의 static 메서드를 저장소 트레이트에 연결합니다.

use async_trait::async_trait;
use journal_core::{
    Account, AccountStore, JournalResult, LeaderboardOptIn, LeaderboardStats, LeaderboardStore,
    NewAccount, NewTrade, OptInPreferences, Trade, TradeStore, TradeUpdate,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountRepository, LeaderboardRepository, TradeRepository};

/// 연결 풀 위에서 동작하는 저장소.
#[derive(Clone)]
pub struct PgJournalStore {
    pool: PgPool,
}

impl PgJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PgJournalStore {
    async fn get_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Option<Account>> {
        Ok(AccountRepository::get_by_id(&self.pool, account_id, user_id).await?)
    }

    async fn list_accounts(&self, user_id: Uuid) -> JournalResult<Vec<Account>> {
        Ok(AccountRepository::list_by_user(&self.pool, user_id).await?)
    }

    async fn create_account(&self, input: NewAccount) -> JournalResult<Account> {
        Ok(AccountRepository::create(&self.pool, input).await?)
    }

    async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<bool> {
        Ok(AccountRepository::delete(&self.pool, account_id, user_id).await?)
    }

    async fn update_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        balance: Decimal,
    ) -> JournalResult<Option<Account>> {
        Ok(AccountRepository::update_balance(&self.pool, account_id, user_id, balance).await?)
    }

    async fn reconcile_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        tolerance: Decimal,
    ) -> JournalResult<Option<Decimal>> {
        Ok(
            AccountRepository::reconcile_balance(&self.pool, account_id, user_id, tolerance)
                .await?,
        )
    }
}

#[async_trait]
impl TradeStore for PgJournalStore {
    async fn get_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>> {
        Ok(TradeRepository::get_by_id(&self.pool, trade_id, user_id).await?)
    }

    async fn list_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Vec<Trade>> {
        Ok(TradeRepository::list_by_account(&self.pool, account_id, user_id).await?)
    }

    async fn count_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<i64> {
        Ok(TradeRepository::count_by_account(&self.pool, account_id, user_id).await?)
    }

    async fn create_trade(&self, input: NewTrade) -> JournalResult<Trade> {
        Ok(TradeRepository::create(&self.pool, input).await?)
    }

    async fn update_trade(
        &self,
        trade_id: Uuid,
        user_id: Uuid,
        update: TradeUpdate,
    ) -> JournalResult<Option<Trade>> {
        Ok(TradeRepository::update(&self.pool, trade_id, user_id, update).await?)
    }

    async fn delete_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>> {
        Ok(TradeRepository::delete(&self.pool, trade_id, user_id).await?)
    }
}

#[async_trait]
impl LeaderboardStore for PgJournalStore {
    async fn create_leaderboard_view(&self) -> JournalResult<()> {
        Ok(LeaderboardRepository::create_view(&self.pool).await?)
    }

    async fn query_leaderboard_view(&self) -> JournalResult<Vec<LeaderboardStats>> {
        Ok(LeaderboardRepository::query_view(&self.pool).await?)
    }

    async fn list_active_opt_ins(&self) -> JournalResult<Vec<LeaderboardOptIn>> {
        Ok(LeaderboardRepository::list_active_opt_ins(&self.pool).await?)
    }

    async fn get_opt_in(&self, user_id: Uuid) -> JournalResult<Option<LeaderboardOptIn>> {
        Ok(LeaderboardRepository::get_opt_in(&self.pool, user_id).await?)
    }

    async fn upsert_opt_in(
        &self,
        user_id: Uuid,
        preferences: OptInPreferences,
    ) -> JournalResult<LeaderboardOptIn> {
        Ok(LeaderboardRepository::upsert_opt_in(&self.pool, user_id, preferences).await?)
    }

    async fn deactivate_opt_in(&self, user_id: Uuid) -> JournalResult<bool> {
        Ok(LeaderboardRepository::deactivate_opt_in(&self.pool, user_id).await?)
    }
}
