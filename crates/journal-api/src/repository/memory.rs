//! 메모리 기반 저장소 (테스트용).
//!
//! Postgres 구현과 같은 소유권/연쇄 삭제 규칙을 따르며, 잔고 쓰기 횟수와
//! 뷰 생성 횟수를 기록합니다. 뷰 생성과 잔고 동기화를 실패하도록 설정할 수 있습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use journal_core::{
    Account, AccountStore, JournalError, JournalResult, LeaderboardOptIn, LeaderboardStats,
    LeaderboardStore, NewAccount, NewTrade, OptInPreferences, Trade, TradeOutcome, TradeStore,
    TradeUpdate,
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryData {
    accounts: HashMap<Uuid, Account>,
    trades: HashMap<Uuid, Trade>,
    opt_ins: HashMap<Uuid, LeaderboardOptIn>,
}

/// 메모리 저장소.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    balance_writes: AtomicUsize,
    view_creations: AtomicUsize,
    view_exists: AtomicBool,
    fail_view: AtomicBool,
    fail_balance_sync: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 잔고가 기록된 횟수.
    pub fn balance_writes(&self) -> usize {
        self.balance_writes.load(Ordering::SeqCst)
    }

    /// 뷰 DDL이 성공한 횟수.
    pub fn view_creations(&self) -> usize {
        self.view_creations.load(Ordering::SeqCst)
    }

    /// 뷰 생성/조회를 실패하도록 설정합니다.
    pub fn set_view_failure(&self, fail: bool) {
        self.fail_view.store(fail, Ordering::SeqCst);
    }

    /// 잔고 동기화 쓰기를 실패하도록 설정합니다.
    pub fn set_balance_sync_failure(&self, fail: bool) {
        self.fail_balance_sync.store(fail, Ordering::SeqCst);
    }

    fn owned_trades<'a>(
        data: &'a MemoryData,
        account_id: Uuid,
        user_id: Uuid,
    ) -> impl Iterator<Item = &'a Trade> {
        data.trades
            .values()
            .filter(move |t| t.account_id == account_id && t.user_id == user_id)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Option<Account>> {
        let data = self.data.read().await;
        Ok(data
            .accounts
            .get(&account_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_accounts(&self, user_id: Uuid) -> JournalResult<Vec<Account>> {
        let data = self.data.read().await;
        let mut accounts: Vec<Account> = data
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn create_account(&self, input: NewAccount) -> JournalResult<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name,
            initial_balance: input.initial_balance,
            current_balance: input.initial_balance,
            currency: input.currency,
            leverage: input.leverage,
            max_drawdown: input.max_drawdown,
            created_at: now,
            updated_at: now,
        };

        self.data
            .write()
            .await
            .accounts
            .insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<bool> {
        let mut data = self.data.write().await;
        let owned = data
            .accounts
            .get(&account_id)
            .is_some_and(|a| a.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        data.accounts.remove(&account_id);
        data.trades.retain(|_, t| t.account_id != account_id);
        Ok(true)
    }

    async fn update_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        balance: Decimal,
    ) -> JournalResult<Option<Account>> {
        let mut data = self.data.write().await;
        let Some(account) = data
            .accounts
            .get_mut(&account_id)
            .filter(|a| a.user_id == user_id)
        else {
            return Ok(None);
        };

        account.current_balance = balance;
        account.updated_at = Utc::now();
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(account.clone()))
    }

    async fn reconcile_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        tolerance: Decimal,
    ) -> JournalResult<Option<Decimal>> {
        if self.fail_balance_sync.load(Ordering::SeqCst) {
            return Err(JournalError::Database("balance update rejected".to_string()));
        }

        let mut data = self.data.write().await;
        let total_pnl: Decimal = Self::owned_trades(&data, account_id, user_id)
            .map(Trade::pnl_or_zero)
            .sum();

        let Some(account) = data
            .accounts
            .get_mut(&account_id)
            .filter(|a| a.user_id == user_id)
        else {
            return Ok(None);
        };

        let target = account.initial_balance + total_pnl;
        if (target - account.current_balance).abs() <= tolerance {
            return Ok(None);
        }

        account.current_balance = target;
        account.updated_at = Utc::now();
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(target))
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn get_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>> {
        let data = self.data.read().await;
        Ok(data
            .trades
            .get(&trade_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<Vec<Trade>> {
        let data = self.data.read().await;
        let mut trades: Vec<Trade> = Self::owned_trades(&data, account_id, user_id)
            .cloned()
            .collect();
        trades.sort_by_key(|t| (t.entry_date, t.created_at));
        Ok(trades)
    }

    async fn count_trades(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<i64> {
        let data = self.data.read().await;
        Ok(Self::owned_trades(&data, account_id, user_id).count() as i64)
    }

    async fn create_trade(&self, input: NewTrade) -> JournalResult<Trade> {
        let mut data = self.data.write().await;
        if !data.accounts.contains_key(&input.account_id) {
            return Err(JournalError::account_not_found(input.account_id));
        }

        let now = Utc::now();
        let outcome = input.resolved_outcome();
        let r_multiple = input.resolved_r_multiple();
        let trade = Trade {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            user_id: input.user_id,
            symbol: input.symbol,
            direction: input.direction,
            entry_price: input.entry_price,
            exit_price: input.exit_price,
            stop_loss: input.stop_loss,
            quantity: input.quantity,
            entry_date: input.entry_date,
            exit_date: input.exit_date,
            pnl: input.pnl,
            outcome,
            r_multiple,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        data.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn update_trade(
        &self,
        trade_id: Uuid,
        user_id: Uuid,
        update: TradeUpdate,
    ) -> JournalResult<Option<Trade>> {
        let mut data = self.data.write().await;
        let Some(trade) = data
            .trades
            .get_mut(&trade_id)
            .filter(|t| t.user_id == user_id)
        else {
            return Ok(None);
        };

        update.apply_to(trade);
        Ok(Some(trade.clone()))
    }

    async fn delete_trade(&self, trade_id: Uuid, user_id: Uuid) -> JournalResult<Option<Trade>> {
        let mut data = self.data.write().await;
        let owned = data
            .trades
            .get(&trade_id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Ok(None);
        }
        Ok(data.trades.remove(&trade_id))
    }
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn create_leaderboard_view(&self) -> JournalResult<()> {
        if self.fail_view.load(Ordering::SeqCst) {
            return Err(JournalError::Database(
                "permission denied to create view".to_string(),
            ));
        }
        self.view_exists.store(true, Ordering::SeqCst);
        self.view_creations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_leaderboard_view(&self) -> JournalResult<Vec<LeaderboardStats>> {
        if self.fail_view.load(Ordering::SeqCst) || !self.view_exists.load(Ordering::SeqCst) {
            return Err(JournalError::Database(
                "relation \"leaderboard_stats\" does not exist".to_string(),
            ));
        }

        let data = self.data.read().await;
        let rows = data
            .opt_ins
            .values()
            .filter(|o| o.is_active)
            .map(|o| {
                let trades: Vec<&Trade> =
                    data.trades.values().filter(|t| t.user_id == o.user_id).collect();
                let r_values: Vec<Decimal> = trades.iter().filter_map(|t| t.r_multiple).collect();

                let mut row = LeaderboardStats::from(o.clone());
                row.trade_count = trades.len() as i64;
                row.wins = trades.iter().filter(|t| t.outcome == TradeOutcome::Win).count() as i64;
                row.losses = trades.iter().filter(|t| t.outcome == TradeOutcome::Loss).count() as i64;
                row.total_pnl = trades.iter().map(|t| t.pnl_or_zero()).sum();
                row.avg_r_multiple = (!r_values.is_empty()).then(|| {
                    r_values.iter().copied().sum::<Decimal>() / Decimal::from(r_values.len())
                });
                row
            })
            .collect();
        Ok(rows)
    }

    async fn list_active_opt_ins(&self) -> JournalResult<Vec<LeaderboardOptIn>> {
        let data = self.data.read().await;
        let mut opt_ins: Vec<LeaderboardOptIn> =
            data.opt_ins.values().filter(|o| o.is_active).cloned().collect();
        opt_ins.sort_by_key(|o| o.created_at);
        Ok(opt_ins)
    }

    async fn get_opt_in(&self, user_id: Uuid) -> JournalResult<Option<LeaderboardOptIn>> {
        Ok(self.data.read().await.opt_ins.get(&user_id).cloned())
    }

    async fn upsert_opt_in(
        &self,
        user_id: Uuid,
        preferences: OptInPreferences,
    ) -> JournalResult<LeaderboardOptIn> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let created_at = data
            .opt_ins
            .get(&user_id)
            .map(|o| o.created_at)
            .unwrap_or(now);

        let opt_in = LeaderboardOptIn {
            user_id,
            display_name: preferences.display_name,
            show_win_rate: preferences.show_win_rate,
            show_pnl: preferences.show_pnl,
            show_trade_count: preferences.show_trade_count,
            show_avg_r: preferences.show_avg_r,
            is_active: true,
            created_at,
            updated_at: now,
        };
        data.opt_ins.insert(user_id, opt_in.clone());
        Ok(opt_in)
    }

    async fn deactivate_opt_in(&self, user_id: Uuid) -> JournalResult<bool> {
        let mut data = self.data.write().await;
        match data.opt_ins.get_mut(&user_id) {
            Some(opt_in) if opt_in.is_active => {
                opt_in.is_active = false;
                opt_in.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
