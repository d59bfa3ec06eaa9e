//! 대시보드 지표 집계 서비스.

use std::sync::Arc;

use journal_core::{DashboardMetrics, JournalResult, JournalStore};
use tracing::debug;
use uuid::Uuid;

/// 계좌의 거래 목록을 읽어 대시보드 지표를 계산합니다.
///
/// 소유권 확인은 호출자 책임이며, 여기서는 `(account_id, user_id)`에 해당하는
/// 거래만 읽습니다. 저장하지 않는 순수 조회입니다.
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn JournalStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self { store }
    }

    pub async fn compute_metrics(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> JournalResult<DashboardMetrics> {
        let trades = self.store.list_trades(account_id, user_id).await?;
        let metrics = DashboardMetrics::from_trades(&trades);

        debug!(
            %account_id,
            total_trades = metrics.total_trades,
            total_pnl = %metrics.total_pnl,
            "Computed dashboard metrics"
        );

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use chrono::Utc;
    use journal_core::{AccountStore, NewAccount, NewTrade, TradeDirection, TradeStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn seed(store: &MemoryStore, user_id: Uuid, pnls: &[Option<Decimal>]) -> Uuid {
        let account = store
            .create_account(NewAccount {
                user_id,
                name: "swing".to_string(),
                initial_balance: dec!(1000),
                currency: "USD".to_string(),
                leverage: None,
                max_drawdown: None,
            })
            .await
            .unwrap();

        for pnl in pnls {
            store
                .create_trade(NewTrade {
                    account_id: account.id,
                    user_id,
                    symbol: "AAPL".to_string(),
                    direction: TradeDirection::Long,
                    entry_price: dec!(180),
                    exit_price: None,
                    stop_loss: None,
                    quantity: dec!(10),
                    entry_date: Utc::now(),
                    exit_date: None,
                    pnl: *pnl,
                    outcome: None,
                    notes: None,
                })
                .await
                .unwrap();
        }
        account.id
    }

    #[tokio::test]
    async fn test_compute_metrics_for_owner() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        let account_id = seed(&store, user_id, &[Some(dec!(40)), Some(dec!(-10)), None]).await;

        let aggregator = MetricsAggregator::new(store);
        let metrics = aggregator.compute_metrics(account_id, user_id).await.unwrap();

        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.pending_trades, 1);
        assert_eq!(metrics.total_pnl, dec!(30));
        assert_eq!(metrics.win_rate, dec!(50));
    }

    #[tokio::test]
    async fn test_other_users_trades_are_invisible() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let account_id = seed(&store, owner, &[Some(dec!(40))]).await;

        let aggregator = MetricsAggregator::new(store);
        let metrics = aggregator
            .compute_metrics(account_id, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.total_pnl, Decimal::ZERO);
    }
}
