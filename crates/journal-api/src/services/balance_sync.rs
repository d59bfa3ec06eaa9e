//! 계좌 잔고 동기화 서비스.
//!
//! 계좌의 현재 잔고를 `initial_balance + 총 손익`으로 맞춥니다.
//!
//! 1. 계좌와 지표를 동시에 조회
//! 2. 차이가 허용 오차 이하이면 기록하지 않음
//! 3. 기록은 저장소의 원자적 갱신 한 번으로 수행
//!
//! 거래 생성/수정/삭제 후에는 [`BalanceSynchronizer::sync_balance_best_effort`]를
//! 호출하며, 동기화 실패가 거래 작업을 실패시키지 않습니다.

use std::sync::Arc;

use journal_core::{account_span, JournalError, JournalResult, JournalStore, SyncOutcome};
use rust_decimal::Decimal;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::MetricsAggregator;

/// 잔고 동기화기.
#[derive(Clone)]
pub struct BalanceSynchronizer {
    store: Arc<dyn JournalStore>,
    metrics: MetricsAggregator,
    tolerance: Decimal,
}

impl BalanceSynchronizer {
    pub fn new(store: Arc<dyn JournalStore>, metrics: MetricsAggregator, tolerance: Decimal) -> Self {
        Self {
            store,
            metrics,
            tolerance,
        }
    }

    /// 허용 오차.
    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// 잔고를 동기화합니다.
    ///
    /// 계좌가 없거나 다른 사용자 소유이면 `NotFound`.
    pub async fn sync_balance(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<SyncOutcome> {
        self.reconcile(account_id, user_id)
            .instrument(account_span!("sync_balance", account_id, user_id))
            .await
    }

    /// 잔고를 동기화하고 실패는 로그만 남깁니다.
    pub async fn sync_balance_best_effort(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Option<SyncOutcome> {
        match self.sync_balance(account_id, user_id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(%account_id, error = %e, "Balance sync failed");
                None
            }
        }
    }

    async fn reconcile(&self, account_id: Uuid, user_id: Uuid) -> JournalResult<SyncOutcome> {
        let (account, metrics) = tokio::try_join!(
            self.store.get_account(account_id, user_id),
            self.metrics.compute_metrics(account_id, user_id),
        )?;

        let account = account.ok_or_else(|| JournalError::account_not_found(account_id))?;
        let expected = account.expected_balance(metrics.total_pnl);

        if !account.has_drifted(metrics.total_pnl, self.tolerance) {
            debug!(balance = %account.current_balance, "Balance within tolerance");
            return Ok(SyncOutcome::Unchanged {
                balance: account.current_balance,
            });
        }

        match self
            .store
            .reconcile_balance(account_id, user_id, self.tolerance)
            .await?
        {
            Some(current) => {
                info!(
                    previous = %account.current_balance,
                    current = %current,
                    "Balance updated"
                );
                Ok(SyncOutcome::Updated {
                    previous: account.current_balance,
                    current,
                })
            }
            // 동시에 실행된 다른 동기화가 먼저 기록함
            None => {
                debug!(expected = %expected, "Balance already reconciled");
                Ok(SyncOutcome::Unchanged { balance: expected })
            }
        }
    }
}
