//! 매매 계좌.
//!
//! 계좌는 초기 잔고와 현재 잔고를 가지며, 현재 잔고는 거래 손익 합계로부터
//! 주기적으로 재계산되는 파생 값입니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 매매 계좌.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Account {
    pub id: Uuid,
    /// 소유 사용자 ID
    pub user_id: Uuid,
    pub name: String,
    /// 초기 잔고
    pub initial_balance: Decimal,
    /// 현재 잔고 (initial_balance + 총 손익, 동기화로 갱신)
    pub current_balance: Decimal,
    /// 통화 코드 (예: "USD")
    pub currency: String,
    pub leverage: Option<i32>,
    /// 허용 최대 낙폭 (%)
    pub max_drawdown: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// 총 손익 기준으로 기대되는 잔고.
    pub fn expected_balance(&self, total_pnl: Decimal) -> Decimal {
        self.initial_balance + total_pnl
    }

    /// 현재 잔고와 기대 잔고의 차이가 허용 오차를 넘는지 확인합니다.
    pub fn has_drifted(&self, total_pnl: Decimal, tolerance: Decimal) -> bool {
        (self.expected_balance(total_pnl) - self.current_balance).abs() > tolerance
    }

    /// 초기 잔고 대비 수익률 (%).
    pub fn return_pct(&self) -> Decimal {
        if self.initial_balance.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_balance - self.initial_balance) / self.initial_balance * Decimal::from(100)
    }
}

/// 계좌 생성 입력.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: Uuid,
    pub name: String,
    pub initial_balance: Decimal,
    pub currency: String,
    pub leverage: Option<i32>,
    pub max_drawdown: Option<Decimal>,
}

/// 잔고 동기화 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// 허용 오차 이내라 기록하지 않음
    Unchanged { balance: Decimal },
    /// 새 잔고 기록
    Updated { previous: Decimal, current: Decimal },
}

impl SyncOutcome {
    /// 쓰기가 발생했는지 여부.
    pub fn was_written(&self) -> bool {
        matches!(self, SyncOutcome::Updated { .. })
    }

    /// 동기화 후 잔고.
    pub fn balance(&self) -> Decimal {
        match self {
            SyncOutcome::Unchanged { balance } => *balance,
            SyncOutcome::Updated { current, .. } => *current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(initial: Decimal, current: Decimal) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "main".to_string(),
            initial_balance: initial,
            current_balance: current,
            currency: "USD".to_string(),
            leverage: None,
            max_drawdown: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_drift_respects_tolerance() {
        let acc = account(dec!(1000), dec!(1050));

        assert!(!acc.has_drifted(dec!(50), dec!(0.01)));
        assert!(!acc.has_drifted(dec!(50.01), dec!(0.01)));
        assert!(acc.has_drifted(dec!(50.02), dec!(0.01)));
        assert!(acc.has_drifted(dec!(30), dec!(0.01)));
    }

    #[test]
    fn test_return_pct() {
        assert_eq!(account(dec!(1000), dec!(1100)).return_pct(), dec!(10));
        assert_eq!(account(dec!(0), dec!(10)).return_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_sync_outcome_balance() {
        let unchanged = SyncOutcome::Unchanged { balance: dec!(1000) };
        assert!(!unchanged.was_written());
        assert_eq!(unchanged.balance(), dec!(1000));

        let updated = SyncOutcome::Updated {
            previous: dec!(1000),
            current: dec!(1050),
        };
        assert!(updated.was_written());
        assert_eq!(updated.balance(), dec!(1050));
    }
}
