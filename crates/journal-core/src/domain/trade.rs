//! 거래 기록.
//!
//! 이 모듈은 매매일지에 기록되는 개별 거래 타입을 정의합니다:
//! - `Trade` - 계좌에 기록된 거래
//! - `TradeOutcome` - 거래 결과 (승/패/본전/진행중)
//! - `NewTrade`, `TradeUpdate` - 생성/수정 입력

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JournalError;

/// 거래 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
    /// 미청산 (손익 미확정)
    Pending,
}

impl TradeOutcome {
    /// 손익으로부터 결과를 추론합니다.
    pub fn from_pnl(pnl: Option<Decimal>) -> Self {
        match pnl {
            Some(p) if p > Decimal::ZERO => TradeOutcome::Win,
            Some(p) if p < Decimal::ZERO => TradeOutcome::Loss,
            Some(_) => TradeOutcome::Breakeven,
            None => TradeOutcome::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeOutcome::Win => "win",
            TradeOutcome::Loss => "loss",
            TradeOutcome::Breakeven => "breakeven",
            TradeOutcome::Pending => "pending",
        }
    }

    /// 청산 완료 여부.
    pub fn is_closed(&self) -> bool {
        !matches!(self, TradeOutcome::Pending)
    }
}

impl std::fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeOutcome {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" => Ok(TradeOutcome::Win),
            "loss" => Ok(TradeOutcome::Loss),
            "breakeven" | "break_even" | "be" => Ok(TradeOutcome::Breakeven),
            "pending" | "open" => Ok(TradeOutcome::Pending),
            other => Err(JournalError::InvalidInput(format!(
                "unknown trade outcome: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for TradeOutcome {
    type Error = JournalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Long => "long",
            TradeDirection::Short => "short",
        }
    }
}

impl std::str::FromStr for TradeDirection {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(TradeDirection::Long),
            "short" | "sell" => Ok(TradeDirection::Short),
            other => Err(JournalError::InvalidInput(format!(
                "unknown trade direction: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for TradeDirection {
    type Error = JournalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 계좌에 기록된 거래.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Trade {
    pub id: Uuid,
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(try_from = "String"))]
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub quantity: Decimal,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    /// 실현 손익 (미청산이면 None)
    pub pnl: Option<Decimal>,
    #[cfg_attr(feature = "sqlx-support", sqlx(try_from = "String"))]
    pub outcome: TradeOutcome,
    /// 손익 / 초기 위험 (R 배수)
    pub r_multiple: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// 손익 (미청산이면 0).
    pub fn pnl_or_zero(&self) -> Decimal {
        self.pnl.unwrap_or(Decimal::ZERO)
    }
}

/// 저장 가능한 R 배수의 절대값 상한 (`NUMERIC(12, 4)`).
pub const R_MULTIPLE_LIMIT: Decimal = dec!(100000000);

/// 초기 위험 대비 손익 배수를 계산합니다.
///
/// 손절가가 없거나 위험 금액이 0이면 None.
/// 계산이 넘치거나 결과가 [`R_MULTIPLE_LIMIT`] 이상이어도 None.
pub fn r_multiple(
    entry_price: Decimal,
    stop_loss: Option<Decimal>,
    quantity: Decimal,
    pnl: Option<Decimal>,
) -> Option<Decimal> {
    let stop = stop_loss?;
    let pnl = pnl?;
    let risk = entry_price
        .checked_sub(stop)?
        .abs()
        .checked_mul(quantity.abs())?;
    if risk.is_zero() {
        return None;
    }
    let r = pnl.checked_div(risk)?.round_dp(4);
    (r.abs() < R_MULTIPLE_LIMIT).then_some(r)
}

/// 거래 생성 입력.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub quantity: Decimal,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    /// 지정하지 않으면 손익으로부터 추론
    pub outcome: Option<TradeOutcome>,
    pub notes: Option<String>,
}

impl NewTrade {
    /// 최종 결과 (명시값 우선, 없으면 손익으로 추론).
    pub fn resolved_outcome(&self) -> TradeOutcome {
        self.outcome.unwrap_or_else(|| TradeOutcome::from_pnl(self.pnl))
    }

    /// R 배수.
    pub fn resolved_r_multiple(&self) -> Option<Decimal> {
        r_multiple(self.entry_price, self.stop_loss, self.quantity, self.pnl)
    }
}

/// 거래 수정 입력 (None 필드는 유지).
#[derive(Debug, Clone, Default)]
pub struct TradeUpdate {
    pub symbol: Option<String>,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub exit_date: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    pub outcome: Option<TradeOutcome>,
    pub notes: Option<String>,
}

impl TradeUpdate {
    /// 기존 거래에 수정 사항을 적용합니다.
    ///
    /// 손익이 바뀌었는데 결과를 지정하지 않았으면 결과와 R 배수를 다시 계산합니다.
    pub fn apply_to(self, trade: &mut Trade) {
        let pnl_changed = self.pnl.is_some();

        if let Some(symbol) = self.symbol {
            trade.symbol = symbol;
        }
        if self.exit_price.is_some() {
            trade.exit_price = self.exit_price;
        }
        if self.stop_loss.is_some() {
            trade.stop_loss = self.stop_loss;
        }
        if self.exit_date.is_some() {
            trade.exit_date = self.exit_date;
        }
        if self.pnl.is_some() {
            trade.pnl = self.pnl;
        }
        if self.notes.is_some() {
            trade.notes = self.notes;
        }

        match self.outcome {
            Some(outcome) => trade.outcome = outcome,
            None if pnl_changed => trade.outcome = TradeOutcome::from_pnl(trade.pnl),
            None => {}
        }

        trade.r_multiple = r_multiple(trade.entry_price, trade.stop_loss, trade.quantity, trade.pnl);
        trade.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_from_pnl() {
        assert_eq!(TradeOutcome::from_pnl(Some(dec!(5))), TradeOutcome::Win);
        assert_eq!(TradeOutcome::from_pnl(Some(dec!(-0.5))), TradeOutcome::Loss);
        assert_eq!(TradeOutcome::from_pnl(Some(dec!(0))), TradeOutcome::Breakeven);
        assert_eq!(TradeOutcome::from_pnl(None), TradeOutcome::Pending);
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("WIN".parse::<TradeOutcome>().unwrap(), TradeOutcome::Win);
        assert_eq!("break_even".parse::<TradeOutcome>().unwrap(), TradeOutcome::Breakeven);
        assert!("maybe".parse::<TradeOutcome>().is_err());
        assert_eq!(
            TradeOutcome::try_from("pending".to_string()).unwrap(),
            TradeOutcome::Pending
        );
    }

    #[test]
    fn test_r_multiple() {
        // 위험: |100 - 95| * 2 = 10, 손익 25 → 2.5R
        assert_eq!(
            r_multiple(dec!(100), Some(dec!(95)), dec!(2), Some(dec!(25))),
            Some(dec!(2.5))
        );
        // 손절가 없음
        assert_eq!(r_multiple(dec!(100), None, dec!(2), Some(dec!(25))), None);
        // 위험 0
        assert_eq!(r_multiple(dec!(100), Some(dec!(100)), dec!(2), Some(dec!(25))), None);
    }

    #[test]
    fn test_r_multiple_out_of_range() {
        // 위험이 거의 0이면 나눗셈이 넘침
        let tiny = Decimal::from_str_exact("0.0000000000000000000000000001").unwrap();
        assert_eq!(r_multiple(dec!(2), Some(dec!(1)), tiny, Some(dec!(100))), None);

        // 위험 계산 자체가 넘침
        assert_eq!(
            r_multiple(Decimal::MAX, Some(dec!(1)), Decimal::MAX, Some(dec!(100))),
            None
        );

        // 저장 범위 경계
        let risk = dec!(0.000001);
        assert_eq!(r_multiple(dec!(2), Some(dec!(1)), risk, Some(dec!(100))), None);
        assert_eq!(
            r_multiple(dec!(2), Some(dec!(1)), risk, Some(dec!(99.99))),
            Some(dec!(99990000))
        );
    }

    #[test]
    fn test_update_recomputes_outcome() {
        let now = Utc::now();
        let mut trade = Trade {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: "ES".to_string(),
            direction: TradeDirection::Long,
            entry_price: dec!(100),
            exit_price: None,
            stop_loss: Some(dec!(90)),
            quantity: dec!(1),
            entry_date: now,
            exit_date: None,
            pnl: None,
            outcome: TradeOutcome::Pending,
            r_multiple: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        TradeUpdate {
            exit_price: Some(dec!(80)),
            pnl: Some(dec!(-20)),
            ..Default::default()
        }
        .apply_to(&mut trade);

        assert_eq!(trade.outcome, TradeOutcome::Loss);
        assert_eq!(trade.r_multiple, Some(dec!(-2)));
        assert_eq!(trade.exit_price, Some(dec!(80)));
    }
}
