//! 대시보드 지표 집계.
//!
//! 계좌의 거래 목록으로부터 승률, Profit Factor, 연속 승패, 요일별 통계 등
//! 대시보드에 표시되는 지표를 계산합니다. 저장되지 않고 조회 시마다 계산됩니다.

use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::trade::{Trade, TradeOutcome};

/// 손실 없이 수익만 있을 때의 Profit Factor 표현값.
pub const PROFIT_FACTOR_NO_LOSS: Decimal = dec!(999999);

/// 계좌 대시보드 지표.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// 전체 거래 수 (미청산 포함)
    pub total_trades: usize,
    /// 청산된 거래 수
    pub closed_trades: usize,
    /// 미청산 거래 수
    pub pending_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// 승률 (%, wins / (wins + losses))
    pub win_rate: Decimal,
    /// 총 손익 (손익이 없는 거래는 0으로 취급)
    pub total_pnl: Decimal,
    /// 총 수익 (수익 거래만)
    pub gross_profit: Decimal,
    /// 총 손실 (손실 거래만, 양수)
    pub gross_loss: Decimal,
    /// 총수익 / 총손실
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    /// 평균 손실 (양수)
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    /// 최대 손실 거래 (양수)
    pub largest_loss: Decimal,
    /// 기대값 (승률×평균수익 - 패률×평균손실)
    pub expectancy: Decimal,
    /// 평균 R 배수 (R 배수가 있는 거래만)
    pub avg_r_multiple: Option<Decimal>,
    /// 최대 연속 승리
    pub max_consecutive_wins: usize,
    /// 최대 연속 패배
    pub max_consecutive_losses: usize,
    /// 현재 연속 기록 (양수: 연승, 음수: 연패)
    pub current_streak: i64,
    /// 누적 손익 기준 최대 낙폭 (절대값)
    pub max_drawdown: Decimal,
    /// 요일별 통계 (월~일, 거래가 있는 요일만)
    pub weekday_breakdown: Vec<WeekdayStats>,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            closed_trades: 0,
            pending_trades: 0,
            wins: 0,
            losses: 0,
            breakevens: 0,
            win_rate: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            avg_r_multiple: None,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            current_streak: 0,
            max_drawdown: Decimal::ZERO,
            weekday_breakdown: Vec::new(),
        }
    }
}

/// 요일별 거래 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStats {
    /// 요일 (영문 약어, 예: "Mon")
    pub weekday: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub pnl: Decimal,
    /// 승률 (%)
    pub win_rate: Decimal,
}

impl WeekdayStats {
    fn new(weekday: Weekday) -> Self {
        Self {
            weekday: weekday.to_string(),
            trades: 0,
            wins: 0,
            losses: 0,
            pnl: Decimal::ZERO,
            win_rate: Decimal::ZERO,
        }
    }
}

/// 승률 (%) = wins / (wins + losses) × 100.
pub fn win_rate_pct(wins: usize, losses: usize) -> Decimal {
    let decided = wins + losses;
    if decided == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(wins) / Decimal::from(decided) * dec!(100)
}

/// Profit Factor = 총수익 / 총손실.
pub fn profit_factor(gross_profit: Decimal, gross_loss: Decimal) -> Decimal {
    if gross_loss > Decimal::ZERO {
        gross_profit / gross_loss
    } else if gross_profit > Decimal::ZERO {
        PROFIT_FACTOR_NO_LOSS
    } else {
        Decimal::ZERO
    }
}

impl DashboardMetrics {
    /// 거래 목록으로부터 지표를 계산합니다.
    ///
    /// 연속 기록과 낙폭은 진입 시각 순서로 계산합니다. 본전/미청산 거래는
    /// 연속 기록을 끊지도 늘리지도 않습니다.
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by_key(|t| t.entry_date);

        let mut m = Self {
            total_trades: trades.len(),
            ..Self::default()
        };

        let mut weekdays: Vec<WeekdayStats> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(WeekdayStats::new)
        .collect();

        let mut r_sum = Decimal::ZERO;
        let mut r_count = 0usize;

        let mut current_wins = 0usize;
        let mut current_losses = 0usize;

        let mut cumulative = Decimal::ZERO;
        let mut peak = Decimal::ZERO;

        for trade in ordered {
            let pnl = trade.pnl_or_zero();
            m.total_pnl += pnl;

            let day = &mut weekdays[trade.entry_date.weekday().num_days_from_monday() as usize];
            day.trades += 1;
            day.pnl += pnl;

            if let Some(r) = trade.r_multiple {
                r_sum += r;
                r_count += 1;
            }

            match trade.outcome {
                TradeOutcome::Win => {
                    m.wins += 1;
                    day.wins += 1;
                    m.gross_profit += pnl.max(Decimal::ZERO);
                    m.largest_win = m.largest_win.max(pnl);

                    current_wins += 1;
                    current_losses = 0;
                    m.max_consecutive_wins = m.max_consecutive_wins.max(current_wins);
                }
                TradeOutcome::Loss => {
                    m.losses += 1;
                    day.losses += 1;
                    let loss = pnl.min(Decimal::ZERO).abs();
                    m.gross_loss += loss;
                    m.largest_loss = m.largest_loss.max(loss);

                    current_losses += 1;
                    current_wins = 0;
                    m.max_consecutive_losses = m.max_consecutive_losses.max(current_losses);
                }
                TradeOutcome::Breakeven => m.breakevens += 1,
                TradeOutcome::Pending => m.pending_trades += 1,
            }

            // 누적 손익 기준 낙폭
            cumulative += pnl;
            peak = peak.max(cumulative);
            m.max_drawdown = m.max_drawdown.max(peak - cumulative);
        }

        m.closed_trades = m.total_trades - m.pending_trades;
        m.win_rate = win_rate_pct(m.wins, m.losses);
        m.profit_factor = profit_factor(m.gross_profit, m.gross_loss);

        if m.wins > 0 {
            m.avg_win = m.gross_profit / Decimal::from(m.wins);
        }
        if m.losses > 0 {
            m.avg_loss = m.gross_loss / Decimal::from(m.losses);
        }

        let decided = m.wins + m.losses;
        if decided > 0 {
            let win_prob = Decimal::from(m.wins) / Decimal::from(decided);
            let loss_prob = Decimal::from(m.losses) / Decimal::from(decided);
            m.expectancy = win_prob * m.avg_win - loss_prob * m.avg_loss;
        }

        if r_count > 0 {
            m.avg_r_multiple = Some((r_sum / Decimal::from(r_count)).round_dp(4));
        }

        m.current_streak = if current_wins > 0 {
            current_wins as i64
        } else {
            -(current_losses as i64)
        };

        m.weekday_breakdown = weekdays
            .into_iter()
            .filter(|d| d.trades > 0)
            .map(|mut d| {
                d.win_rate = win_rate_pct(d.wins, d.losses);
                d
            })
            .collect();

        m
    }

    /// 거래당 평균 손익 (청산 거래 기준).
    pub fn avg_trade_pnl(&self) -> Decimal {
        if self.closed_trades > 0 {
            self.total_pnl / Decimal::from(self.closed_trades)
        } else {
            Decimal::ZERO
        }
    }
}
