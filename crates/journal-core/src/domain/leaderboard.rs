//! 리더보드 참여 설정 및 순위 항목.
//!
//! 사용자는 리더보드 참여를 직접 선택(opt-in)하며, 공개할 항목을 개별로 지정합니다.
//! 숨긴 항목은 응답에서 `null`로 직렬화됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::win_rate_pct;
use crate::error::JournalError;

/// 리더보드 참여 설정 (사용자당 1개).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct LeaderboardOptIn {
    pub user_id: Uuid,
    pub display_name: String,
    pub show_win_rate: bool,
    pub show_pnl: bool,
    pub show_trade_count: bool,
    pub show_avg_r: bool,
    /// 참여 중 여부 (탈퇴 시 false)
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 참여 설정 입력.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptInPreferences {
    pub display_name: String,
    #[serde(default = "default_visible")]
    pub show_win_rate: bool,
    #[serde(default = "default_visible")]
    pub show_pnl: bool,
    #[serde(default = "default_visible")]
    pub show_trade_count: bool,
    #[serde(default = "default_visible")]
    pub show_avg_r: bool,
}

fn default_visible() -> bool {
    true
}

impl OptInPreferences {
    /// 모든 항목을 공개하는 설정.
    pub fn public(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            show_win_rate: true,
            show_pnl: true,
            show_trade_count: true,
            show_avg_r: true,
        }
    }
}

/// `leaderboard_stats` 뷰의 한 행 (사용자별 집계 + 공개 설정).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct LeaderboardStats {
    pub user_id: Uuid,
    pub display_name: String,
    pub show_win_rate: bool,
    pub show_pnl: bool,
    pub show_trade_count: bool,
    pub show_avg_r: bool,
    pub trade_count: i64,
    pub wins: i64,
    pub losses: i64,
    pub total_pnl: Decimal,
    pub avg_r_multiple: Option<Decimal>,
}

impl From<LeaderboardOptIn> for LeaderboardStats {
    /// 뷰를 사용할 수 없을 때의 대체 행 (통계 0).
    fn from(opt_in: LeaderboardOptIn) -> Self {
        Self {
            user_id: opt_in.user_id,
            display_name: opt_in.display_name,
            show_win_rate: opt_in.show_win_rate,
            show_pnl: opt_in.show_pnl,
            show_trade_count: opt_in.show_trade_count,
            show_avg_r: opt_in.show_avg_r,
            trade_count: 0,
            wins: 0,
            losses: 0,
            total_pnl: Decimal::ZERO,
            avg_r_multiple: None,
        }
    }
}

impl LeaderboardStats {
    /// 승률 (%).
    pub fn win_rate(&self) -> Decimal {
        win_rate_pct(self.wins.max(0) as usize, self.losses.max(0) as usize)
    }

    fn sort_key(&self, sort: LeaderboardSort) -> Decimal {
        match sort {
            LeaderboardSort::Pnl => self.total_pnl,
            LeaderboardSort::WinRate => self.win_rate(),
            LeaderboardSort::Trades => Decimal::from(self.trade_count),
            LeaderboardSort::AvgR => self.avg_r_multiple.unwrap_or(Decimal::MIN),
        }
    }
}

/// 리더보드 정렬 기준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    #[default]
    Pnl,
    WinRate,
    Trades,
    AvgR,
}

impl std::str::FromStr for LeaderboardSort {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pnl" => Ok(LeaderboardSort::Pnl),
            "win_rate" | "winrate" => Ok(LeaderboardSort::WinRate),
            "trades" | "trade_count" => Ok(LeaderboardSort::Trades),
            "avg_r" | "r" => Ok(LeaderboardSort::AvgR),
            other => Err(JournalError::InvalidInput(format!(
                "unknown leaderboard sort: {}",
                other
            ))),
        }
    }
}

/// 리더보드 데이터 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSource {
    /// 집계 뷰
    View,
    /// 뷰 실패 시 참여 설정 테이블
    OptIns,
}

/// 공개 설정이 적용된 리더보드 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub display_name: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub win_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub total_pnl: Option<Decimal>,
    pub trade_count: Option<i64>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub avg_r_multiple: Option<Decimal>,
}

impl LeaderboardEntry {
    /// 공개 설정에 따라 숨긴 항목을 가립니다.
    pub fn masked(rank: usize, stats: &LeaderboardStats) -> Self {
        Self {
            rank,
            user_id: stats.user_id,
            display_name: stats.display_name.clone(),
            win_rate: stats.show_win_rate.then(|| stats.win_rate().round_dp(2)),
            total_pnl: stats.show_pnl.then_some(stats.total_pnl),
            trade_count: stats.show_trade_count.then_some(stats.trade_count),
            avg_r_multiple: if stats.show_avg_r {
                stats.avg_r_multiple
            } else {
                None
            },
        }
    }
}

/// 리더보드 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub source: LeaderboardSource,
    pub sort: LeaderboardSort,
    pub entries: Vec<LeaderboardEntry>,
}

/// 정렬 후 순위를 매기고 공개 설정을 적용합니다.
///
/// 정렬은 가리기 전 값으로 수행하며, 동률은 표시 이름 순입니다.
pub fn rank_entries(
    mut stats: Vec<LeaderboardStats>,
    sort: LeaderboardSort,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    stats.sort_by(|a, b| {
        b.sort_key(sort)
            .cmp(&a.sort_key(sort))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    stats
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| LeaderboardEntry::masked(i + 1, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stats(name: &str, trades: i64, wins: i64, losses: i64, pnl: Decimal) -> LeaderboardStats {
        LeaderboardStats {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            show_win_rate: true,
            show_pnl: true,
            show_trade_count: true,
            show_avg_r: true,
            trade_count: trades,
            wins,
            losses,
            total_pnl: pnl,
            avg_r_multiple: None,
        }
    }

    #[test]
    fn test_rank_by_pnl() {
        let rows = vec![
            stats("alice", 10, 6, 4, dec!(500)),
            stats("bob", 4, 4, 0, dec!(1200)),
            stats("carol", 20, 8, 12, dec!(-100)),
        ];

        let entries = rank_entries(rows, LeaderboardSort::Pnl, 50);

        let names: Vec<_> = entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn test_rank_by_win_rate_and_limit() {
        let rows = vec![
            stats("alice", 10, 6, 4, dec!(500)),
            stats("bob", 4, 4, 0, dec!(1200)),
            stats("carol", 20, 8, 12, dec!(-100)),
        ];

        let entries = rank_entries(rows, LeaderboardSort::WinRate, 2);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name, "bob");
        assert_eq!(entries[0].win_rate, Some(dec!(100)));
        assert_eq!(entries[1].win_rate, Some(dec!(60)));
    }

    #[test]
    fn test_hidden_fields_are_masked_but_still_ranked() {
        let mut hidden = stats("ghost", 3, 3, 0, dec!(9000));
        hidden.show_pnl = false;
        hidden.show_trade_count = false;
        let rows = vec![stats("alice", 10, 6, 4, dec!(500)), hidden];

        let entries = rank_entries(rows, LeaderboardSort::Pnl, 50);

        assert_eq!(entries[0].display_name, "ghost");
        assert_eq!(entries[0].total_pnl, None);
        assert_eq!(entries[0].trade_count, None);
        assert_eq!(entries[0].win_rate, Some(dec!(100)));

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert!(json["total_pnl"].is_null());
    }

    #[test]
    fn test_fallback_row_has_zero_stats() {
        let now = Utc::now();
        let opt_in = LeaderboardOptIn {
            user_id: Uuid::new_v4(),
            display_name: "dave".to_string(),
            show_win_rate: true,
            show_pnl: false,
            show_trade_count: true,
            show_avg_r: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let row = LeaderboardStats::from(opt_in);

        assert_eq!(row.trade_count, 0);
        assert_eq!(row.total_pnl, Decimal::ZERO);
        assert!(!row.show_pnl);
        assert_eq!(row.win_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("PNL".parse::<LeaderboardSort>().unwrap(), LeaderboardSort::Pnl);
        assert_eq!("win_rate".parse::<LeaderboardSort>().unwrap(), LeaderboardSort::WinRate);
        assert_eq!("avg_r".parse::<LeaderboardSort>().unwrap(), LeaderboardSort::AvgR);
        assert!("volume".parse::<LeaderboardSort>().is_err());
    }

    #[test]
    fn test_preferences_default_to_visible() {
        let prefs: OptInPreferences =
            serde_json::from_str(r#"{"display_name":"eve","show_pnl":false}"#).unwrap();
        assert!(prefs.show_win_rate);
        assert!(!prefs.show_pnl);
        assert!(prefs.show_avg_r);
    }
}
