//! 리더보드 저장소.
//!
//! `leaderboard_stats` 뷰는 마이그레이션이 아니라 런타임 DDL로 생성됩니다.

use journal_core::{LeaderboardOptIn, LeaderboardStats, OptInPreferences};
use sqlx::PgPool;
use uuid::Uuid;

/// 사용자별 거래 집계와 참여 설정을 결합하는 뷰.
const LEADERBOARD_VIEW_DDL: &str = r#"
CREATE OR REPLACE VIEW leaderboard_stats AS
SELECT
    o.user_id,
    o.display_name,
    o.show_win_rate,
    o.show_pnl,
    o.show_trade_count,
    o.show_avg_r,
    COALESCE(s.trade_count, 0)::BIGINT AS trade_count,
    COALESCE(s.wins, 0)::BIGINT AS wins,
    COALESCE(s.losses, 0)::BIGINT AS losses,
    COALESCE(s.total_pnl, 0)::NUMERIC AS total_pnl,
    s.avg_r_multiple
FROM leaderboard_opt_ins o
LEFT JOIN (
    SELECT
        user_id,
        COUNT(*) AS trade_count,
        COUNT(*) FILTER (WHERE outcome = 'win') AS wins,
        COUNT(*) FILTER (WHERE outcome = 'loss') AS losses,
        SUM(COALESCE(pnl, 0)) AS total_pnl,
        AVG(r_multiple) AS avg_r_multiple
    FROM trades
    GROUP BY user_id
) s ON s.user_id = o.user_id
WHERE o.is_active
"#;

pub struct LeaderboardRepository;

impl LeaderboardRepository {
    /// 뷰 생성 또는 교체.
    pub async fn create_view(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(LEADERBOARD_VIEW_DDL).execute(pool).await?;
        Ok(())
    }

    /// 뷰 조회.
    pub async fn query_view(pool: &PgPool) -> Result<Vec<LeaderboardStats>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardStats>("SELECT * FROM leaderboard_stats")
            .fetch_all(pool)
            .await
    }

    /// 참여 중인 설정 목록.
    pub async fn list_active_opt_ins(pool: &PgPool) -> Result<Vec<LeaderboardOptIn>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardOptIn>(
            "SELECT * FROM leaderboard_opt_ins WHERE is_active ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// 사용자 참여 설정 조회.
    pub async fn get_opt_in(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<LeaderboardOptIn>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardOptIn>(
            "SELECT * FROM leaderboard_opt_ins WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// 참여 설정 저장 (이미 있으면 갱신 후 재활성화).
    pub async fn upsert_opt_in(
        pool: &PgPool,
        user_id: Uuid,
        preferences: OptInPreferences,
    ) -> Result<LeaderboardOptIn, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardOptIn>(
            r#"
            INSERT INTO leaderboard_opt_ins (
                user_id, display_name, show_win_rate, show_pnl,
                show_trade_count, show_avg_r, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (user_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                show_win_rate = EXCLUDED.show_win_rate,
                show_pnl = EXCLUDED.show_pnl,
                show_trade_count = EXCLUDED.show_trade_count,
                show_avg_r = EXCLUDED.show_avg_r,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&preferences.display_name)
        .bind(preferences.show_win_rate)
        .bind(preferences.show_pnl)
        .bind(preferences.show_trade_count)
        .bind(preferences.show_avg_r)
        .fetch_one(pool)
        .await
    }

    /// 참여 해제.
    pub async fn deactivate_opt_in(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE leaderboard_opt_ins
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
