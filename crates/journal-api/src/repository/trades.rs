//! 거래 저장소.

use journal_core::{NewTrade, Trade, TradeUpdate};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TradeRepository;

impl TradeRepository {
    /// 거래 ID로 조회.
    pub async fn get_by_id(
        pool: &PgPool,
        trade_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Trade>, sqlx::Error> {
        sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1 AND user_id = $2")
            .bind(trade_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// 계좌의 거래 목록 (진입 시각 순).
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Trade>, sqlx::Error> {
        sqlx::query_as::<_, Trade>(
            r#"
            SELECT *
            FROM trades
            WHERE account_id = $1 AND user_id = $2
            ORDER BY entry_date ASC, created_at ASC
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 계좌의 거래 개수.
    pub async fn count_by_account(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM trades WHERE account_id = $1 AND user_id = $2")
                .bind(account_id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(result.0)
    }

    /// 거래 생성.
    pub async fn create(pool: &PgPool, input: NewTrade) -> Result<Trade, sqlx::Error> {
        let outcome = input.resolved_outcome();
        let r_multiple = input.resolved_r_multiple();

        sqlx::query_as::<_, Trade>(
            r#"
            INSERT INTO trades (
                account_id, user_id, symbol, direction,
                entry_price, exit_price, stop_loss, quantity,
                entry_date, exit_date, pnl, outcome, r_multiple, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.user_id)
        .bind(&input.symbol)
        .bind(input.direction.as_str())
        .bind(input.entry_price)
        .bind(input.exit_price)
        .bind(input.stop_loss)
        .bind(input.quantity)
        .bind(input.entry_date)
        .bind(input.exit_date)
        .bind(input.pnl)
        .bind(outcome.as_str())
        .bind(r_multiple)
        .bind(&input.notes)
        .fetch_one(pool)
        .await
    }

    /// 거래 수정.
    ///
    /// 기존 행을 잠그고 읽은 뒤 결과/R 배수를 다시 계산해 기록합니다.
    pub async fn update(
        pool: &PgPool,
        trade_id: Uuid,
        user_id: Uuid,
        update: TradeUpdate,
    ) -> Result<Option<Trade>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, Trade>(
            "SELECT * FROM trades WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(trade_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut trade) = existing else {
            return Ok(None);
        };
        update.apply_to(&mut trade);

        let updated = sqlx::query_as::<_, Trade>(
            r#"
            UPDATE trades
            SET symbol = $3, exit_price = $4, stop_loss = $5, exit_date = $6,
                pnl = $7, outcome = $8, r_multiple = $9, notes = $10,
                updated_at = $11
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(trade_id)
        .bind(user_id)
        .bind(&trade.symbol)
        .bind(trade.exit_price)
        .bind(trade.stop_loss)
        .bind(trade.exit_date)
        .bind(trade.pnl)
        .bind(trade.outcome.as_str())
        .bind(trade.r_multiple)
        .bind(&trade.notes)
        .bind(trade.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// 거래 삭제. 삭제된 거래를 반환합니다.
    pub async fn delete(
        pool: &PgPool,
        trade_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Trade>, sqlx::Error> {
        sqlx::query_as::<_, Trade>(
            "DELETE FROM trades WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(trade_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
