//! 계좌 저장소.
//!
//! 모든 쿼리는 `(id, user_id)`로 소유권을 함께 확인합니다.

use journal_core::{Account, NewAccount};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct AccountRepository;

impl AccountRepository {
    /// 계좌 ID로 조회.
    pub async fn get_by_id(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(account_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// 사용자의 계좌 목록 (생성 순).
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 계좌 생성. 현재 잔고는 초기 잔고로 시작합니다.
    pub async fn create(pool: &PgPool, input: NewAccount) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (
                user_id, name, initial_balance, current_balance,
                currency, leverage, max_drawdown
            )
            VALUES ($1, $2, $3, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.name)
        .bind(input.initial_balance)
        .bind(&input.currency)
        .bind(input.leverage)
        .bind(input.max_drawdown)
        .fetch_one(pool)
        .await
    }

    /// 계좌 삭제 (거래는 FK로 함께 삭제).
    pub async fn delete(pool: &PgPool, account_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(account_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 현재 잔고 직접 갱신.
    pub async fn update_balance(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
        balance: Decimal,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET current_balance = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(balance)
        .fetch_optional(pool)
        .await
    }

    /// 현재 잔고를 `initial_balance + Σ pnl`로 맞춥니다.
    ///
    /// 합계 계산과 갱신이 한 문장에서 이루어지므로 동시 동기화 사이에
    /// 갱신 손실이 생기지 않습니다. 차이가 `tolerance` 이하이면 행이 갱신되지 않고
    /// `None`을 반환합니다.
    pub async fn reconcile_balance(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
        tolerance: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE accounts a
            SET current_balance = a.initial_balance + t.total_pnl,
                updated_at = NOW()
            FROM (
                SELECT COALESCE(SUM(pnl), 0) AS total_pnl
                FROM trades
                WHERE account_id = $1 AND user_id = $2
            ) t
            WHERE a.id = $1
                AND a.user_id = $2
                AND ABS(a.initial_balance + t.total_pnl - a.current_balance) > $3
            RETURNING a.current_balance
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(tolerance)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(balance,)| balance))
    }
}
