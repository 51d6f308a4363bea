use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::RefreshToken;

const COLUMNS: &str = "id, user_id, expires_at, revoked_at";

pub(crate) struct CreateRefreshToken<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub token_hash: &'a str,
    pub expires_at: PrimitiveDateTime,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateRefreshToken<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.token_hash)
    .bind(params.expires_at)
    .bind(params.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(&format!(
        "SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Marks the token revoked. Returns `false` when it was already revoked, so two concurrent
/// refreshes with the same token cannot both succeed.
pub(crate) async fn revoke(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn delete_expired(
    pool: &PgPool,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND expires_at < $2")
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
