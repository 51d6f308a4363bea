use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Subject;

const COLUMNS: &str =
    "id, name, level, department, cq_mark, mcq_mark, practical_mark, full_mark";

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects ORDER BY level, name"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn list_by_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<Vec<Subject>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub(crate) struct CreateSubject<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub level: i32,
    pub department: Option<&'a str>,
    pub cq_mark: Option<i32>,
    pub mcq_mark: Option<i32>,
    pub practical_mark: Option<i32>,
    pub full_mark: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSubject<'_>) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (
            id, name, level, department, cq_mark, mcq_mark, practical_mark, full_mark, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.level)
    .bind(params.department)
    .bind(params.cq_mark)
    .bind(params.mcq_mark)
    .bind(params.practical_mark)
    .bind(params.full_mark)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}
