use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;

const COLUMNS: &str = "id, name, year, levels";

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams ORDER BY year DESC, name"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_name_year(
    pool: &PgPool,
    name: &str,
    year: i32,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE name = $1 AND year = $2"))
        .bind(name)
        .bind(year)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateExam<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub year: i32,
    pub levels: &'a [i32],
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, name, year, levels, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.year)
    .bind(params.levels)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}
