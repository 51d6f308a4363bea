use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Mark;

pub(crate) async fn list_for_class(
    pool: &PgPool,
    level: i32,
    year: i32,
    exam_name: &str,
) -> Result<Vec<Mark>, sqlx::Error> {
    sqlx::query_as::<_, Mark>(
        "SELECT m.student_id, m.subject_id, m.cq, m.mcq, m.practical
         FROM marks m
         JOIN students s ON s.id = m.student_id
         WHERE s.level = $1 AND m.year = $2 AND m.exam_name = $3
         ORDER BY m.student_id, m.subject_id",
    )
    .bind(level)
    .bind(year)
    .bind(exam_name)
    .fetch_all(pool)
    .await
}

pub(crate) struct UpsertMark<'a> {
    pub student_id: &'a str,
    pub subject_id: &'a str,
    pub exam_name: &'a str,
    pub year: i32,
    pub cq: i32,
    pub mcq: i32,
    pub practical: i32,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertMark<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO marks (
            id, student_id, subject_id, exam_name, year, cq, mcq, practical, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        ON CONFLICT (student_id, subject_id, exam_name, year) DO UPDATE SET
            cq = EXCLUDED.cq,
            mcq = EXCLUDED.mcq,
            practical = EXCLUDED.practical,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.subject_id)
    .bind(params.exam_name)
    .bind(params.year)
    .bind(params.cq)
    .bind(params.mcq)
    .bind(params.practical)
    .bind(params.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
