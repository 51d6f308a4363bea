use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Student;

pub(crate) const COLUMNS: &str =
    "id, name, roll, level, section, department, year, jsc_gpa, ssc_gpa";

/// Which GPA column a terminal exam writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GpaColumn {
    Jsc,
    Ssc,
}

pub(crate) async fn list_by_class(
    pool: &PgPool,
    year: i32,
    level: i32,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS}
         FROM students
         WHERE year = $1 AND level = $2
         ORDER BY section, roll"
    ))
    .bind(year)
    .bind(level)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_year(pool: &PgPool, year: i32) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS}
         FROM students
         WHERE year = $1
         ORDER BY level, section, roll"
    ))
    .bind(year)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<Vec<Student>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub(crate) struct CreateStudent<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub roll: i32,
    pub level: i32,
    pub section: &'a str,
    pub department: Option<&'a str>,
    pub year: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateStudent<'_>) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, name, roll, level, section, department, year, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.roll)
    .bind(params.level)
    .bind(params.section)
    .bind(params.department)
    .bind(params.year)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_gpa(
    executor: impl sqlx::PgExecutor<'_>,
    column: GpaColumn,
    student_id: &str,
    gpa: Option<f64>,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let sql = match column {
        GpaColumn::Jsc => "UPDATE students SET jsc_gpa = $1, updated_at = $2 WHERE id = $3",
        GpaColumn::Ssc => "UPDATE students SET ssc_gpa = $1, updated_at = $2 WHERE id = $3",
    };

    let result = sqlx::query(sql).bind(gpa).bind(now).bind(student_id).execute(executor).await?;
    Ok(result.rows_affected())
}
