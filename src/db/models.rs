use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct RefreshToken {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) revoked_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) roll: i32,
    pub(crate) level: i32,
    pub(crate) section: String,
    pub(crate) department: Option<String>,
    pub(crate) year: i32,
    pub(crate) jsc_gpa: Option<f64>,
    pub(crate) ssc_gpa: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) level: i32,
    pub(crate) department: Option<String>,
    pub(crate) cq_mark: Option<i32>,
    pub(crate) mcq_mark: Option<i32>,
    pub(crate) practical_mark: Option<i32>,
    pub(crate) full_mark: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) levels: Vec<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Mark {
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) cq: i32,
    pub(crate) mcq: i32,
    pub(crate) practical: i32,
}
