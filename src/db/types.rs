use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    /// Staff may write marks, GPA and the school catalog.
    pub(crate) fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Teacher)
    }
}
