use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models;

pub const MIN_LEVEL: i32 = 6;
pub const MAX_LEVEL: i32 = 10;

/// A subject taught at one class level, optionally scoped to a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub level: i32,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub cq_mark: Option<i32>,
    #[serde(default)]
    pub mcq_mark: Option<i32>,
    #[serde(default)]
    pub practical_mark: Option<i32>,
    pub full_mark: i32,
}

impl Subject {
    pub(crate) fn from_db(subject: models::Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            level: subject.level,
            department: subject.department,
            cq_mark: subject.cq_mark,
            mcq_mark: subject.mcq_mark,
            practical_mark: subject.practical_mark,
            full_mark: subject.full_mark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub levels: Vec<i32>,
}

impl Exam {
    pub(crate) fn from_db(exam: models::Exam) -> Self {
        Self { id: exam.id, name: exam.name, year: exam.year, levels: exam.levels }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll: i32,
    pub level: i32,
    pub section: String,
    #[serde(default)]
    pub department: Option<String>,
    pub year: i32,
}

impl Student {
    pub(crate) fn from_db(student: models::Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            roll: student.roll,
            level: student.level,
            section: student.section,
            department: student.department,
            year: student.year,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(range(min = 6, max = 10, message = "level must be between 6 and 10"))]
    pub(crate) level: i32,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    #[serde(alias = "cqMark")]
    #[validate(range(min = 0, max = 999, message = "cq_mark must be between 0 and 999"))]
    pub(crate) cq_mark: Option<i32>,
    #[serde(default)]
    #[serde(alias = "mcqMark")]
    #[validate(range(min = 0, max = 999, message = "mcq_mark must be between 0 and 999"))]
    pub(crate) mcq_mark: Option<i32>,
    #[serde(default)]
    #[serde(alias = "practicalMark")]
    #[validate(range(min = 0, max = 999, message = "practical_mark must be between 0 and 999"))]
    pub(crate) practical_mark: Option<i32>,
    #[serde(alias = "fullMark")]
    #[validate(range(min = 1, max = 999, message = "full_mark must be between 1 and 999"))]
    pub(crate) full_mark: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 64, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(range(min = 1900, max = 2200, message = "year is out of range"))]
    pub(crate) year: i32,
    #[serde(default)]
    pub(crate) levels: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(range(min = 1, message = "roll must be positive"))]
    pub(crate) roll: i32,
    #[validate(range(min = 6, max = 10, message = "level must be between 6 and 10"))]
    pub(crate) level: i32,
    #[validate(length(min = 1, max = 16, message = "section must not be empty"))]
    pub(crate) section: String,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[validate(range(min = 1900, max = 2200, message = "year is out of range"))]
    pub(crate) year: i32,
}

/// Blank department strings from form posts mean "general".
pub(crate) fn normalize_department(value: Option<String>) -> Option<String> {
    value.map(|item| item.trim().to_string()).filter(|item| !item.is_empty())
}
