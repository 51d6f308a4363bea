use serde::{Deserialize, Serialize};

/// One subject's component marks for a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMark {
    #[serde(alias = "subject_id")]
    pub subject_id: String,
    #[serde(default)]
    pub cq: i32,
    #[serde(default)]
    pub mcq: i32,
    #[serde(default)]
    pub practical: i32,
}

/// A student of the class together with the marks recorded for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentWithMarks {
    pub id: String,
    pub name: String,
    pub roll: i32,
    pub section: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub marks: Vec<SubjectMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentWithGpa {
    pub id: String,
    pub name: String,
    pub roll: i32,
    pub level: i32,
    pub section: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub jsc_gpa: Option<f64>,
    #[serde(default)]
    pub ssc_gpa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMarks {
    #[serde(alias = "student_id")]
    pub student_id: String,
    #[serde(default)]
    pub subject_marks: Vec<SubjectMark>,
}

/// Body of `POST /marks/addMarks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksBatch {
    pub students: Vec<StudentMarks>,
    #[serde(alias = "exam_name")]
    pub exam_name: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGpa {
    #[serde(alias = "student_id")]
    pub student_id: String,
    /// `None` clears the stored value.
    #[serde(default)]
    pub gpa: Option<f64>,
}

/// Body of `POST /marks/addGPA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaBatch {
    pub students: Vec<StudentGpa>,
    #[serde(alias = "exam_name")]
    pub exam_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub message: String,
    pub updated: usize,
}
