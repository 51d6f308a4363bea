use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::catalog::{
    normalize_department, Exam, ExamCreate, Student, StudentCreate, Subject, SubjectCreate,
    MAX_LEVEL, MIN_LEVEL,
};
use crate::schemas::DataResponse;

pub(super) async fn get_subjects(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Subject>>>, ApiError> {
    let subjects = repositories::subjects::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(DataResponse::new(subjects.into_iter().map(Subject::from_db).collect())))
}

pub(super) async fn add_subject(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<DataResponse<Subject>>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let department = normalize_department(payload.department);
    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            level: payload.level,
            department: department.as_deref(),
            cq_mark: payload.cq_mark,
            mcq_mark: payload.mcq_mark,
            practical_mark: payload.practical_mark,
            full_mark: payload.full_mark,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    tracing::info!(subject_id = %subject.id, created_by = %user.id, "Subject created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(Subject::from_db(subject)))))
}

pub(super) async fn get_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Exam>>>, ApiError> {
    let exams = repositories::exams::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(DataResponse::new(exams.into_iter().map(Exam::from_db).collect())))
}

pub(super) async fn add_exam(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<DataResponse<Exam>>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut levels = payload.levels;
    if let Some(level) = levels.iter().find(|level| !(MIN_LEVEL..=MAX_LEVEL).contains(*level)) {
        return Err(ApiError::BadRequest(format!(
            "level {level} must be between {MIN_LEVEL} and {MAX_LEVEL}"
        )));
    }
    levels.sort_unstable();
    levels.dedup();

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            year: payload.year,
            levels: &levels,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_insert(e, "Exam already exists for this year", "Failed to create exam")
    })?;

    tracing::info!(exam_id = %exam.id, created_by = %user.id, "Exam created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(Exam::from_db(exam)))))
}

pub(super) async fn get_students_by_class(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path((year, level)): Path<(i32, i32)>,
) -> Result<Json<DataResponse<Vec<Student>>>, ApiError> {
    let students = repositories::students::list_by_class(state.db(), year, level)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(DataResponse::new(students.into_iter().map(Student::from_db).collect())))
}

pub(super) async fn add_student(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<DataResponse<Student>>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let department = normalize_department(payload.department);
    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            roll: payload.roll,
            level: payload.level,
            section: payload.section.trim(),
            department: department.as_deref(),
            year: payload.year,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_insert(
            e,
            "Roll number already taken in this section",
            "Failed to create student",
        )
    })?;

    tracing::info!(student_id = %student.id, created_by = %user.id, "Student created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(Student::from_db(student)))))
}
