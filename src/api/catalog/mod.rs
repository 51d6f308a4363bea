mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn subjects_router() -> Router<AppState> {
    Router::new()
        .route("/getSubjects", get(handlers::get_subjects))
        .route("/addSubject", post(handlers::add_subject))
}

pub(crate) fn exams_router() -> Router<AppState> {
    Router::new()
        .route("/getExams", get(handlers::get_exams))
        .route("/addExam", post(handlers::add_exam))
}

pub(crate) fn students_router() -> Router<AppState> {
    Router::new()
        .route("/getStudentsByClass/:year/:level", get(handlers::get_students_by_class))
        .route("/addStudent", post(handlers::add_student))
}
