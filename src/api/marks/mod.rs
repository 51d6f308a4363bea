mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/getClassMarks/:level/:year/:exam", get(handlers::get_class_marks))
        .route("/getGPA/:year", get(handlers::get_gpa))
        .route("/addMarks", post(handlers::add_marks))
        .route("/addGPA", post(handlers::add_gpa))
}
