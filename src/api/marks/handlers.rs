use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::grading::TerminalExam;
use crate::repositories;
use crate::repositories::students::GpaColumn;
use crate::schemas::catalog::Subject;
use crate::schemas::marks::{
    BatchResult, GpaBatch, MarksBatch, StudentWithGpa, StudentWithMarks, SubjectMark,
};
use crate::schemas::DataResponse;
use crate::services::mark_policy;

pub(super) async fn get_class_marks(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path((level, year, exam)): Path<(i32, i32, String)>,
) -> Result<Json<DataResponse<Vec<StudentWithMarks>>>, ApiError> {
    let students = repositories::students::list_by_class(state.db(), year, level)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let marks = repositories::marks::list_for_class(state.db(), level, year, &exam)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list marks"))?;

    let mut by_student: HashMap<String, Vec<SubjectMark>> = HashMap::new();
    for mark in marks {
        by_student.entry(mark.student_id).or_default().push(SubjectMark {
            subject_id: mark.subject_id,
            cq: mark.cq,
            mcq: mark.mcq,
            practical: mark.practical,
        });
    }

    let data = students
        .into_iter()
        .map(|student| StudentWithMarks {
            marks: by_student.remove(&student.id).unwrap_or_default(),
            id: student.id,
            name: student.name,
            roll: student.roll,
            section: student.section,
            department: student.department,
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

pub(super) async fn get_gpa(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<DataResponse<Vec<StudentWithGpa>>>, ApiError> {
    let students = repositories::students::list_by_year(state.db(), year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    let data = students
        .into_iter()
        .map(|student| StudentWithGpa {
            id: student.id,
            name: student.name,
            roll: student.roll,
            level: student.level,
            section: student.section,
            department: student.department,
            jsc_gpa: student.jsc_gpa,
            ssc_gpa: student.ssc_gpa,
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

pub(super) async fn add_marks(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(batch): Json<MarksBatch>,
) -> Result<Json<BatchResult>, ApiError> {
    let exam = repositories::exams::find_by_name_year(state.db(), &batch.exam_name, batch.year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Exam {} not found for {}", batch.exam_name, batch.year))
        })?;

    let student_ids = unique_ids(batch.students.iter().map(|row| row.student_id.as_str()));
    let subject_ids = unique_ids(
        batch.students.iter().flat_map(|row| row.subject_marks.iter()).map(|m| m.subject_id.as_str()),
    );

    let students = repositories::students::list_by_ids(state.db(), &student_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load students"))?
        .into_iter()
        .map(|student| (student.id.clone(), student))
        .collect();
    let subjects = repositories::subjects::list_by_ids(state.db(), &subject_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subjects"))?
        .into_iter()
        .map(|subject| (subject.id.clone(), Subject::from_db(subject)))
        .collect();

    let entries = mark_policy::validate_marks_batch(
        &batch,
        &exam,
        &students,
        &subjects,
        state.settings().marks().max_submission_students,
    )
    .map_err(|err| {
        metrics::record_rejected_batch("marks");
        tracing::warn!(error = %err, exam = %batch.exam_name, "Rejected marks batch");
        ApiError::from(err)
    })?;

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    for row in &batch.students {
        for mark in &row.subject_marks {
            repositories::marks::upsert(
                &mut *tx,
                repositories::marks::UpsertMark {
                    student_id: &row.student_id,
                    subject_id: &mark.subject_id,
                    exam_name: &exam.name,
                    year: batch.year,
                    cq: mark.cq,
                    mcq: mark.mcq,
                    practical: mark.practical,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save marks"))?;
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit marks"))?;

    metrics::record_marks_saved(&exam.name, entries);
    tracing::info!(
        exam = %exam.name,
        year = batch.year,
        students = batch.students.len(),
        entries,
        saved_by = %user.id,
        "Marks saved"
    );

    Ok(Json(BatchResult { message: "Marks saved successfully".to_string(), updated: entries }))
}

pub(super) async fn add_gpa(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(batch): Json<GpaBatch>,
) -> Result<Json<BatchResult>, ApiError> {
    let student_ids = unique_ids(batch.students.iter().map(|row| row.student_id.as_str()));
    let students = repositories::students::list_by_ids(state.db(), &student_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load students"))?
        .into_iter()
        .map(|student| (student.id.clone(), student))
        .collect();

    let (terminal, values) = mark_policy::validate_gpa_batch(
        &batch,
        &students,
        state.settings().marks().max_submission_students,
    )
    .map_err(|err| {
        metrics::record_rejected_batch("gpa");
        tracing::warn!(error = %err, exam = %batch.exam_name, "Rejected GPA batch");
        ApiError::from(err)
    })?;

    let column = match terminal {
        TerminalExam::Jsc => GpaColumn::Jsc,
        TerminalExam::Ssc => GpaColumn::Ssc,
    };

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let mut updated = 0;
    for (student_id, gpa) in &values {
        let rows = repositories::students::set_gpa(&mut *tx, column, student_id, *gpa, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save GPA"))?;
        updated += rows as usize;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit GPA"))?;

    metrics::record_gpa_saved(terminal.name(), updated);
    tracing::info!(exam = terminal.name(), updated, saved_by = %user.id, "GPA saved");

    Ok(Json(BatchResult { message: "GPA saved successfully".to_string(), updated }))
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    ids.collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect()
}
