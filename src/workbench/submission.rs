use thiserror::Error;

use crate::grading::ExamKind;
use crate::schemas::catalog::{Exam, Student, Subject};
use crate::schemas::marks::{GpaBatch, MarksBatch, StudentGpa, StudentMarks, SubjectMark};
use crate::workbench::filter::FilterForm;
use crate::workbench::grid::{GpaTable, MarkTable};
use crate::workbench::roster::{filtered_roster, subject_applies_to, visible_subjects};

/// Why the current filter cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionBlocker {
    #[error("select an exam")]
    MissingExam,
    #[error("select a year")]
    MissingYear,
    #[error("select a class")]
    MissingLevel,
    #[error("{exam} is not held for class {level} in {year}")]
    ExamNotForLevel { exam: String, year: i32, level: i32 },
    #[error("no students match the selected section and department")]
    EmptyRoster,
    #[error("{0} has no gradable components")]
    SubjectNotGradable(String),
    #[error("no gradable subject is visible")]
    NoGradableSubject,
}

pub fn submission_blocker(
    filter: &FilterForm,
    exams: &[Exam],
    subjects: &[Subject],
    roster: &[Student],
) -> Option<SubmissionBlocker> {
    let Some(kind) = filter.exam_kind() else {
        return Some(SubmissionBlocker::MissingExam);
    };
    let Some(year) = filter.year() else {
        return Some(SubmissionBlocker::MissingYear);
    };
    let Some(level) = filter.level() else {
        return Some(SubmissionBlocker::MissingLevel);
    };
    if !filter.scheduled_exam(exams).is_some_and(|exam| exam.is_held_for(level)) {
        return Some(SubmissionBlocker::ExamNotForLevel {
            exam: filter.exam_name().unwrap_or_default().to_string(),
            year,
            level,
        });
    }
    if filtered_roster(roster, filter).is_empty() {
        return Some(SubmissionBlocker::EmptyRoster);
    }
    if kind != ExamKind::Standard {
        return None;
    }

    match filter.subject() {
        Some(selected) if !selected.is_gradable() => {
            Some(SubmissionBlocker::SubjectNotGradable(selected.name.clone()))
        }
        Some(_) => None,
        None if visible_subjects(subjects, filter).iter().any(|subject| subject.is_gradable()) => {
            None
        }
        None => Some(SubmissionBlocker::NoGradableSubject),
    }
}

impl GpaBatch {
    /// One row per visible student; blank or unreadable GPA text is sent as `null`.
    pub fn build(exam_name: &str, table: &GpaTable, visible: &[&Student]) -> Self {
        let students = visible
            .iter()
            .map(|student| StudentGpa {
                student_id: student.id.clone(),
                gpa: table.get(&student.id).and_then(|raw| raw.trim().parse::<f64>().ok()),
            })
            .collect();

        Self { students, exam_name: exam_name.to_string() }
    }
}

impl MarksBatch {
    /// Every visible student with the visible subjects that apply to them.
    ///
    /// With a single subject selected only that subject is sent, so other subjects keep their
    /// stored marks.
    pub fn build(
        exam_name: &str,
        year: i32,
        table: &MarkTable,
        visible_students: &[&Student],
        visible_subjects: &[&Subject],
    ) -> Self {
        let students = visible_students
            .iter()
            .map(|student| StudentMarks {
                student_id: student.id.clone(),
                subject_marks: visible_subjects
                    .iter()
                    .filter(|subject| subject_applies_to(subject, student))
                    .map(|subject| {
                        let entry = table.get(&student.id, &subject.id).copied().unwrap_or_default();
                        SubjectMark {
                            subject_id: subject.id.clone(),
                            cq: entry.cq.max(0),
                            mcq: entry.mcq.max(0),
                            practical: entry.practical.max(0),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { students, exam_name: exam_name.to_string(), year }
    }
}
