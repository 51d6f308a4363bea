//! Authoritative checks applied to mark and GPA batches before anything is written.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::db::models::{Exam, Student};
use crate::grading::{round_gpa, ExamKind, MarkComponent, TerminalExam, GPA_MAX};
use crate::schemas::catalog::Subject;
use crate::schemas::marks::{GpaBatch, MarksBatch};

#[derive(Debug, Error, PartialEq)]
pub(crate) enum MarkPolicyError {
    #[error("batch contains no students")]
    EmptyBatch,
    #[error("batch contains {count} students, the limit is {limit}")]
    TooManyStudents { count: usize, limit: usize },
    #[error("{0} is graded by GPA; use addGPA")]
    TerminalExamMarks(String),
    #[error("{0} is not a GPA exam")]
    NotTerminalExam(String),
    #[error("student {0} appears more than once")]
    DuplicateStudent(String),
    #[error("student {0} does not exist")]
    UnknownStudent(String),
    #[error("student {student_id} is not enrolled in {year}")]
    StudentYearMismatch { student_id: String, year: i32 },
    #[error("exam {exam} is not held for class {level}")]
    ExamNotForLevel { exam: String, level: i32 },
    #[error("subject {0} does not exist")]
    UnknownSubject(String),
    #[error("subject {subject_id} appears more than once for student {student_id}")]
    DuplicateSubject { student_id: String, subject_id: String },
    #[error("subject {subject_id} is not taught in class {level}")]
    SubjectLevelMismatch { subject_id: String, level: i32 },
    #[error("subject {subject_id} is restricted to another department than student {student_id}")]
    DepartmentMismatch { student_id: String, subject_id: String },
    #[error(
        "{component} mark {value} for student {student_id} in subject {subject_id} must be between 0 and {max}"
    )]
    ComponentOutOfRange {
        student_id: String,
        subject_id: String,
        component: MarkComponent,
        value: i32,
        max: i32,
    },
    #[error("GPA {value} for student {student_id} must be between 0 and 5")]
    GpaOutOfRange { student_id: String, value: f64 },
}

/// Validates a marks batch against the loaded exam, students and subjects.
///
/// Returns the number of (student, subject) entries the batch will write.
pub(crate) fn validate_marks_batch(
    batch: &MarksBatch,
    exam: &Exam,
    students: &HashMap<String, Student>,
    subjects: &HashMap<String, Subject>,
    max_students: usize,
) -> Result<usize, MarkPolicyError> {
    if ExamKind::of(&batch.exam_name).terminal().is_some() {
        return Err(MarkPolicyError::TerminalExamMarks(batch.exam_name.clone()));
    }
    check_batch_size(batch.students.len(), max_students)?;

    let mut seen_students = HashSet::new();
    let mut entries = 0;

    for row in &batch.students {
        if !seen_students.insert(row.student_id.as_str()) {
            return Err(MarkPolicyError::DuplicateStudent(row.student_id.clone()));
        }
        let student = students
            .get(&row.student_id)
            .ok_or_else(|| MarkPolicyError::UnknownStudent(row.student_id.clone()))?;
        if student.year != batch.year {
            return Err(MarkPolicyError::StudentYearMismatch {
                student_id: student.id.clone(),
                year: batch.year,
            });
        }
        if !exam.levels.is_empty() && !exam.levels.contains(&student.level) {
            return Err(MarkPolicyError::ExamNotForLevel {
                exam: exam.name.clone(),
                level: student.level,
            });
        }

        let mut seen_subjects = HashSet::new();
        for mark in &row.subject_marks {
            if !seen_subjects.insert(mark.subject_id.as_str()) {
                return Err(MarkPolicyError::DuplicateSubject {
                    student_id: student.id.clone(),
                    subject_id: mark.subject_id.clone(),
                });
            }
            let subject = subjects
                .get(&mark.subject_id)
                .ok_or_else(|| MarkPolicyError::UnknownSubject(mark.subject_id.clone()))?;
            if subject.level != student.level {
                return Err(MarkPolicyError::SubjectLevelMismatch {
                    subject_id: subject.id.clone(),
                    level: student.level,
                });
            }
            if !subject.applies_to(student.department.as_deref()) {
                return Err(MarkPolicyError::DepartmentMismatch {
                    student_id: student.id.clone(),
                    subject_id: subject.id.clone(),
                });
            }

            for (component, value) in [
                (MarkComponent::Cq, mark.cq),
                (MarkComponent::Mcq, mark.mcq),
                (MarkComponent::Practical, mark.practical),
            ] {
                let max = subject.component_max(component);
                if !(0..=max).contains(&value) {
                    return Err(MarkPolicyError::ComponentOutOfRange {
                        student_id: student.id.clone(),
                        subject_id: subject.id.clone(),
                        component,
                        value,
                        max,
                    });
                }
            }
            entries += 1;
        }
    }

    Ok(entries)
}

/// Validates a GPA batch and returns the terminal exam plus the rounded values to store.
pub(crate) fn validate_gpa_batch(
    batch: &GpaBatch,
    students: &HashMap<String, Student>,
    max_students: usize,
) -> Result<(TerminalExam, Vec<(String, Option<f64>)>), MarkPolicyError> {
    let terminal = ExamKind::of(&batch.exam_name)
        .terminal()
        .ok_or_else(|| MarkPolicyError::NotTerminalExam(batch.exam_name.clone()))?;
    check_batch_size(batch.students.len(), max_students)?;

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(batch.students.len());

    for row in &batch.students {
        if !seen.insert(row.student_id.as_str()) {
            return Err(MarkPolicyError::DuplicateStudent(row.student_id.clone()));
        }
        let student = students
            .get(&row.student_id)
            .ok_or_else(|| MarkPolicyError::UnknownStudent(row.student_id.clone()))?;
        if student.level != terminal.level() {
            return Err(MarkPolicyError::ExamNotForLevel {
                exam: terminal.name().to_string(),
                level: student.level,
            });
        }

        let gpa = match row.gpa {
            Some(value) if !value.is_finite() || !(0.0..=GPA_MAX).contains(&value) => {
                return Err(MarkPolicyError::GpaOutOfRange {
                    student_id: student.id.clone(),
                    value,
                });
            }
            Some(value) => Some(round_gpa(value)),
            None => None,
        };
        normalized.push((student.id.clone(), gpa));
    }

    Ok((terminal, normalized))
}

fn check_batch_size(count: usize, limit: usize) -> Result<(), MarkPolicyError> {
    if count == 0 {
        return Err(MarkPolicyError::EmptyBatch);
    }
    if count > limit {
        return Err(MarkPolicyError::TooManyStudents { count, limit });
    }
    Ok(())
}
