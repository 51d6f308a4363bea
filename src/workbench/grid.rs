//! In-memory mark and GPA tables edited cell by cell before submission.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::grading::{MarkComponent, TerminalExam, GPA_MAX};
use crate::schemas::catalog::{Student, Subject};
use crate::schemas::marks::{StudentWithGpa, StudentWithMarks};
use crate::workbench::roster::subject_applies_to;

/// Longest mark input kept; marks never need more than three digits.
const MARK_INPUT_CHARS: usize = 3;
const GPA_FRACTION_DIGITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("{subject} is not taken by students of the {department} department")]
    SubjectNotApplicable { subject: String, department: String },
    #[error("'{0}' is not a GPA")]
    InvalidGpa(String),
    #[error("no table is loaded for the current filter")]
    NotLoaded,
    #[error("student {0} is not in the current class")]
    UnknownStudent(String),
    #[error("subject {0} is not in the current class")]
    UnknownSubject(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkEntry {
    pub cq: i32,
    pub mcq: i32,
    pub practical: i32,
}

impl MarkEntry {
    pub fn get(&self, component: MarkComponent) -> i32 {
        match component {
            MarkComponent::Cq => self.cq,
            MarkComponent::Mcq => self.mcq,
            MarkComponent::Practical => self.practical,
        }
    }

    fn set(&mut self, component: MarkComponent, value: i32) {
        match component {
            MarkComponent::Cq => self.cq = value,
            MarkComponent::Mcq => self.mcq = value,
            MarkComponent::Practical => self.practical = value,
        }
    }
}

/// Component marks keyed by student id, then subject id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkTable {
    entries: BTreeMap<String, BTreeMap<String, MarkEntry>>,
}

impl MarkTable {
    /// Every student crossed with every subject; cells without a recorded mark start at zero.
    pub fn hydrate(fetched: &[StudentWithMarks], students: &[&Student], subjects: &[&Subject]) -> Self {
        let recorded: BTreeMap<(&str, &str), MarkEntry> = fetched
            .iter()
            .flat_map(|row| {
                row.marks.iter().map(move |mark| {
                    (
                        (row.id.as_str(), mark.subject_id.as_str()),
                        MarkEntry { cq: mark.cq, mcq: mark.mcq, practical: mark.practical },
                    )
                })
            })
            .collect();

        let entries = students
            .iter()
            .map(|student| {
                let row = subjects
                    .iter()
                    .map(|subject| {
                        let entry = recorded
                            .get(&(student.id.as_str(), subject.id.as_str()))
                            .copied()
                            .unwrap_or_default();
                        (subject.id.clone(), entry)
                    })
                    .collect();
                (student.id.clone(), row)
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, student_id: &str, subject_id: &str) -> Option<&MarkEntry> {
        self.entries.get(student_id)?.get(subject_id)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores one component and returns the value actually kept.
    ///
    /// Only the first three characters count; blank or unparsable input is 0, and the result
    /// is clamped to the subject's maximum for the component. Other cells are left untouched.
    pub fn edit(
        &mut self,
        student: &Student,
        subject: &Subject,
        component: MarkComponent,
        raw: &str,
    ) -> Result<i32, GridError> {
        if !subject_applies_to(subject, student) {
            return Err(GridError::SubjectNotApplicable {
                subject: subject.name.clone(),
                department: student.department.clone().unwrap_or_else(|| "general".to_string()),
            });
        }

        let value = clamp_mark(raw, subject.component_max(component));
        self.entries
            .entry(student.id.clone())
            .or_default()
            .entry(subject.id.clone())
            .or_default()
            .set(component, value);
        Ok(value)
    }
}

fn clamp_mark(raw: &str, max: i32) -> i32 {
    let truncated: String = raw.trim().chars().take(MARK_INPUT_CHARS).collect();
    truncated.parse::<i32>().unwrap_or(0).clamp(0, max.max(0))
}

/// GPA input per student id, kept as typed text so partial input like "4." survives editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpaTable {
    entries: BTreeMap<String, String>,
}

impl GpaTable {
    pub fn hydrate(fetched: &[StudentWithGpa], exam: TerminalExam) -> Self {
        let entries = fetched
            .iter()
            .map(|row| {
                let value = match exam {
                    TerminalExam::Jsc => row.jsc_gpa,
                    TerminalExam::Ssc => row.ssc_gpa,
                };
                (row.id.clone(), value.map(|gpa| gpa.to_string()).unwrap_or_default())
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, student_id: &str) -> Option<&str> {
        self.entries.get(student_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores the GPA text for a student and returns what was kept.
    ///
    /// Values above 5 become "5.00" and extra fractional digits are cut. Negative input is
    /// kept as typed; the server refuses it on submission.
    pub fn edit(&mut self, student: &Student, raw: &str) -> Result<&str, GridError> {
        let value = normalize_gpa(raw)?;
        let slot = self.entries.entry(student.id.clone()).or_default();
        *slot = value;
        Ok(slot.as_str())
    }
}

fn normalize_gpa(raw: &str) -> Result<String, GridError> {
    let input = raw.trim();
    if input.is_empty() {
        return Ok(String::new());
    }

    let digits = input.strip_prefix('-').unwrap_or(input);
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
        && digits != ".";
    let value = input.parse::<f64>().ok().filter(|_| well_formed);
    let Some(value) = value else {
        return Err(GridError::InvalidGpa(input.to_string()));
    };

    if value > GPA_MAX {
        return Ok(format!("{GPA_MAX:.2}"));
    }

    Ok(match input.split_once('.') {
        Some((whole, fraction)) if fraction.len() > GPA_FRACTION_DIGITS => {
            format!("{whole}.{}", &fraction[..GPA_FRACTION_DIGITS])
        }
        _ => input.to_string(),
    })
}
