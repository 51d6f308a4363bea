//! The marks-entry workflow: filter changes drive roster and table loads, edits stay in
//! memory, and a submission posts the visible set and reloads the table.

use thiserror::Error;

use crate::grading::{ExamKind, MarkComponent};
use crate::schemas::catalog::{Exam, Student, Subject};
use crate::schemas::marks::{BatchResult, GpaBatch, MarksBatch};
use crate::workbench::client::{ApiClient, ClientError};
use crate::workbench::filter::{FilterError, FilterForm};
use crate::workbench::grid::{GpaTable, GridError, MarkTable};
use crate::workbench::roster::{filtered_roster, subjects_for_level, visible_subjects, LoadState};
use crate::workbench::submission::{submission_blocker, SubmissionBlocker};

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("cannot submit: {0}")]
    Blocked(SubmissionBlocker),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message for the user about a load failure or a submission outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

pub struct MarksWorkbench {
    client: ApiClient,
    filter: FilterForm,
    subjects: LoadState<Vec<Subject>>,
    exams: LoadState<Vec<Exam>>,
    roster: LoadState<Vec<Student>>,
    marks: LoadState<MarkTable>,
    gpa: LoadState<GpaTable>,
    notices: Vec<Notice>,
}

impl MarksWorkbench {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            filter: FilterForm::new(),
            subjects: LoadState::NotLoaded,
            exams: LoadState::NotLoaded,
            roster: LoadState::NotLoaded,
            marks: LoadState::NotLoaded,
            gpa: LoadState::NotLoaded,
            notices: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn filter(&self) -> &FilterForm {
        &self.filter
    }

    pub fn subjects(&self) -> &LoadState<Vec<Subject>> {
        &self.subjects
    }

    pub fn exams(&self) -> &LoadState<Vec<Exam>> {
        &self.exams
    }

    pub fn roster(&self) -> &LoadState<Vec<Student>> {
        &self.roster
    }

    pub fn marks(&self) -> &LoadState<MarkTable> {
        &self.marks
    }

    pub fn gpa(&self) -> &LoadState<GpaTable> {
        &self.gpa
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn visible_students(&self) -> Vec<&Student> {
        filtered_roster(loaded_slice(&self.roster), &self.filter)
    }

    pub fn visible_subjects(&self) -> Vec<&Subject> {
        visible_subjects(loaded_slice(&self.subjects), &self.filter)
    }

    pub fn submission_blocker(&self) -> Option<SubmissionBlocker> {
        submission_blocker(
            &self.filter,
            loaded_slice(&self.exams),
            loaded_slice(&self.subjects),
            loaded_slice(&self.roster),
        )
    }

    /// Loads subjects and exams; each failure is kept and reported on its own.
    pub async fn load_catalog(&mut self) {
        let (subjects, exams) = tokio::join!(self.client.get_subjects(), self.client.get_exams());

        self.subjects = match subjects {
            Ok(subjects) => LoadState::Loaded(subjects),
            Err(err) => {
                self.notify_error(format!("Failed to load subjects: {}", err.detail()));
                LoadState::Failed(err.detail())
            }
        };
        self.exams = match exams {
            Ok(exams) => LoadState::Loaded(exams),
            Err(err) => {
                self.notify_error(format!("Failed to load exams: {}", err.detail()));
                LoadState::Failed(err.detail())
            }
        };
    }

    pub async fn set_year(&mut self, year: Option<i32>) {
        if self.filter.set_year(year) {
            self.reload_roster().await;
        }
        self.refresh_table().await;
    }

    pub async fn set_exam_name(&mut self, exam_name: Option<&str>) {
        if self.filter.set_exam_name(exam_name) {
            self.reload_roster().await;
        }
        self.refresh_table().await;
    }

    /// Returns `false` when the class is fixed by the exam, is not one the selected exam is
    /// held for, or did not change.
    pub async fn set_level(&mut self, level: Option<i32>) -> bool {
        let scheduled = self.filter.scheduled_exam(loaded_slice(&self.exams));
        if let (Some(exam), Some(level)) = (scheduled, level) {
            if !exam.is_held_for(level) {
                let message = format!("{} {} is not held for class {level}", exam.name, exam.year);
                self.notify_error(message);
                return false;
            }
        }
        if !self.filter.set_level(level) {
            return false;
        }
        self.reload_roster().await;
        self.refresh_table().await;
        true
    }

    pub async fn set_department(&mut self, department: Option<&str>) {
        self.filter.set_department(department);
        self.refresh_table().await;
    }

    pub async fn set_section(&mut self, section: Option<&str>) {
        self.filter.set_section(section);
        self.refresh_table().await;
    }

    pub async fn select_subject(&mut self, subject_id: Option<&str>) -> Result<(), WorkbenchError> {
        self.filter.select_subject(subject_id, loaded_slice(&self.subjects))?;
        self.refresh_table().await;
        Ok(())
    }

    /// Edits one visible cell; returns the value kept after clamping.
    pub fn edit_mark(
        &mut self,
        student_id: &str,
        subject_id: &str,
        component: MarkComponent,
        raw: &str,
    ) -> Result<i32, WorkbenchError> {
        let students = filtered_roster(loaded_slice(&self.roster), &self.filter);
        let student = students
            .into_iter()
            .find(|student| student.id == student_id)
            .ok_or_else(|| GridError::UnknownStudent(student_id.to_string()))?;
        let subject = visible_subjects(loaded_slice(&self.subjects), &self.filter)
            .into_iter()
            .find(|subject| subject.id == subject_id)
            .ok_or_else(|| GridError::UnknownSubject(subject_id.to_string()))?;
        let table = self.marks.loaded_mut().ok_or(GridError::NotLoaded)?;

        Ok(table.edit(student, subject, component, raw)?)
    }

    /// Edits the GPA of a visible student; returns the text kept.
    pub fn edit_gpa(&mut self, student_id: &str, raw: &str) -> Result<String, WorkbenchError> {
        let student = filtered_roster(loaded_slice(&self.roster), &self.filter)
            .into_iter()
            .find(|student| student.id == student_id)
            .ok_or_else(|| GridError::UnknownStudent(student_id.to_string()))?;
        let table = self.gpa.loaded_mut().ok_or(GridError::NotLoaded)?;

        Ok(table.edit(student, raw)?.to_string())
    }

    /// Posts the visible set as one batch, records the outcome as a notice and reloads the
    /// table whether or not the server accepted it.
    pub async fn submit(&mut self) -> Result<BatchResult, WorkbenchError> {
        if let Some(blocker) = self.submission_blocker() {
            return Err(WorkbenchError::Blocked(blocker));
        }
        let (Some(exam_name), Some(year)) = (self.filter.exam_name(), self.filter.year()) else {
            return Err(WorkbenchError::Blocked(SubmissionBlocker::MissingExam));
        };
        let students = filtered_roster(loaded_slice(&self.roster), &self.filter);

        let result = if self.filter.exam_kind().and_then(ExamKind::terminal).is_some() {
            let table = self.gpa.loaded().ok_or(GridError::NotLoaded)?;
            let batch = GpaBatch::build(exam_name, table, &students);
            self.client.add_gpa(&batch).await
        } else {
            let table = self.marks.loaded().ok_or(GridError::NotLoaded)?;
            let subjects = visible_subjects(loaded_slice(&self.subjects), &self.filter);
            let batch = MarksBatch::build(exam_name, year, table, &students, &subjects);
            self.client.add_marks(&batch).await
        };

        match &result {
            Ok(saved) => self.notify(NoticeKind::Success, saved.message.clone()),
            Err(err) => self.notify_error(err.detail()),
        }
        self.refresh_table().await;

        Ok(result?)
    }

    /// Loads the full class for `(year, level)`; without both the roster is cleared.
    async fn reload_roster(&mut self) {
        self.roster = LoadState::NotLoaded;
        let Some((year, level)) = self.filter.roster_key() else {
            return;
        };

        match self.client.get_students_by_class(year, level).await {
            Ok(students) => self.roster = LoadState::Loaded(students),
            Err(err) => {
                self.notify_error(format!("Failed to load students: {}", err.detail()));
                self.roster = LoadState::Failed(err.detail());
            }
        }
    }

    /// Fetches marks or GPA once exam, year and class are set and someone is visible.
    async fn refresh_table(&mut self) {
        self.marks = LoadState::NotLoaded;
        self.gpa = LoadState::NotLoaded;

        let (Some(kind), Some(year), Some(level)) =
            (self.filter.exam_kind(), self.filter.year(), self.filter.level())
        else {
            return;
        };
        if self.visible_students().is_empty() {
            return;
        }

        match kind.terminal() {
            Some(terminal) => match self.client.get_gpa(year).await {
                Ok(rows) => self.gpa = LoadState::Loaded(GpaTable::hydrate(&rows, terminal)),
                Err(err) => {
                    self.notify_error(format!("Failed to load GPA: {}", err.detail()));
                    self.gpa = LoadState::Failed(err.detail());
                }
            },
            None => {
                let exam_name = self.filter.exam_name().unwrap_or_default().to_string();
                match self.client.get_class_marks(level, year, &exam_name).await {
                    Ok(rows) => {
                        let students = filtered_roster(loaded_slice(&self.roster), &self.filter);
                        let subjects = subjects_for_level(loaded_slice(&self.subjects), level);
                        let table = MarkTable::hydrate(&rows, &students, &subjects);
                        self.marks = LoadState::Loaded(table);
                    }
                    Err(err) => {
                        self.notify_error(format!("Failed to load marks: {}", err.detail()));
                        self.marks = LoadState::Failed(err.detail());
                    }
                }
            }
        }
    }

    fn notify(&mut self, kind: NoticeKind, message: String) {
        match kind {
            NoticeKind::Success => tracing::info!(%message, "Workbench notice"),
            NoticeKind::Error => tracing::warn!(%message, "Workbench notice"),
        }
        self.notices.push(Notice { kind, message });
    }

    fn notify_error(&mut self, message: String) {
        self.notify(NoticeKind::Error, message);
    }
}

fn loaded_slice<T>(state: &LoadState<Vec<T>>) -> &[T] {
    state.loaded().map(Vec::as_slice).unwrap_or_default()
}
