use thiserror::Error;

use crate::grading::ExamKind;
use crate::schemas::catalog::{Exam, Subject};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("select a class before choosing a subject")]
    NoLevel,
    #[error("subject {0} does not exist")]
    UnknownSubject(String),
    #[error("subject {subject} is not taught in class {level}")]
    WrongLevel { subject: String, level: i32 },
}

/// The filter tuple that scopes everything the workbench shows and submits.
///
/// Fields are only changed through the setters so the cross-field rules hold: a terminal
/// exam pins the class, and a selected subject always belongs to the selected class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForm {
    year: Option<i32>,
    exam_name: Option<String>,
    level: Option<i32>,
    department: Option<String>,
    section: Option<String>,
    subject: Option<Subject>,
}

impl FilterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn exam_name(&self) -> Option<&str> {
        self.exam_name.as_deref()
    }

    pub fn exam_kind(&self) -> Option<ExamKind> {
        self.exam_name.as_deref().map(ExamKind::of)
    }

    pub fn level(&self) -> Option<i32> {
        self.level
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject.as_ref().map(|subject| subject.id.as_str())
    }

    /// The catalog entry for the selected exam in the selected year.
    pub fn scheduled_exam<'a>(&self, exams: &'a [Exam]) -> Option<&'a Exam> {
        let (name, year) = (self.exam_name.as_deref()?, self.year?);
        exams.iter().find(|exam| exam.name == name && exam.year == year)
    }

    /// `(year, level)` once both are known; the roster is keyed by it.
    pub fn roster_key(&self) -> Option<(i32, i32)> {
        Some((self.year?, self.level?))
    }

    /// Returns `true` when the roster key changed.
    pub fn set_year(&mut self, year: Option<i32>) -> bool {
        let changed = self.year != year;
        self.year = year;
        changed
    }

    /// Resets class, department, section and subject. Terminal exams pin the class.
    ///
    /// Returns `true` when the class changed.
    pub fn set_exam_name(&mut self, exam_name: Option<&str>) -> bool {
        let previous_level = self.level;

        self.exam_name = non_blank(exam_name);
        self.level = self
            .exam_kind()
            .and_then(ExamKind::terminal)
            .map(|terminal| terminal.level());
        self.department = None;
        self.section = None;
        self.subject = None;

        previous_level != self.level
    }

    /// Returns `true` when the roster has to be reloaded.
    ///
    /// The class of a terminal exam is fixed; other values are ignored.
    pub fn set_level(&mut self, level: Option<i32>) -> bool {
        if let Some(terminal) = self.exam_kind().and_then(ExamKind::terminal) {
            if level != Some(terminal.level()) {
                tracing::debug!(requested = ?level, exam = terminal.name(), "class is fixed by exam");
                return false;
            }
        }
        if self.level == level {
            return false;
        }

        self.level = level;
        if self.subject.as_ref().is_some_and(|subject| Some(subject.level) != level) {
            self.subject = None;
        }
        true
    }

    /// A department that excludes the selected subject also clears the subject.
    pub fn set_department(&mut self, department: Option<&str>) {
        self.department = non_blank(department);
        let excluded = self.subject.as_ref().is_some_and(|subject| {
            subject.department.is_some() && subject.department != self.department
        });
        if excluded {
            self.subject = None;
        }
    }

    pub fn set_section(&mut self, section: Option<&str>) {
        self.section = non_blank(section);
    }

    /// Selects one subject of the current class, or clears the selection with `None`.
    ///
    /// A department-scoped subject sets the department filter to its department; a general
    /// subject clears it.
    pub fn select_subject(
        &mut self,
        subject_id: Option<&str>,
        subjects: &[Subject],
    ) -> Result<(), FilterError> {
        let Some(subject_id) = subject_id.filter(|id| !id.trim().is_empty()) else {
            self.subject = None;
            return Ok(());
        };
        let level = self.level.ok_or(FilterError::NoLevel)?;
        let subject = subjects
            .iter()
            .find(|subject| subject.id == subject_id)
            .ok_or_else(|| FilterError::UnknownSubject(subject_id.to_string()))?;
        if subject.level != level {
            return Err(FilterError::WrongLevel { subject: subject.name.clone(), level });
        }

        self.department = subject.department.clone();
        self.subject = Some(subject.clone());
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(id: &str, level: i32, department: Option<&str>) -> Subject {
        Subject {
            id: id.to_string(),
            name: id.to_string(),
            level,
            department: department.map(str::to_string),
            cq_mark: Some(40),
            mcq_mark: Some(30),
            practical_mark: None,
            full_mark: 100,
        }
    }

    fn standard_filter() -> FilterForm {
        let mut filter = FilterForm::new();
        filter.set_year(Some(2025));
        filter.set_exam_name(Some("Half Yearly"));
        filter.set_level(Some(9));
        filter.set_department(Some("Arts"));
        filter.set_section(Some("A"));
        filter
    }

    #[test]
    fn switching_to_ssc_pins_class_and_clears_the_rest() {
        let subjects = vec![subject("bangla-9", 9, None)];
        let mut filter = standard_filter();
        filter.select_subject(Some("bangla-9"), &subjects).unwrap();

        let level_changed = filter.set_exam_name(Some("SSC"));

        assert!(level_changed);
        assert_eq!(filter.level(), Some(10));
        assert_eq!(filter.department(), None);
        assert_eq!(filter.section(), None);
        assert_eq!(filter.subject_id(), None);
        assert_eq!(filter.year(), Some(2025));
    }

    #[test]
    fn switching_to_standard_exam_clears_class() {
        let mut filter = FilterForm::new();
        filter.set_exam_name(Some("JSC"));
        assert_eq!(filter.level(), Some(8));

        assert!(filter.set_exam_name(Some("Annual")));
        assert_eq!(filter.level(), None);
        assert!(!filter.set_exam_name(Some("Test 1")));
    }

    #[test]
    fn terminal_exam_class_cannot_be_changed() {
        let mut filter = FilterForm::new();
        filter.set_exam_name(Some("jsc"));

        assert!(!filter.set_level(Some(9)));
        assert_eq!(filter.level(), Some(8));
    }

    #[test]
    fn selecting_department_subject_sets_department() {
        let subjects = vec![subject("physics-9", 9, Some("Science")), subject("bangla-9", 9, None)];
        let mut filter = standard_filter();

        filter.select_subject(Some("physics-9"), &subjects).unwrap();
        assert_eq!(filter.department(), Some("Science"));

        filter.select_subject(Some("bangla-9"), &subjects).unwrap();
        assert_eq!(filter.department(), None);

        filter.select_subject(None, &subjects).unwrap();
        assert_eq!(filter.subject_id(), None);
    }

    #[test]
    fn only_subjects_of_the_class_are_selectable() {
        let subjects = vec![subject("physics-10", 10, Some("Science"))];
        let mut filter = standard_filter();

        assert_eq!(
            filter.select_subject(Some("physics-10"), &subjects),
            Err(FilterError::WrongLevel { subject: "physics-10".to_string(), level: 9 })
        );
        assert_eq!(
            filter.select_subject(Some("missing"), &subjects),
            Err(FilterError::UnknownSubject("missing".to_string()))
        );

        let mut no_class = FilterForm::new();
        assert_eq!(no_class.select_subject(Some("physics-10"), &subjects), Err(FilterError::NoLevel));
    }

    #[test]
    fn changing_class_drops_subject_of_other_class() {
        let subjects = vec![subject("bangla-9", 9, None)];
        let mut filter = standard_filter();
        filter.select_subject(Some("bangla-9"), &subjects).unwrap();

        assert!(filter.set_level(Some(7)));
        assert_eq!(filter.subject_id(), None);
        assert!(!filter.set_level(Some(7)));
    }

    #[test]
    fn other_department_clears_department_subject() {
        let subjects = vec![subject("physics-9", 9, Some("Science"))];
        let mut filter = standard_filter();
        filter.select_subject(Some("physics-9"), &subjects).unwrap();

        filter.set_department(Some("Arts"));

        assert_eq!(filter.subject_id(), None);
        assert_eq!(filter.department(), Some("Arts"));
    }

    #[test]
    fn blank_inputs_are_unset() {
        let mut filter = FilterForm::new();
        filter.set_section(Some("  "));
        filter.set_exam_name(Some(""));

        assert_eq!(filter.section(), None);
        assert_eq!(filter.exam_name(), None);
        assert_eq!(filter.roster_key(), None);
    }

    #[test]
    fn scheduled_exam_matches_name_and_year() {
        let exams = vec![
            Exam { id: "e1".to_string(), name: "Half Yearly".to_string(), year: 2024, levels: vec![8] },
            Exam { id: "e2".to_string(), name: "Half Yearly".to_string(), year: 2025, levels: vec![9] },
        ];
        let mut filter = FilterForm::new();
        filter.set_exam_name(Some("Half Yearly"));
        assert_eq!(filter.scheduled_exam(&exams), None);

        filter.set_year(Some(2025));
        assert_eq!(filter.scheduled_exam(&exams).map(|exam| exam.id.as_str()), Some("e2"));

        filter.set_year(Some(2023));
        assert_eq!(filter.scheduled_exam(&exams), None);
    }
}
