use crate::schemas::catalog::{Student, Subject};
use crate::workbench::filter::FilterForm;

/// Result of a fetch the workbench depends on.
///
/// `Failed` is kept apart from an empty `Loaded` so a failed roster is not shown as an
/// empty class.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    NotLoaded,
    Loaded(T),
    Failed(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::NotLoaded
    }
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Students visible under the filter: the selected section, narrowed to the department when
/// one is set, ordered by roll. No section means nobody is visible.
pub fn filtered_roster<'a>(students: &'a [Student], filter: &FilterForm) -> Vec<&'a Student> {
    let Some(section) = filter.section() else {
        return Vec::new();
    };

    let mut visible: Vec<&Student> = students
        .iter()
        .filter(|student| student.section == section)
        .filter(|student| match filter.department() {
            Some(department) => student.department.as_deref() == Some(department),
            None => true,
        })
        .collect();
    visible.sort_by_key(|student| student.roll);
    visible
}

pub fn subjects_for_level(subjects: &[Subject], level: i32) -> Vec<&Subject> {
    subjects.iter().filter(|subject| subject.level == level).collect()
}

/// Columns of the grid: the selected subject alone, otherwise every subject of the class
/// that is general or belongs to the filtered department.
pub fn visible_subjects<'a>(subjects: &'a [Subject], filter: &FilterForm) -> Vec<&'a Subject> {
    if let Some(selected) = filter.subject_id() {
        return subjects.iter().filter(|subject| subject.id == selected).collect();
    }
    let Some(level) = filter.level() else {
        return Vec::new();
    };

    subjects_for_level(subjects, level)
        .into_iter()
        .filter(|subject| match filter.department() {
            Some(department) => subject.applies_to(Some(department)),
            None => true,
        })
        .collect()
}

pub fn subject_applies_to(subject: &Subject, student: &Student) -> bool {
    subject.applies_to(student.department.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, roll: i32, section: &str, department: Option<&str>) -> Student {
        Student {
            id: id.to_string(),
            name: id.to_string(),
            roll,
            level: 9,
            section: section.to_string(),
            department: department.map(str::to_string),
            year: 2025,
        }
    }

    fn subject(id: &str, level: i32, department: Option<&str>) -> Subject {
        Subject {
            id: id.to_string(),
            name: id.to_string(),
            level,
            department: department.map(str::to_string),
            cq_mark: Some(50),
            mcq_mark: None,
            practical_mark: None,
            full_mark: 50,
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student("s3", 3, "A", Some("Science")),
            student("s1", 1, "A", Some("Arts")),
            student("s2", 2, "A", Some("Science")),
            student("b1", 1, "B", Some("Science")),
        ]
    }

    fn filter(section: Option<&str>, department: Option<&str>) -> FilterForm {
        let mut filter = FilterForm::new();
        filter.set_year(Some(2025));
        filter.set_exam_name(Some("Annual"));
        filter.set_level(Some(9));
        filter.set_department(department);
        filter.set_section(section);
        filter
    }

    #[test]
    fn roster_is_filtered_by_section_and_sorted_by_roll() {
        let students = roster();
        let visible = filtered_roster(&students, &filter(Some("A"), None));

        let ids: Vec<&str> = visible.iter().map(|student| student.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn department_narrows_the_roster() {
        let students = roster();
        let visible = filtered_roster(&students, &filter(Some("A"), Some("Science")));

        let ids: Vec<&str> = visible.iter().map(|student| student.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s3"]);
        assert!(visible.iter().all(|student| students.iter().any(|s| s.id == student.id)));
    }

    #[test]
    fn no_section_means_no_students() {
        let students = roster();
        assert!(filtered_roster(&students, &filter(None, Some("Science"))).is_empty());
    }

    #[test]
    fn visible_subjects_follow_department_and_selection() {
        let subjects = vec![
            subject("bangla", 9, None),
            subject("physics", 9, Some("Science")),
            subject("history", 9, Some("Arts")),
            subject("bangla-10", 10, None),
        ];

        let all = visible_subjects(&subjects, &filter(Some("A"), None));
        assert_eq!(all.len(), 3);

        let science = visible_subjects(&subjects, &filter(Some("A"), Some("Science")));
        let ids: Vec<&str> = science.iter().map(|subject| subject.id.as_str()).collect();
        assert_eq!(ids, vec!["bangla", "physics"]);

        let mut selected = filter(Some("A"), None);
        selected.select_subject(Some("history"), &subjects).unwrap();
        let only = visible_subjects(&subjects, &selected);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, "history");
    }

    #[test]
    fn department_subject_applies_only_to_its_students() {
        let physics = subject("physics", 9, Some("Science"));
        assert!(subject_applies_to(&physics, &student("s", 1, "A", Some("Science"))));
        assert!(!subject_applies_to(&physics, &student("a", 1, "A", Some("Arts"))));
        assert!(subject_applies_to(&subject("bangla", 9, None), &student("g", 1, "A", None)));
    }

    #[test]
    fn load_state_distinguishes_failure_from_empty() {
        let empty: LoadState<Vec<Student>> = LoadState::Loaded(Vec::new());
        let failed: LoadState<Vec<Student>> = LoadState::Failed("offline".to_string());

        assert!(empty.is_loaded());
        assert_eq!(empty.loaded().map(Vec::len), Some(0));
        assert!(failed.is_failed());
        assert!(failed.loaded().is_none());
        assert_eq!(LoadState::<Vec<Student>>::default(), LoadState::NotLoaded);
    }
}
