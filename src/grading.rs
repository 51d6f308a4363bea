//! Grading rules shared by the HTTP API and the marks workbench.

use std::fmt;

use crate::schemas::catalog::{Exam, Subject};

/// Upper bound of the GPA scale.
pub const GPA_MAX: f64 = 5.0;

/// Exams graded with a single GPA instead of per-subject component marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalExam {
    Jsc,
    Ssc,
}

impl TerminalExam {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jsc => "JSC",
            Self::Ssc => "SSC",
        }
    }

    /// Class level that sits the exam.
    pub fn level(self) -> i32 {
        match self {
            Self::Jsc => 8,
            Self::Ssc => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExamKind {
    Standard,
    Terminal(TerminalExam),
}

impl ExamKind {
    pub fn of(exam_name: &str) -> Self {
        let name = exam_name.trim();
        if name.eq_ignore_ascii_case("JSC") {
            Self::Terminal(TerminalExam::Jsc)
        } else if name.eq_ignore_ascii_case("SSC") {
            Self::Terminal(TerminalExam::Ssc)
        } else {
            Self::Standard
        }
    }

    pub fn terminal(self) -> Option<TerminalExam> {
        match self {
            Self::Terminal(exam) => Some(exam),
            Self::Standard => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkComponent {
    Cq,
    Mcq,
    Practical,
}

impl MarkComponent {
    pub const ALL: [MarkComponent; 3] = [Self::Cq, Self::Mcq, Self::Practical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cq => "cq",
            Self::Mcq => "mcq",
            Self::Practical => "practical",
        }
    }
}

impl fmt::Display for MarkComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Subject {
    /// Configured maximum for a component; an unset maximum means the component is not graded.
    pub fn component_max(&self, component: MarkComponent) -> i32 {
        let configured = match component {
            MarkComponent::Cq => self.cq_mark,
            MarkComponent::Mcq => self.mcq_mark,
            MarkComponent::Practical => self.practical_mark,
        };
        configured.unwrap_or(0).max(0)
    }

    /// A subject can receive marks only with a positive full mark and at least one graded component.
    pub fn is_gradable(&self) -> bool {
        self.full_mark > 0 && MarkComponent::ALL.iter().any(|c| self.component_max(*c) > 0)
    }

    /// General subjects apply to everyone; department subjects only to that department.
    pub fn applies_to(&self, department: Option<&str>) -> bool {
        match self.department.as_deref() {
            None => true,
            Some(required) => department == Some(required),
        }
    }
}

impl Exam {
    /// An exam without configured levels is held for every class.
    pub fn is_held_for(&self, level: i32) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }
}

pub fn round_gpa(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
