//! Marks-entry workflow used by teachers: pick a class and exam, edit marks or GPA in a grid,
//! and submit the visible rows as one batch.
//!
//! [`MarksWorkbench`] ties the pieces together over an [`ApiClient`]; the filter, roster,
//! grid and submission helpers are plain functions and types that can be used on their own.

mod client;
mod filter;
mod grid;
mod roster;
mod session;
mod submission;

#[cfg(test)]
mod test_server;

pub use client::{ApiClient, ClientError, Session};
pub use filter::{FilterError, FilterForm};
pub use grid::{GpaTable, GridError, MarkEntry, MarkTable};
pub use roster::{
    filtered_roster, subject_applies_to, subjects_for_level, visible_subjects, LoadState,
};
pub use session::{MarksWorkbench, Notice, NoticeKind, WorkbenchError};
pub use submission::{submission_blocker, SubmissionBlocker};
