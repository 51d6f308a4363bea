pub(crate) mod exams;
pub(crate) mod marks;
pub(crate) mod refresh_tokens;
pub(crate) mod students;
pub(crate) mod subjects;
pub(crate) mod users;
