pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod marks;
pub(crate) mod router;
