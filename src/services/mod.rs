pub(crate) mod mark_policy;
