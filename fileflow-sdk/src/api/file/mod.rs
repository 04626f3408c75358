pub(crate) mod share;
