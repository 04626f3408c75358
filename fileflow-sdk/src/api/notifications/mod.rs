pub(crate) mod all;
