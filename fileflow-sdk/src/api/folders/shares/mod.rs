pub(crate) mod respond;
