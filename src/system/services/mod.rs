pub(crate) mod auto_reset;
