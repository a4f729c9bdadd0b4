pub(crate) mod archive;
pub(crate) mod asset;
pub(crate) mod combined;
pub(crate) mod node;
pub(crate) mod nodes;
pub(crate) mod operation;
pub(crate) mod transition;
