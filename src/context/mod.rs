pub(crate) mod arena;
#[allow(clippy::module_inception)]
pub(crate) mod context;
pub(crate) mod stack;
