pub(crate) mod blend_stack;
pub(crate) mod evaluator;
pub(crate) mod instance;
