pub(crate) mod arbitration;
pub(crate) mod evaluator;
pub(crate) mod opts;
pub(crate) mod service;
pub(crate) mod services;
