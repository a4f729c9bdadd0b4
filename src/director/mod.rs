#[allow(clippy::module_inception)]
pub(crate) mod director;
pub(crate) mod priority_queue;
pub(crate) mod registry;
pub(crate) mod request;
pub(crate) mod single_rig;
