pub(crate) mod allocation;
pub(crate) mod evaluation_result;
pub(crate) mod joints;
pub(crate) mod pose;
pub(crate) mod post_process;
pub(crate) mod table;
