pub(crate) mod aim_solver;
