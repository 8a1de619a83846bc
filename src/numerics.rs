pub mod cg;
pub mod gauss;
pub mod power_iteration;
