pub mod aggregated;
pub mod index;
pub mod support;
