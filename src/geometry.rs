pub mod atlas;
pub mod chart;
