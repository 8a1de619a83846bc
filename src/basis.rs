pub mod base;
pub mod cube;
pub mod linear_hat;
