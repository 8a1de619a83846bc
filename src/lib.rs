//! Adaptive wavelet-frame discretization and Schwarz domain-decomposition
//! solvers for second-order elliptic boundary value problems.
//!
//! The domain is covered by overlapping patches, each parametrized by a
//! chart from the reference cube ([`geometry`]). Lifting a tensor-product
//! wavelet basis ([`basis`]) onto every patch yields a redundant aggregated
//! frame ([`frame`]). The elliptic problem ([`bvp`]) is discretized into a
//! diagonally preconditioned biinfinite system ([`equation`]) whose
//! compressed application feeds the adaptive additive and multiplicative
//! Schwarz iterations ([`solver`]).

pub mod basis;
pub mod bvp;
pub mod coefficients;
pub mod equation;
pub mod errors;
pub mod frame;
pub mod geometry;
pub mod numerics;
pub mod solver;
