use serde::{Deserialize, Serialize};

use crate::coefficients::SparseVector;

pub mod additive;
pub mod config;
pub mod local;
pub mod multiplicative;
pub mod observer;

/// Why the outer iteration stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveState
{
    Converged,
    IterationLimitReached,
}

/// Outcome of a Schwarz solve: the preconditioned frame coefficients of the
/// approximate solution plus iteration statistics. When the iteration cap is
/// hit, `solution` holds the iterate with the smallest observed residual.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveResult<const D: usize>
{
    pub solution: SparseVector<f64, D>,
    pub state: SolveState,
    pub iterations: usize,
    pub residual_norm: f64,
}
