use serde::{Deserialize, Serialize};

/// Tuning knobs of the Schwarz iterations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchwarzConfig
{
    /// Initial coarsening tolerance for the residual.
    pub eta: f64,
    /// Multiplicative shrink of the coarsening tolerance per outer iteration.
    pub eta_shrink: f64,
    /// Residual tolerance of the local conjugate gradient solves.
    pub cg_tolerance: f64,
    /// Iteration cap of the local conjugate gradient solves.
    pub cg_max_iterations: usize,
    /// Outer iteration cap.
    pub max_iterations: usize,
    /// Step length used when the computed one is not a positive finite number.
    pub fallback_step: f64,
    /// Upper clamp for the computed step length.
    pub max_step: f64,
    /// Relaxation weight of the multiplicative sweep.
    pub relaxation: f64,
}

impl Default for SchwarzConfig
{
    fn default() -> Self
    {
        Self {
            eta: 2.0,
            eta_shrink: 0.85,
            cg_tolerance: 1e-4,
            cg_max_iterations: 300,
            max_iterations: 100,
            fallback_step: 0.19,
            max_step: 4.0,
            relaxation: 0.5,
        }
    }
}
