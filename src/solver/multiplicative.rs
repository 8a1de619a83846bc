use std::time::Instant;

use log::info;

use crate::basis::base::IntervalBasis;
use crate::coefficients::SparseVector;
use crate::equation::apply::apply;
use crate::equation::compression::CompressionStrategy;
use crate::equation::elliptic::EllipticEquation;
use crate::errors::FrameError;
use crate::solver::config::SchwarzConfig;
use crate::solver::local::solve_local_system;
use crate::solver::observer::IterationObserver;
use crate::solver::{SolveResult, SolveState};

/// Multiplicative Schwarz iteration: patches are visited one at a time, each
/// correction is computed against the residual of the latest global iterate
/// and applied with a fixed relaxation weight.
pub fn multiplicative_schwarz_solve<B, S, O, const D: usize>(
    equation: &EllipticEquation<'_, B, D>,
    epsilon: f64,
    strategy: &S,
    config: &SchwarzConfig,
    observer: &mut O,
) -> Result<SolveResult<D>, FrameError>
where
    B: IntervalBasis,
    S: CompressionStrategy,
    O: IterationObserver,
{
    assert!(epsilon > 0.0, "target accuracy must be positive");
    assert!(config.relaxation > 0.0);

    let n_patches = equation.frame().n_p();
    let f = equation.rhs(0.0);

    let mut u = SparseVector::new();
    let mut best = SparseVector::new();
    let mut best_norm = f64::INFINITY;
    let mut eta = config.eta;
    let start = Instant::now();

    for iteration in 0..config.max_iterations
    {
        let residual_exact = &f - &apply(equation, &u, 0.0, strategy);
        let residual_norm = residual_exact.l2_norm();
        observer.iteration(iteration, residual_norm, u.len(), start.elapsed());
        info!("multiplicative Schwarz iteration {iteration}: residual {residual_norm:.3e}, {} active coefficients",
              u.len());

        if residual_norm < best_norm
        {
            best_norm = residual_norm;
            best = u.clone();
        }
        if residual_norm <= epsilon
        {
            return Ok(SolveResult {
                solution: u,
                state: SolveState::Converged,
                iterations: iteration,
                residual_norm,
            });
        }

        let eta_k = eta.min(0.5 * residual_norm);
        for p in 0..n_patches
        {
            // residual of the latest iterate, restricted to this patch
            let residual = (&f - &apply(equation, &u, 0.0, strategy))
                .coarsen(eta_k)
                .restrict_to_patch(p);
            let correction = solve_local_system(equation, &residual, config)?;
            u.axpy(config.relaxation, &correction);
        }
        eta *= config.eta_shrink;
    }

    Ok(SolveResult {
        solution: best,
        state: SolveState::IterationLimitReached,
        iterations: config.max_iterations,
        residual_norm: best_norm,
    })
}
