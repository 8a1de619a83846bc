use indexmap::IndexSet;
use nalgebra::DVector;

use crate::basis::base::IntervalBasis;
use crate::coefficients::SparseVector;
use crate::equation::elliptic::EllipticEquation;
use crate::errors::FrameError;
use crate::frame::index::FrameIndex;
use crate::numerics::cg::cg;
use crate::solver::config::SchwarzConfig;

/// Galerkin solve restricted to the active indices of one patch: assembles
/// the dense preconditioned stiffness matrix over the support of `residual`
/// and approximates the correction by conjugate gradients. The index set is
/// sorted, so the local system is independent of hash iteration order.
pub(crate) fn solve_local_system<B: IntervalBasis, const D: usize>(
    equation: &EllipticEquation<'_, B, D>,
    residual: &SparseVector<f64, D>,
    config: &SchwarzConfig,
) -> Result<SparseVector<f64, D>, FrameError>
{
    if residual.is_empty()
    {
        return Ok(SparseVector::new());
    }

    let mut indices: IndexSet<FrameIndex<D>> = residual.indices().copied().collect();
    indices.sort_unstable();

    let a = equation.stiffness_matrix(&indices);
    let b = DVector::from_iterator(indices.len(), indices.iter().map(|index| residual.get(index)));
    let mut x = DVector::zeros(indices.len());
    cg(&a, &b, &mut x, config.cg_tolerance, config.cg_max_iterations)?;

    let mut correction = SparseVector::new();
    for (slot, index) in indices.iter().enumerate()
    {
        correction.set(*index, x[slot]);
    }
    Ok(correction)
}
