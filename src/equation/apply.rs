use crate::basis::base::IntervalBasis;
use crate::coefficients::SparseVector;
use crate::equation::compression::CompressionStrategy;
use crate::equation::elliptic::EllipticEquation;

/// Approximates the action of the preconditioned operator on `v`: the input
/// is coarsened to accuracy/2, then every retained entry contributes its
/// compressed column over the whole enumerated level range. `accuracy <= 0`
/// applies the operator without coarsening.
pub fn apply<B: IntervalBasis, S: CompressionStrategy, const D: usize>(
    equation: &EllipticEquation<'_, B, D>,
    v: &SparseVector<f64, D>,
    accuracy: f64,
    strategy: &S,
) -> SparseVector<f64, D>
{
    let frame = equation.frame();
    let retained = v.coarsen(accuracy / 2.0);
    let mut w = SparseVector::new();
    for (lambda, &coefficient) in retained.iter()
    {
        for j in frame.j0() - 1..=frame.jmax()
        {
            equation.add_level(lambda, &mut w, j, coefficient, strategy);
        }
    }
    w
}

/// [`apply`] followed by coarsening of the result to the same accuracy.
pub fn apply_coarse<B: IntervalBasis, S: CompressionStrategy, const D: usize>(
    equation: &EllipticEquation<'_, B, D>,
    v: &SparseVector<f64, D>,
    accuracy: f64,
    strategy: &S,
) -> SparseVector<f64, D>
{
    apply(equation, v, accuracy, strategy).coarsen(accuracy)
}
