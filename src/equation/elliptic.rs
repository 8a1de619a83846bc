use std::sync::OnceLock;

use indexmap::IndexSet;
use log::info;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::basis::base::IntervalBasis;
use crate::bvp::EllipticBvp;
use crate::coefficients::SparseVector;
use crate::equation::compression::CompressionStrategy;
use crate::errors::FrameError;
use crate::frame::aggregated::AggregatedFrame;
use crate::frame::index::FrameIndex;
use crate::frame::support::{in_support, intersect_supports, intersecting_indices};
use crate::numerics::gauss::composite_gauss;
use crate::numerics::power_iteration::{inverse_power_iteration, power_iteration};

/// Coefficients below this magnitude are dropped from the assembled
/// right-hand side.
const RHS_DROP_TOLERANCE: f64 = 1e-15;

/// The frame discretization of the elliptic problem: bilinear form entries
/// by composite Gauss quadrature, the diagonal preconditioner
/// `D(lambda) = sqrt(a(lambda, lambda))` and the preconditioned right-hand
/// side, both precomputed over every enumerated index.
pub struct EllipticEquation<'a, B: IntervalBasis, const D: usize>
{
    bvp: &'a dyn EllipticBvp<D>,
    frame: &'a AggregatedFrame<B, D>,
    n_gauss: usize,
    cross_refinement: usize,
    stiff_diagonal: Vec<f64>,
    fnorm_sqr: f64,
    fnorms_sqr_patch: Vec<f64>,
    fcoeffs: Vec<(FrameIndex<D>, f64)>,
    fcoeffs_patch: Vec<Vec<(FrameIndex<D>, f64)>>,
    norm_a: OnceLock<f64>,
    norm_a_inv: OnceLock<f64>,
}

/// Advances a quadrature multi-index, first direction fastest.
fn advance<const D: usize>(node: &mut [usize; D], lengths: &[usize; D]) -> bool
{
    for d in 0..D
    {
        node[d] += 1;
        if node[d] < lengths[d]
        {
            return true;
        }
        node[d] = 0;
    }
    false
}

impl<'a, B: IntervalBasis, const D: usize> EllipticEquation<'a, B, D>
{
    pub fn new(bvp: &'a dyn EllipticBvp<D>, frame: &'a AggregatedFrame<B, D>) -> Self
    {
        Self::with_quadrature(bvp, frame, 6, 4)
    }

    /// `n_gauss` knots per dyadic cell; cross-patch entries subdivide each
    /// cell into `cross_refinement` parts before applying the rule.
    pub fn with_quadrature(bvp: &'a dyn EllipticBvp<D>, frame: &'a AggregatedFrame<B, D>,
                           n_gauss: usize, cross_refinement: usize) -> Self
    {
        assert!(n_gauss >= 1 && cross_refinement >= 1);
        let mut equation = Self {
            bvp,
            frame,
            n_gauss,
            cross_refinement,
            stiff_diagonal: Vec::new(),
            fnorm_sqr: 0.0,
            fnorms_sqr_patch: Vec::new(),
            fcoeffs: Vec::new(),
            fcoeffs_patch: Vec::new(),
            norm_a: OnceLock::new(),
            norm_a_inv: OnceLock::new(),
        };
        equation.compute_diagonal();
        equation.compute_rhs();
        equation
    }

    #[inline]
    pub fn frame(&self) -> &'a AggregatedFrame<B, D>
    {
        self.frame
    }

    /// Replaces the problem data and rebuilds diagonal and right-hand side.
    pub fn set_bvp(&mut self, bvp: &'a dyn EllipticBvp<D>)
    {
        self.bvp = bvp;
        self.norm_a = OnceLock::new();
        self.norm_a_inv = OnceLock::new();
        self.compute_diagonal();
        self.compute_rhs();
    }

    fn compute_diagonal(&mut self)
    {
        info!("precomputing the stiffness diagonal, {} entries", self.frame.degrees_of_freedom());
        self.stiff_diagonal = self
            .frame
            .indices()
            .par_iter()
            .map(|lambda| self.a(lambda, lambda).sqrt())
            .collect();
    }

    fn compute_rhs(&mut self)
    {
        info!("precomputing the right-hand side, {} integrals", self.frame.degrees_of_freedom());
        let mut fcoeffs: Vec<(FrameIndex<D>, f64)> = self
            .frame
            .indices()
            .par_iter()
            .map(|lambda| (*lambda, self.f(lambda) / self.diagonal(lambda)))
            .filter(|(_, coeff)| coeff.abs() > RHS_DROP_TOLERANCE)
            .collect();
        Self::sort_by_magnitude(&mut fcoeffs);

        let n_p = self.frame.n_p();
        let mut fcoeffs_patch = vec![Vec::new(); n_p];
        for &(index, coeff) in &fcoeffs
        {
            fcoeffs_patch[index.p()].push((index, coeff));
        }

        self.fnorm_sqr = fcoeffs.iter().map(|(_, c)| c * c).sum();
        self.fnorms_sqr_patch = fcoeffs_patch
            .iter()
            .map(|table: &Vec<_>| table.iter().map(|(_, c)| c * c).sum())
            .collect();
        self.fcoeffs = fcoeffs;
        self.fcoeffs_patch = fcoeffs_patch;
    }

    /// Magnitude descending, ties broken by index order.
    fn sort_by_magnitude(table: &mut [(FrameIndex<D>, f64)])
    {
        table.sort_by(|(il, vl), (ir, vr)| {
            vr.abs()
                .partial_cmp(&vl.abs())
                .expect("finite coefficients")
                .then_with(|| il.cmp(ir))
        });
    }

    /// Diagonal preconditioner D(lambda) = sqrt(a(lambda, lambda)).
    #[inline]
    pub fn diagonal(&self, lambda: &FrameIndex<D>) -> f64
    {
        self.stiff_diagonal[self.frame.number(lambda)]
    }

    /// Multiplies every coefficient by D(lambda)^n.
    pub fn rescale(&self, coefficients: &mut SparseVector<f64, D>, n: i32)
    {
        let scaled: Vec<(FrameIndex<D>, f64)> = coefficients
            .iter()
            .map(|(index, value)| (*index, value * self.diagonal(index).powi(n)))
            .collect();
        for (index, value) in scaled
        {
            coefficients.set(index, value);
        }
    }

    /// Bilinear form entry a(lambda, mu) of the unpreconditioned operator.
    pub fn a(&self, lambda: &FrameIndex<D>, mu: &FrameIndex<D>) -> f64
    {
        if lambda.p() == mu.p()
        {
            self.a_same_patch(lambda, mu)
        }
        else
        {
            self.a_cross_patch(lambda, mu)
        }
    }

    /// Both functions live on one chart: pull back to the reference cube and
    /// integrate over the dyadic cells of the support intersection, where the
    /// integrand is smooth.
    fn a_same_patch(&self, lambda: &FrameIndex<D>, mu: &FrameIndex<D>) -> f64
    {
        let support = match intersect_supports(self.frame, lambda, mu)
        {
            Some(support) => support,
            None => return 0.0,
        };

        let p = lambda.p();
        let chart = self.frame.atlas().chart(p);
        let cube = self.frame.cube_basis(p);

        let mut points: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        let mut weights: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        for d in 0..D
        {
            let (x, w) = composite_gauss(self.n_gauss, support.scale, support.a[d], support.b[d], 1);
            points[d] = x;
            weights[d] = w;
        }

        let values_lambda: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube.basis(d).evaluate_batch(0, lambda.j(), lambda.e()[d], lambda.k()[d], &points[d])
        });
        let derivatives_lambda: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube.basis(d).evaluate_batch(1, lambda.j(), lambda.e()[d], lambda.k()[d], &points[d])
        });
        let values_mu: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube.basis(d).evaluate_batch(0, mu.j(), mu.e()[d], mu.k()[d], &points[d])
        });
        let derivatives_mu: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube.basis(d).evaluate_batch(1, mu.j(), mu.e()[d], mu.k()[d], &points[d])
        });

        let lengths: [usize; D] = std::array::from_fn(|d| points[d].len());
        let mut node = [0usize; D];
        let mut r = 0.0;
        loop
        {
            let x: [f64; D] = std::array::from_fn(|d| points[d][node[d]]);
            let x_patch = chart.map_point(&x);
            let gram = chart.gram_factor(&x);

            let mut weight = 1.0;
            let mut psi_lambda = 1.0;
            let mut psi_mu = 1.0;
            for d in 0..D
            {
                weight *= weights[d][node[d]];
                psi_lambda *= values_lambda[d][node[d]];
                psi_mu *= values_mu[d][node[d]];
            }

            if psi_lambda != 0.0 && psi_mu != 0.0
            {
                let a_x = self.bvp.a(&x_patch);
                let mut grad_lambda = [0.0; D];
                let mut grad_mu = [0.0; D];
                for s in 0..D
                {
                    let der_lambda = psi_lambda / values_lambda[s][node[s]] * derivatives_lambda[s][node[s]];
                    let der_mu = psi_mu / values_mu[s][node[s]] * derivatives_mu[s][node[s]];
                    let gram_d = chart.gram_d_factor(s, &x);
                    grad_lambda[s] = a_x * (der_lambda * gram - psi_lambda * gram_d) / (gram * gram);
                    grad_mu[s] = (der_mu * gram - psi_mu * gram_d) / (gram * gram);
                }
                let mut t = 0.0;
                for i in 0..D
                {
                    let mut d1 = 0.0;
                    let mut d2 = 0.0;
                    for l in 0..D
                    {
                        let dk = chart.dkappa_inv(l, i, &x);
                        d1 += grad_lambda[l] * dk;
                        d2 += grad_mu[l] * dk;
                    }
                    t += d1 * d2;
                }
                r += (t * gram * gram + self.bvp.q(&x_patch) * psi_lambda * psi_mu) * weight;
            }

            if !advance(&mut node, &lengths)
            {
                break;
            }
        }
        r
    }

    /// The functions live on different charts. Integrate over the dyadic
    /// cells of the finer support with a `cross_refinement`-times finer
    /// composite rule, mapping every node through both charts; nodes outside
    /// the other support contribute nothing.
    fn a_cross_patch(&self, lambda: &FrameIndex<D>, mu: &FrameIndex<D>) -> f64
    {
        if !self.frame.atlas().adjacent(lambda.p(), mu.p())
            || !self.frame.support_box(lambda).intersects(self.frame.support_box(mu))
        {
            return 0.0;
        }

        // normalize so that lambda carries the finer support scale; equal
        // scales fall back to index order, keeping the form exactly symmetric
        let scale_lambda = self.frame.support(lambda).scale;
        let scale_mu = self.frame.support(mu).scale;
        let (lambda, mu) = if scale_mu > scale_lambda || (scale_mu == scale_lambda && mu < lambda)
        {
            (mu, lambda)
        }
        else
        {
            (lambda, mu)
        };
        let support = self.frame.support(lambda);

        let chart_lambda = self.frame.atlas().chart(lambda.p());
        let chart_mu = self.frame.atlas().chart(mu.p());
        let cube_lambda = self.frame.cube_basis(lambda.p());
        let cube_mu = self.frame.cube_basis(mu.p());

        let mut points: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        let mut weights: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        for d in 0..D
        {
            let (x, w) = composite_gauss(self.n_gauss, support.scale, support.a[d], support.b[d],
                                         self.cross_refinement);
            points[d] = x;
            weights[d] = w;
        }

        let values_lambda: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube_lambda.basis(d).evaluate_batch(0, lambda.j(), lambda.e()[d], lambda.k()[d], &points[d])
        });
        let derivatives_lambda: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube_lambda.basis(d).evaluate_batch(1, lambda.j(), lambda.e()[d], lambda.k()[d], &points[d])
        });

        let lengths: [usize; D] = std::array::from_fn(|d| points[d].len());
        let mut node = [0usize; D];
        let mut r = 0.0;
        loop
        {
            let x: [f64; D] = std::array::from_fn(|d| points[d][node[d]]);
            let x_patch = chart_lambda.map_point(&x);

            if in_support(self.frame, mu, &x_patch)
            {
                let y = chart_mu.map_point_inv(&x_patch);
                let gram_lambda = chart_lambda.gram_factor(&x);
                let gram_mu = chart_mu.gram_factor(&y);

                let values_mu: [f64; D] = std::array::from_fn(|d| {
                    cube_mu.basis(d).evaluate(0, mu.j(), mu.e()[d], mu.k()[d], y[d])
                });

                let mut weight = 1.0;
                let mut psi_lambda = 1.0;
                let mut psi_mu = 1.0;
                for d in 0..D
                {
                    weight *= weights[d][node[d]];
                    psi_lambda *= values_lambda[d][node[d]];
                    psi_mu *= values_mu[d];
                }

                if psi_lambda != 0.0 && psi_mu != 0.0
                {
                    let a_x = self.bvp.a(&x_patch);
                    let mut grad_lambda = [0.0; D];
                    let mut grad_mu = [0.0; D];
                    for s in 0..D
                    {
                        let der_lambda =
                            psi_lambda / values_lambda[s][node[s]] * derivatives_lambda[s][node[s]];
                        let der_mu = psi_mu / values_mu[s]
                            * cube_mu.basis(s).evaluate(1, mu.j(), mu.e()[s], mu.k()[s], y[s]);
                        grad_lambda[s] = a_x
                            * (der_lambda * gram_lambda - psi_lambda * chart_lambda.gram_d_factor(s, &x))
                            / (gram_lambda * gram_lambda);
                        grad_mu[s] = (der_mu * gram_mu - psi_mu * chart_mu.gram_d_factor(s, &y))
                            / (gram_mu * gram_mu);
                    }
                    let mut t = 0.0;
                    for i in 0..D
                    {
                        let mut d1 = 0.0;
                        let mut d2 = 0.0;
                        for l in 0..D
                        {
                            d1 += grad_lambda[l] * chart_lambda.dkappa_inv(l, i, &x);
                            d2 += grad_mu[l] * chart_mu.dkappa_inv(l, i, &y);
                        }
                        t += d1 * d2;
                    }
                    r += (t * gram_lambda * gram_lambda
                        + self.bvp.q(&x_patch) * psi_lambda * (psi_mu / gram_mu) * gram_lambda)
                        * weight;
                }
            }

            if !advance(&mut node, &lengths)
            {
                break;
            }
        }
        r
    }

    /// Right-hand side functional f(lambda) = \int f psi_lambda, computed on
    /// the reference cube with the lifted integrand f(kappa(x)) psi^ref(x) G(x).
    pub fn f(&self, lambda: &FrameIndex<D>) -> f64
    {
        let p = lambda.p();
        let support = self.frame.support(lambda);
        let chart = self.frame.atlas().chart(p);
        let cube = self.frame.cube_basis(p);

        let mut points: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        let mut weights: [Vec<f64>; D] = std::array::from_fn(|_| Vec::new());
        for d in 0..D
        {
            let (x, w) = composite_gauss(self.n_gauss, support.scale, support.a[d], support.b[d], 1);
            points[d] = x;
            weights[d] = w;
        }
        let values: [Vec<f64>; D] = std::array::from_fn(|d| {
            cube.basis(d).evaluate_batch(0, lambda.j(), lambda.e()[d], lambda.k()[d], &points[d])
        });

        let lengths: [usize; D] = std::array::from_fn(|d| points[d].len());
        let mut node = [0usize; D];
        let mut r = 0.0;
        loop
        {
            let x: [f64; D] = std::array::from_fn(|d| points[d][node[d]]);
            let x_patch = chart.map_point(&x);
            let mut share = self.bvp.f(&x_patch) * chart.gram_factor(&x);
            for d in 0..D
            {
                share *= weights[d][node[d]] * values[d][node[d]];
            }
            r += share;
            if !advance(&mut node, &lengths)
            {
                break;
            }
        }
        r
    }

    /// l2 norm of the preconditioned right-hand side.
    #[inline]
    pub fn fnorm(&self) -> f64
    {
        self.fnorm_sqr.sqrt()
    }

    /// The smallest prefix of the magnitude-sorted right-hand side whose
    /// dropped tail has norm at most `eta`. `eta <= 0` returns everything.
    pub fn rhs(&self, eta: f64) -> SparseVector<f64, D>
    {
        Self::truncate(&self.fcoeffs, self.fnorm_sqr, eta)
    }

    /// Patchwise variant of [`Self::rhs`]; a patch with negligible share
    /// yields the empty vector.
    pub fn rhs_patch(&self, p: usize, eta: f64) -> SparseVector<f64, D>
    {
        if self.fnorms_sqr_patch[p] < RHS_DROP_TOLERANCE
        {
            return SparseVector::new();
        }
        Self::truncate(&self.fcoeffs_patch[p], self.fnorms_sqr_patch[p], eta)
    }

    fn truncate(sorted: &[(FrameIndex<D>, f64)], norm_sqr: f64, eta: f64) -> SparseVector<f64, D>
    {
        let mut coeffs = SparseVector::new();
        if eta <= 0.0
        {
            for &(index, value) in sorted
            {
                coeffs.set(index, value);
            }
            return coeffs;
        }
        let bound = norm_sqr - eta * eta;
        if bound <= 0.0
        {
            return coeffs;
        }
        let mut mass = 0.0;
        for &(index, value) in sorted
        {
            coeffs.set(index, value);
            mass += value * value;
            if mass >= bound
            {
                break;
            }
        }
        coeffs
    }

    /// Adds the preconditioned column block of level `j` to `w`:
    /// `w[nu] += a(nu, lambda) / (D(lambda) D(nu)) * factor` over all `nu` on
    /// level `j` retained by the strategy. `j == j0 - 1` addresses the
    /// generators; levels outside `[j0 - 1, jmax]` are contract violations.
    pub fn add_level<S: CompressionStrategy>(&self, lambda: &FrameIndex<D>,
                                             w: &mut SparseVector<f64, D>, j: i32, factor: f64,
                                             strategy: &S)
    {
        let frame = self.frame;
        assert!(j >= frame.j0() - 1 && j <= frame.jmax(),
                "level {j} outside [{}, {}]", frame.j0() - 1, frame.jmax());

        let generators = j == frame.j0() - 1;
        let d_lambda = self.diagonal(lambda);
        for nu in intersecting_indices(frame, lambda, j.max(frame.j0()), generators)
        {
            if !strategy.retains(frame, lambda, &nu, j)
            {
                continue;
            }
            let entry = self.a(&nu, lambda) / (d_lambda * self.diagonal(&nu));
            w.add(nu, entry * factor);
        }
    }

    /// Dense preconditioned stiffness matrix over a finite index set,
    /// `A[r][c] = a(mu_c, lambda_r) / (D(lambda_r) D(mu_c))`. Row blocks are
    /// assembled in parallel; symmetry fills the lower triangle.
    pub fn stiffness_matrix(&self, indices: &IndexSet<FrameIndex<D>>) -> DMatrix<f64>
    {
        let n = indices.len();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|row| {
                let lambda = indices.get_index(row).expect("row in range");
                let d_lambda = self.diagonal(lambda);
                (row..n)
                    .map(|col| {
                        let mu = indices.get_index(col).expect("column in range");
                        self.a(mu, lambda) / (d_lambda * self.diagonal(mu))
                    })
                    .collect()
            })
            .collect();

        let mut a = DMatrix::zeros(n, n);
        for (row, entries) in rows.iter().enumerate()
        {
            for (offset, &value) in entries.iter().enumerate()
            {
                a[(row, row + offset)] = value;
                a[(row + offset, row)] = value;
            }
        }
        a
    }

    /// Indices up to level j0 + 1, the small set the norm estimates use.
    fn coarse_index_set(&self) -> IndexSet<FrameIndex<D>>
    {
        let cap = (self.frame.j0() + 1).min(self.frame.jmax());
        self.frame.indices().iter().filter(|index| index.j() <= cap).copied().collect()
    }

    /// Estimate of the preconditioned operator norm, memoized.
    pub fn norm_a(&self) -> Result<f64, FrameError>
    {
        if let Some(&cached) = self.norm_a.get()
        {
            return Ok(cached);
        }
        let indices = self.coarse_index_set();
        let a = self.stiffness_matrix(&indices);
        let mut x = DVector::from_element(indices.len(), 1.0);
        let estimate = power_iteration(&a, &mut x, 1e-6, 200)?;
        Ok(*self.norm_a.get_or_init(|| estimate))
    }

    /// Estimate of the norm of the inverse, memoized. Meaningful only when
    /// the coarse stiffness matrix is nonsingular.
    pub fn norm_a_inv(&self) -> Result<f64, FrameError>
    {
        if let Some(&cached) = self.norm_a_inv.get()
        {
            return Ok(cached);
        }
        let indices = self.coarse_index_set();
        let a = self.stiffness_matrix(&indices);
        let mut x = DVector::from_element(indices.len(), 1.0);
        let smallest = inverse_power_iteration(&a, &mut x, 1e-6, 200)?;
        Ok(*self.norm_a_inv.get_or_init(|| 1.0 / smallest))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::basis::linear_hat::LinearHatBasis;
    use crate::bvp::ConstantCoefficientBvp;
    use crate::geometry::atlas::Atlas;
    use crate::geometry::chart::AffineChart;
    use approx::assert_relative_eq;

    fn unit_interval_frame(jmax: i32) -> AggregatedFrame<LinearHatBasis, 1>
    {
        let atlas = Atlas::new(vec![Box::new(AffineChart::<1>::scaling([0.0], [1.0]))]);
        AggregatedFrame::new(atlas, &[[[1, 1]]], jmax)
    }

    fn two_patch_frame(jmax: i32) -> AggregatedFrame<LinearHatBasis, 1>
    {
        let atlas = Atlas::new(vec![
            Box::new(AffineChart::<1>::scaling([0.0], [0.7])),
            Box::new(AffineChart::<1>::scaling([0.3], [1.0])),
        ]);
        AggregatedFrame::new(atlas, &[[[1, 1]], [[1, 1]]], jmax)
    }

    #[test]
    fn poisson_diagonal_of_hats_on_the_unit_interval()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        let frame = unit_interval_frame(3);
        let equation = EllipticEquation::new(&bvp, &frame);

        // a hat of level j has a(lambda, lambda) = 2^(2j+1)
        let generator = FrameIndex::<1>::new(0, 1, [0], [1]);
        assert_relative_eq!(equation.a(&generator, &generator), 8.0, epsilon = 1e-10);
        // a wavelet of level j is a hat of level j+1
        let wavelet = FrameIndex::<1>::new(0, 2, [1], [1]);
        assert_relative_eq!(equation.a(&wavelet, &wavelet), 128.0, epsilon = 1e-8);
        assert_relative_eq!(equation.diagonal(&generator), 8.0f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn replacing_the_bvp_rebuilds_the_tables()
    {
        let poisson = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        let helmholtz = ConstantCoefficientBvp::<_, 1>::new(1.0, 5.0, |_x: &[f64; 1]| 1.0);
        let frame = unit_interval_frame(2);
        let mut equation = EllipticEquation::new(&poisson, &frame);

        let generator = FrameIndex::<1>::new(0, 1, [0], [1]);
        let before = equation.diagonal(&generator);
        equation.set_bvp(&helmholtz);
        // the reaction term enlarges a(lambda, lambda)
        assert!(equation.diagonal(&generator) > before);
    }

    #[test]
    fn bilinear_form_is_symmetric()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::new(1.0, 2.0, |x: &[f64; 1]| x[0]);
        let frame = two_patch_frame(3);
        let equation = EllipticEquation::new(&bvp, &frame);

        let same_patch = [
            FrameIndex::<1>::new(0, 1, [0], [1]),
            FrameIndex::<1>::new(0, 2, [1], [0]),
            FrameIndex::<1>::new(0, 3, [1], [3]),
        ];
        for lambda in &same_patch
        {
            for mu in &same_patch
            {
                assert_relative_eq!(equation.a(lambda, mu), equation.a(mu, lambda), epsilon = 1e-12);
            }
        }

        // cross-patch entries with distinct support scales normalize to the
        // same quadrature nodes in both argument orders
        let fine = FrameIndex::<1>::new(0, 3, [1], [6]);
        let coarse = FrameIndex::<1>::new(1, 1, [0], [1]);
        let forward = equation.a(&fine, &coarse);
        assert!(forward.abs() > 0.0);
        assert_relative_eq!(forward, equation.a(&coarse, &fine), epsilon = 1e-12);
    }

    #[test]
    fn preconditioned_stiffness_has_unit_diagonal()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|x: &[f64; 1]| x[0] + 0.5);
        let frame = two_patch_frame(2);
        let equation = EllipticEquation::new(&bvp, &frame);

        let indices: IndexSet<FrameIndex<1>> = frame.indices().iter().copied().collect();
        let a = equation.stiffness_matrix(&indices);
        assert_eq!(a.nrows(), frame.degrees_of_freedom());
        for i in 0..a.nrows()
        {
            assert_relative_eq!(a[(i, i)], 1.0, epsilon = 1e-12);
            for j in 0..a.ncols()
            {
                assert_relative_eq!(a[(i, j)], a[(j, i)], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn rhs_truncation_respects_the_bound()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|x: &[f64; 1]| 1.0 + x[0] * x[0]);
        let frame = two_patch_frame(3);
        let equation = EllipticEquation::new(&bvp, &frame);

        let full = equation.rhs(0.0);
        assert_relative_eq!(full.l2_norm(), equation.fnorm(), epsilon = 1e-12);

        for eta in [1e-4, 0.01, 0.1, equation.fnorm()]
        {
            let truncated = equation.rhs(eta);
            assert!((&full - &truncated).l2_norm() <= eta + 1e-12);
            assert!(truncated.len() <= full.len());
        }

        // patch tables partition the global table
        let by_patch = &equation.rhs_patch(0, 0.0) + &equation.rhs_patch(1, 0.0);
        assert_relative_eq!((&by_patch - &full).l2_norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn rescale_round_trips()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        let frame = two_patch_frame(2);
        let equation = EllipticEquation::new(&bvp, &frame);

        let mut v = equation.rhs(0.0);
        let original = v.clone();
        equation.rescale(&mut v, 1);
        equation.rescale(&mut v, -1);
        assert!((&v - &original).l2_norm() < 1e-12);
    }

    #[test]
    fn operator_norms_are_positive()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        // a single patch keeps the coarse stiffness matrix nonsingular
        let frame = unit_interval_frame(3);
        let equation = EllipticEquation::new(&bvp, &frame);

        let norm_a = equation.norm_a().unwrap();
        let norm_a_inv = equation.norm_a_inv().unwrap();
        assert!(norm_a > 0.0);
        assert!(norm_a_inv > 0.0);
        // memoized second call returns the identical value
        assert_eq!(equation.norm_a().unwrap(), norm_a);
    }

    #[test]
    #[should_panic]
    fn add_level_outside_the_range_is_a_contract_violation()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        let frame = two_patch_frame(2);
        let equation = EllipticEquation::new(&bvp, &frame);
        let mut w = SparseVector::new();
        let lambda = FrameIndex::<1>::new(0, 1, [0], [1]);
        equation.add_level(&lambda, &mut w, 3, 1.0, &crate::equation::compression::Cdd1);
    }
}
