//! Fixed Gauss-Legendre node/weight tables on [-1,1], up to ten knots.

pub const MAX_GAUSS_KNOTS: usize = 10;

const GAUSS_POINTS: [&[f64]; MAX_GAUSS_KNOTS] =
[
    &[0.0],
    &[-0.5773502691896257, 0.5773502691896257],
    &[-0.7745966692414834, 0.0, 0.7745966692414834],
    &[-0.8611363115940526, -0.3399810435848563, 0.3399810435848563, 0.8611363115940526],
    &[-0.9061798459386640, -0.5384693101056831, 0.0, 0.5384693101056831, 0.9061798459386640],
    &[-0.9324695142031521, -0.6612093864662645, -0.2386191860831969,
       0.2386191860831969, 0.6612093864662645, 0.9324695142031521],
    &[-0.9491079123427585, -0.7415311855993945, -0.4058451513773972, 0.0,
       0.4058451513773972, 0.7415311855993945, 0.9491079123427585],
    &[-0.9602898564975363, -0.7966664774136267, -0.5255324099163290, -0.1834346424956498,
       0.1834346424956498, 0.5255324099163290, 0.7966664774136267, 0.9602898564975363],
    &[-0.9681602395076261, -0.8360311073266358, -0.6133714327005904, -0.3242534234038089, 0.0,
       0.3242534234038089, 0.6133714327005904, 0.8360311073266358, 0.9681602395076261],
    &[-0.9739065285171717, -0.8650633666889845, -0.6794095682990244, -0.4333953941292472,
      -0.1488743389816312, 0.1488743389816312, 0.4333953941292472, 0.6794095682990244,
       0.8650633666889845, 0.9739065285171717],
];

const GAUSS_WEIGHTS: [&[f64]; MAX_GAUSS_KNOTS] =
[
    &[2.0],
    &[1.0, 1.0],
    &[0.5555555555555556, 0.8888888888888888, 0.5555555555555556],
    &[0.3478548451374538, 0.6521451548625461, 0.6521451548625461, 0.3478548451374538],
    &[0.2369268850561891, 0.4786286704993665, 0.5688888888888889,
      0.4786286704993665, 0.2369268850561891],
    &[0.1713244923791704, 0.3607615730481386, 0.4679139345726910,
      0.4679139345726910, 0.3607615730481386, 0.1713244923791704],
    &[0.1294849661688697, 0.2797053914892766, 0.3818300505051189, 0.4179591836734694,
      0.3818300505051189, 0.2797053914892766, 0.1294849661688697],
    &[0.1012285362903763, 0.2223810344533745, 0.3137066458778873, 0.3626837833783620,
      0.3626837833783620, 0.3137066458778873, 0.2223810344533745, 0.1012285362903763],
    &[0.0812743883615744, 0.1806481606948574, 0.2606106964029354, 0.3123470770400029,
      0.3302393550012598, 0.3123470770400029, 0.2606106964029354, 0.1806481606948574,
      0.0812743883615744],
    &[0.0666713443086881, 0.1494513491505806, 0.2190863625159820, 0.2692667193099963,
      0.2955242247147529, 0.2955242247147529, 0.2692667193099963, 0.2190863625159820,
      0.1494513491505806, 0.0666713443086881],
];

/// Nodes of the `n`-knot Gauss-Legendre rule on [-1,1], `1 <= n <= 10`.
#[inline]
pub fn gauss_points(n: usize) -> &'static [f64]
{
    GAUSS_POINTS[n - 1]
}

/// Weights of the `n`-knot Gauss-Legendre rule on [-1,1], `1 <= n <= 10`.
#[inline]
pub fn gauss_weights(n: usize) -> &'static [f64]
{
    GAUSS_WEIGHTS[n - 1]
}

/// Composite rule on the dyadic cells `[a,b) * 2^-scale`, optionally
/// subdividing each cell into `refine` equal parts. Returns (points, weights).
pub fn composite_gauss(n: usize, scale: i32, a: i32, b: i32, refine: usize) -> (Vec<f64>, Vec<f64>)
{
    let h = 1.0 / (1u64 << scale) as f64;
    let cells = (b - a) as usize;
    let mut points = Vec::with_capacity(n * cells * refine);
    let mut weights = Vec::with_capacity(n * cells * refine);
    let xs = gauss_points(n);
    let ws = gauss_weights(n);
    for cell in a..b
    {
        for m in 0..refine
        {
            for i in 0..n
            {
                // map [-1,1] onto the m-th subcell of [cell, cell+1] * 2^-scale
                points.push(h * ((xs[i] + 1.0 + 2.0 * m as f64) / (2.0 * refine as f64) + cell as f64));
                weights.push(h * ws[i] / (2.0 * refine as f64));
            }
        }
    }
    (points, weights)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polynomial_exactness()
    {
        // n knots integrate polynomials up to degree 2n-1 exactly on [-1,1]
        for n in 1..=MAX_GAUSS_KNOTS
        {
            for degree in 0..2 * n
            {
                let exact = if degree % 2 == 0 { 2.0 / (degree as f64 + 1.0) } else { 0.0 };
                let approx: f64 = gauss_points(n)
                    .iter()
                    .zip(gauss_weights(n))
                    .map(|(x, w)| w * x.powi(degree as i32))
                    .sum();
                assert_relative_eq!(approx, exact, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn weights_sum_to_interval_length()
    {
        for n in 1..=MAX_GAUSS_KNOTS
        {
            let sum: f64 = gauss_weights(n).iter().sum();
            assert_relative_eq!(sum, 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn composite_rule_integrates_over_dyadic_cells()
    {
        // integrate x^2 over [1/4, 3/4] = cells 1..3 at scale 2
        let (points, weights) = composite_gauss(4, 2, 1, 3, 1);
        let value: f64 = points.iter().zip(&weights).map(|(x, w)| w * x * x).sum();
        let exact = (0.75f64.powi(3) - 0.25f64.powi(3)) / 3.0;
        assert_relative_eq!(value, exact, epsilon = 1e-12);

        // refining the cells must not change the value
        let (points, weights) = composite_gauss(4, 2, 1, 3, 4);
        let refined: f64 = points.iter().zip(&weights).map(|(x, w)| w * x * x).sum();
        assert_relative_eq!(refined, exact, epsilon = 1e-12);
    }
}
