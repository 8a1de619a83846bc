/// Dyadic support of a one-dimensional frame function:
/// the interval [a, b] * 2^-scale.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IntervalSupport
{
    pub scale: i32,
    pub a: i32,
    pub b: i32,
}

impl IntervalSupport
{
    #[inline]
    pub fn lower(&self) -> f64
    {
        self.a as f64 / (1u64 << self.scale) as f64
    }

    #[inline]
    pub fn upper(&self) -> f64
    {
        self.b as f64 / (1u64 << self.scale) as f64
    }
}

/// One-dimensional basis on the reference interval [0,1], split into
/// generators (type 0) and wavelets (type 1) per level.
///
/// Concrete biorthogonal families live outside this crate; implementations
/// only need to answer evaluate/support/range queries. Boundary conditions
/// are fixed at construction, one order per interval end.
pub trait IntervalBasis: Sync
{
    /// Constructs the basis with the given Dirichlet orders at 0 and 1
    /// (0 = free end).
    fn with_bc(bc_left: u8, bc_right: u8) -> Self
    where
        Self: Sized;

    /// Coarsest admissible level.
    fn j0(&self) -> i32;

    /// Smallest generator translation on level `j`.
    fn delta_min(&self, j: i32) -> i32;

    /// Largest generator translation on level `j`.
    fn delta_max(&self, j: i32) -> i32;

    /// Smallest wavelet translation on level `j`.
    fn nabla_min(&self, j: i32) -> i32;

    /// Largest wavelet translation on level `j`.
    fn nabla_max(&self, j: i32) -> i32;

    /// Translation range for type `e` on level `j`.
    fn k_range(&self, j: i32, e: u8) -> (i32, i32)
    {
        if e == 0 { (self.delta_min(j), self.delta_max(j)) } else { (self.nabla_min(j), self.nabla_max(j)) }
    }

    /// Point value of the function (derivative 0) or its first derivative
    /// (derivative 1) for index (j, e, k) at `x`.
    fn evaluate(&self, derivative: u8, j: i32, e: u8, k: i32, x: f64) -> f64;

    /// Point values at many points at once.
    fn evaluate_batch(&self, derivative: u8, j: i32, e: u8, k: i32, points: &[f64]) -> Vec<f64>
    {
        points.iter().map(|&x| self.evaluate(derivative, j, e, k, x)).collect()
    }

    /// Dyadic support of the function with index (j, e, k).
    fn support(&self, j: i32, e: u8, k: i32) -> IntervalSupport;

    /// Inclusive range of translations k on level `j` of type `e` whose
    /// support intersects the given interval, or None.
    fn intersecting_range(&self, j: i32, e: u8, support: &IntervalSupport) -> Option<(i32, i32)>
    {
        let (k_min, k_max) = self.k_range(j, e);
        let lo = support.lower();
        let hi = support.upper();
        let mut first = None;
        let mut last = None;
        for k in k_min..=k_max
        {
            let s = self.support(j, e, k);
            if s.lower() < hi && lo < s.upper()
            {
                if first.is_none()
                {
                    first = Some(k);
                }
                last = Some(k);
            }
        }
        first.map(|f| (f, last.unwrap()))
    }
}
