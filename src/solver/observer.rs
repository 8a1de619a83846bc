use std::time::Duration;

/// Per-iteration callback of the outer solver loops. Called once at the top
/// of every iteration, before the convergence check.
pub trait IterationObserver
{
    fn iteration(&mut self, iteration: usize, residual_norm: f64, active_coefficients: usize,
                 elapsed: Duration);
}

/// Discards every notification.
pub struct NullObserver;

impl IterationObserver for NullObserver
{
    fn iteration(&mut self, _iteration: usize, _residual_norm: f64, _active_coefficients: usize,
                 _elapsed: Duration)
    {
    }
}
