//! Natural cubic spline interpolation

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A natural cubic spline through a set of knots with strictly increasing `x`.
///
/// Segment `i` is `y = a[i] + b[i] dx + c[i] dx^2 + d[i] dx^3` with `dx = x - x[i]`. The second
/// derivative is zero at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("Knot vectors have different lengths ({x} x values, {y} y values)")]
    LengthMismatch { x: usize, y: usize },

    #[error("A spline needs at least 2 knots, got {0}")]
    TooFewKnots(usize),

    #[error("Knot {0} is not finite")]
    NonFinite(usize),

    #[error("Knot {0} does not have a greater x than the knot before it")]
    NotIncreasing(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the knots `(x[i], y[i])`.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }

        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewKnots(n));
        }

        for i in 0..n {
            if !x[i].is_finite() || !y[i].is_finite() {
                return Err(SplineError::NonFinite(i));
            }
            if i > 0 && x[i] <= x[i - 1] {
                return Err(SplineError::NotIncreasing(i));
            }
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();

        // Solve the tridiagonal system for c, the ends are fixed at zero
        let mut l = vec![1.0; n];
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];

        for i in 1..n - 1 {
            let alpha = 3.0 * ((a[i + 1] - a[i]) / h[i] - (a[i] - a[i - 1]) / h[i - 1]);

            l[i] = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l[i];
            z[i] = (alpha - h[i - 1] * z[i - 1]) / l[i];
        }

        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];

        for j in (0..n - 1).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (a[j + 1] - a[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }

        Ok(Self {
            x: x.to_vec(),
            a,
            b,
            c,
            d,
        })
    }

    /// The range of `x` covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside of the domain the end segments are extended.
    pub fn eval(&self, x: f64) -> f64 {
        let i = self
            .x
            .partition_point(|&xi| xi <= x)
            .saturating_sub(1)
            .min(self.x.len() - 2);

        let dx = x - self.x[i];
        self.a[i] + dx * (self.b[i] + dx * (self.c[i] + dx * self.d[i]))
    }
}
