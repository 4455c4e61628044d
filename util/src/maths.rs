//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases, but
/// round-off can give `r == rhs.abs()` when `lhs` is a tiny negative number.
/// Callers wrapping track positions must fold that case back to zero, see
/// [`wrap`].
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap a value into the half-open range `[0, period)`.
pub fn wrap<T>(value: T, period: T) -> T
where
    T: Float
{
    let r = rem_euclid(value, period);
    if r >= period.abs() { T::zero() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(10.0f64, 100.0), 10.0);
        assert_eq!(wrap(110.0f64, 100.0), 10.0);
        assert_eq!(wrap(-10.0f64, 100.0), 90.0);
        assert_eq!(wrap(100.0f64, 100.0), 0.0);
        assert!(wrap(-1e-18f64, 100.0) < 100.0);
    }
}
