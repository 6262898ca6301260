//! Bounded random numbers.

use rand::Rng;

/// Returns a uniformly distributed integer in `min..=max`.
///
/// Reversed bounds are swapped instead of panicking.
pub fn random_int(min: i64, max: i64) -> i64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rand::rng().random_range(low..=high)
}
