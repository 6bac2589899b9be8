//! Point Calculation
//!
//! Incorrect answers earn nothing. A correct answer earns the configured base
//! points, or one and a half times that (rounded half-up) when the word came
//! from the user's difficult words pool.

use crate::types::{POOL_BONUS_DENOMINATOR, POOL_BONUS_NUMERATOR};

/// Points awarded for one attempt.
pub fn points(is_correct: bool, base_points: u32, bonus: bool) -> u32 {
    if !is_correct {
        return 0;
    }
    if bonus {
        bonus_points(base_points)
    } else {
        base_points
    }
}

/// `round(base * 1.5)` with half-up rounding, in integer arithmetic.
fn bonus_points(base_points: u32) -> u32 {
    let scaled = u64::from(base_points) * u64::from(POOL_BONUS_NUMERATOR);
    let rounded = (2 * scaled + u64::from(POOL_BONUS_DENOMINATOR)) / (2 * u64::from(POOL_BONUS_DENOMINATOR));
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
