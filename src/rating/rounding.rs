//! Conversion of engine floats into stored integer ratings
//!
//! Both helpers round half to even. A player's new rating is always
//! `old + round_delta(delta)`, which keeps `new == old + change` exact for
//! every history row.

use crate::error::{LadderError, Result};
use crate::types::Rating;

/// Round a fractional rating delta to the stored integer change
pub fn round_delta(delta: f64) -> Rating {
    delta.round_ties_even() as Rating
}

/// Round a fractional rating (such as a team average) for storage
pub fn round_rating(rating: f64) -> Rating {
    rating.round_ties_even() as Rating
}

/// Apply a fractional delta to a stored rating, returning `(new_rating, change)`.
/// Fails when the delta is not finite or the result leaves the `i64` range.
pub fn apply_delta(old_rating: Rating, delta: f64) -> Result<(Rating, Rating)> {
    let out_of_range = || LadderError::validation(format!(
        "rating change {} on rating {} is out of range",
        delta, old_rating
    ));

    // `as` saturates; anything at or past the i64 bounds is not a real change
    if !delta.is_finite() || delta.abs() >= i64::MAX as f64 {
        return Err(out_of_range().into());
    }

    let change = round_delta(delta);
    let new_rating = old_rating.checked_add(change).ok_or_else(out_of_range)?;
    Ok((new_rating, change))
}
