//! Input validation helpers.
//!
//! Standardizes validation across the crate using `!is_finite()` to reject
//! NaN, +Inf, and -Inf uniformly.

use crate::error::SurfaceError;

/// Validate that a value is strictly positive and finite (rejects NaN, Inf, zero, negatives).
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SurfaceError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that a value is non-negative and finite (rejects NaN, Inf, negatives).
pub(crate) fn validate_non_negative(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(SurfaceError::InvalidInput {
            message: format!("{name} must be non-negative and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate a `[lo, hi]` band: both ends finite and `lo < hi`.
pub(crate) fn validate_band(band: (f64, f64), name: &str) -> crate::error::Result<(f64, f64)> {
    let (lo, hi) = band;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(SurfaceError::InvalidInput {
            message: format!("{name} must be a finite band with lo < hi, got [{lo}, {hi}]"),
        });
    }
    Ok(band)
}

/// Validate that a count is at least `min`.
pub(crate) fn validate_at_least(value: usize, min: usize, name: &str) -> crate::error::Result<usize> {
    if value < min {
        return Err(SurfaceError::InvalidInput {
            message: format!("{name} must be at least {min}, got {value}"),
        });
    }
    Ok(value)
}
