//! Divergence weighting for the PTCI composite score.

use crate::{Error, Result};

/// Default weight range: divergence rescales into `[1.0, 1.1]`, so the most
/// diverged pair that still correlates gets a 10% bonus.
pub const W_MIN_DEFAULT: f64 = 1.0;
pub const W_MAX_DEFAULT: f64 = 1.1;

/// Linearly rescale divergence `d` from `[d_min, d_max]` onto
/// `[w_min, w_max]`.
///
/// A `d` outside the declared range is a domain error — the divergence map
/// and the edge data disagree, which must surface rather than silently skew
/// the score. A degenerate range (`d_min == d_max`) maps to `w_max`.
pub fn divergence_weight(d: f64, d_min: f64, d_max: f64, w_min: f64, w_max: f64) -> Result<f64> {
    if d < d_min || d > d_max {
        return Err(Error::Domain(format!(
            "divergence {d} outside declared range [{d_min}, {d_max}]"
        )));
    }
    if d_min == d_max {
        return Ok(w_max);
    }
    Ok(w_min + (d - d_min) / (d_max - d_min) * (w_max - w_min))
}
