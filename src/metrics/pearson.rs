//! Pearson correlation with two-sided significance.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pearson r and its two-sided p-value for paired samples.
///
/// Returns `None` when the correlation is not computable: mismatched or
/// too-short vectors, or zero variance in either sample. The p-value comes
/// from the t-transform `t = r * sqrt((n-2) / (1 - r^2))` against a
/// Student's-t distribution with `n - 2` degrees of freedom.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let mut r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    // Collinear inputs can compute to 1 minus a few ulps; snap so the
    // exact-fit shortcut below fires instead of the t-transform blowing up.
    if (r.abs() - 1.0).abs() < 1e-12 {
        r = r.signum();
    }

    // With two points the fit is exact and carries no evidence.
    if x.len() == 2 {
        return Some((r, 1.0));
    }
    if r.abs() == 1.0 {
        return Some((r, 0.0));
    }

    let df = n - 2.0;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));

    Some((r, p.clamp(0.0, 1.0)))
}
