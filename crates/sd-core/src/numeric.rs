use crate::CoreError;

/// Floating point type used throughout the workspace
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Median of a set of finite values.
///
/// Even-length inputs average the two middle values.
pub fn median(values: &[Real]) -> Result<Real, CoreError> {
    if values.is_empty() {
        return Err(CoreError::Empty { what: "median" });
    }
    let mut sorted = Vec::with_capacity(values.len());
    for &v in values {
        sorted.push(ensure_finite(v, "median input")?);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Ok(sorted[mid])
    }
}

/// `true` when `v` has no fractional part and fits in an `i64`.
///
/// `i64::MAX as f64` rounds up to 2^63, which does not fit, so the upper
/// bound is exclusive.
pub fn is_integral(v: Real) -> bool {
    v.is_finite() && v == v.trunc() && v >= i64::MIN as Real && v < i64::MAX as Real
}
