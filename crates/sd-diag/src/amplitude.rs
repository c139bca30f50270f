//! Amplitude extraction.

use sd_format::Field;

/// Half the peak-to-trough spread of one spatial sample.
///
/// Any non-finite value makes the amplitude infinite, so a blown-up row
/// always reads as larger than every finite threshold.
pub fn amplitude_of(row: &[f64]) -> f64 {
    if row.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }
    let (lo, hi) = row
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if row.is_empty() { 0.0 } else { (hi - lo) / 2.0 }
}

/// One amplitude per observed row.
pub fn amplitude_series(field: &Field) -> Vec<f64> {
    field.observed().map(amplitude_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_spread() {
        assert_eq!(amplitude_of(&[-1.0, 0.0, 1.0]), 1.0);
        assert_eq!(amplitude_of(&[2.0, 2.0]), 0.0);
        assert_eq!(amplitude_of(&[]), 0.0);
    }

    #[test]
    fn non_finite_row_is_infinite() {
        assert_eq!(amplitude_of(&[0.0, f64::NAN]), f64::INFINITY);
    }

    #[test]
    fn series_skips_unobserved_rows() {
        let field = Field::from_rows(2, &[vec![1.0, -1.0], vec![0.5, -0.5]]).unwrap();
        assert_eq!(amplitude_series(&field), vec![1.0, 0.5]);
    }
}
