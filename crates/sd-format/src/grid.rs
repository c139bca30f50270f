//! Spatial grid and time axis reconstruction.
//!
//! Pure derivations from [`RunParams`], shared by every schema layout.

use serde::Serialize;

use crate::error::{FormatError, FormatResult};
use crate::params::RunParams;

/// Spatial coordinates, one per field column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    values: Vec<f64>,
    explicit: bool,
}

impl Grid {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the coordinates were read from the file rather than generated.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

/// Sample times, one per field row.
///
/// The axis is defined for all `nt_out` rows, but only the times of rows
/// actually read are stored, so a header promising a huge run costs nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAxis {
    interval: f64,
    nominal_len: usize,
    samples: Vec<f64>,
}

impl TimeAxis {
    /// Nominal number of rows, `nt_out`.
    pub fn len(&self) -> usize {
        self.nominal_len
    }

    pub fn is_empty(&self) -> bool {
        self.nominal_len == 0
    }

    /// Store the times of the leading `rows` rows (clamped to `nt_out`).
    pub(crate) fn record(&mut self, rows: usize) {
        let rows = rows.min(self.nominal_len);
        let interval = self.interval;
        let start = self.samples.len();
        self.samples.extend((start..rows).map(|i| i as f64 * interval));
    }

    /// Stored leading times, at most `n` of them.
    pub fn head(&self, n: usize) -> &[f64] {
        &self.samples[..n.min(self.samples.len())]
    }
}

/// `nx` evenly spaced points over `[min_x, max_x)`.
pub fn implicit_grid(min_x: f64, max_x: f64, nx: usize) -> FormatResult<Grid> {
    if !min_x.is_finite() || !max_x.is_finite() || max_x <= min_x {
        return Err(FormatError::InvalidParameter {
            name: "max_x".to_string(),
            what: format!("domain [{min_x}, {max_x}) is empty or non-finite"),
        });
    }
    let spacing = (max_x - min_x) / nx as f64;
    Ok(Grid {
        values: (0..nx).map(|j| min_x + j as f64 * spacing).collect(),
        explicit: false,
    })
}

/// Wrap a literal coordinate row, checking its length against `nx`.
pub fn explicit_grid(values: Vec<f64>, nx: usize, line: usize) -> FormatResult<Grid> {
    if values.len() != nx {
        return Err(FormatError::MalformedRow {
            section: "grid".to_string(),
            row: 0,
            line,
            expected: nx,
            found: values.len(),
        });
    }
    Ok(Grid {
        values,
        explicit: true,
    })
}

/// `t[i] = i * dt * write_every` for `i in 0..nt_out`, nothing stored yet.
pub fn time_axis(dt: f64, write_every: usize, nt_out: usize) -> TimeAxis {
    axis_with_interval(dt * write_every as f64, nt_out)
}

fn axis_with_interval(interval: f64, nominal_len: usize) -> TimeAxis {
    TimeAxis {
        interval,
        nominal_len,
        samples: Vec::new(),
    }
}

/// Build the grid (implicit unless one was read) and the time axis.
pub fn reconstruct(run: &RunParams, explicit: Option<Grid>) -> FormatResult<(Grid, TimeAxis)> {
    let grid = match explicit {
        Some(grid) => grid,
        None => {
            let min_x = run.min_x.ok_or_else(|| FormatError::MissingParameter {
                name: "min_x".to_string(),
            })?;
            let max_x = run.max_x.ok_or_else(|| FormatError::MissingParameter {
                name: "max_x".to_string(),
            })?;
            implicit_grid(min_x, max_x, run.nx)?
        }
    };
    Ok((grid, axis_with_interval(run.output_interval(), run.nt_out)))
}
