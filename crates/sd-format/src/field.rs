//! Time-by-space field storage and the parsed dataset.

use serde::Serialize;

use crate::error::{FormatError, FormatResult};
use crate::grid::{Grid, TimeAxis};
use crate::params::{ParameterSet, RunParams};

/// Row-major `nominal_rows x nx` matrix; row `i` is the field at sample `i`.
///
/// Only observed rows are stored. Rows past `observed_rows` were never
/// written by the simulator and read back as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    nx: usize,
    nominal_rows: usize,
    observed_rows: usize,
    data: Vec<f64>,
    blank: Vec<f64>,
}

// Rows reserved up front; a header can promise far more than the file holds.
const RESERVE_ROWS: usize = 1024;

impl Field {
    /// Empty field expecting up to `nominal_rows` samples of width `nx`.
    pub fn with_nominal_rows(nominal_rows: usize, nx: usize) -> Self {
        let reserve = nominal_rows
            .min(RESERVE_ROWS)
            .checked_mul(nx)
            .unwrap_or(0);
        Self {
            nx,
            nominal_rows,
            observed_rows: 0,
            data: Vec::with_capacity(reserve),
            blank: vec![0.0; nx],
        }
    }

    /// Fully observed field from explicit rows.
    pub fn from_rows(nx: usize, rows: &[Vec<f64>]) -> FormatResult<Self> {
        let mut field = Self::with_nominal_rows(rows.len(), nx);
        for (i, row) in rows.iter().enumerate() {
            field.push_row(row, i + 1)?;
        }
        Ok(field)
    }

    /// Store the next observed row.
    pub(crate) fn push_row(&mut self, values: &[f64], line: usize) -> FormatResult<()> {
        let row = self.observed_rows;
        if values.len() != self.nx {
            return Err(FormatError::MalformedRow {
                section: "body".to_string(),
                row,
                line,
                expected: self.nx,
                found: values.len(),
            });
        }
        if row >= self.nominal_rows {
            return Err(FormatError::InvalidParameter {
                name: "nt_out".to_string(),
                what: format!("row {row} at line {line} exceeds {} rows", self.nominal_rows),
            });
        }
        self.data.extend_from_slice(values);
        self.observed_rows += 1;
        Ok(())
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn nominal_rows(&self) -> usize {
        self.nominal_rows
    }

    pub fn observed_rows(&self) -> usize {
        self.observed_rows
    }

    pub fn is_truncated(&self) -> bool {
        self.observed_rows < self.nominal_rows
    }

    /// Any row within the nominal shape, observed or not.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i < self.observed_rows {
            Some(&self.data[i * self.nx..(i + 1) * self.nx])
        } else {
            (i < self.nominal_rows).then_some(self.blank.as_slice())
        }
    }

    /// Observed rows in time order.
    pub fn observed(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.nx.max(1))
    }

    /// History of spatial point `j` over the first `rows` observed samples.
    pub fn column(&self, j: usize, rows: usize) -> Option<Vec<f64>> {
        (j < self.nx).then(|| self.observed().take(rows).map(|row| row[j]).collect())
    }
}

/// Named static arrays stored ahead of the time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuxData {
    arrays: Vec<(String, Vec<f64>)>,
}

impl AuxData {
    pub(crate) fn push(&mut self, name: String, values: Vec<f64>) {
        self.arrays.push((name, values));
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.arrays
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

/// Everything recovered from one output file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub params: ParameterSet,
    pub run: RunParams,
    pub grid: Grid,
    pub time: TimeAxis,
    pub field: Field,
    pub aux: AuxData,
}

impl Dataset {
    /// Times of the observed rows only.
    pub fn observed_time(&self) -> &[f64] {
        self.time.head(self.field.observed_rows())
    }
}
