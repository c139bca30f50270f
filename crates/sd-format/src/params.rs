//! Typed parameter record.

use core::fmt;

use sd_core::is_integral;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{FormatError, FormatResult};

/// Name of the derived output-row count.
pub const NT_OUT: &str = "nt_out";

/// A single parameter value, typed by the shape of the parsed number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Real(f64),
}

impl ParamValue {
    /// Classify a float: integral values become `Int`.
    pub fn classify(v: f64) -> Self {
        if is_integral(v) {
            Self::Int(v as i64)
        } else {
            Self::Real(v)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Real(v) => *v,
        }
    }

    /// Integer view; `None` for fractional values.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Real(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered mapping from field name to typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Add `nt_out = 1 + nt div write_every` when both inputs are usable.
    pub fn derive_nt_out(&mut self) {
        let nt = self.get("nt").and_then(|v| v.as_int());
        let write_every = self.get("write_every").and_then(|v| v.as_int());
        if let (Some(nt), Some(we)) = (nt, write_every)
            && nt >= 0
            && we > 0
        {
            self.insert(NT_OUT, ParamValue::Int(1 + nt / we));
        }
    }

    fn require(&self, name: &str) -> FormatResult<ParamValue> {
        self.get(name).ok_or_else(|| FormatError::MissingParameter {
            name: name.to_string(),
        })
    }

    fn require_count(&self, name: &str) -> FormatResult<usize> {
        let value = self.require(name)?;
        let v = value.as_int().ok_or_else(|| FormatError::SchemaMismatch {
            what: format!("{name} must be an integer, got {value}"),
        })?;
        usize::try_from(v).map_err(|_| FormatError::InvalidParameter {
            name: name.to_string(),
            what: format!("must be non-negative, got {v}"),
        })
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Validated view of the fields that grid and time reconstruction need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunParams {
    pub nx: usize,
    pub nt: usize,
    pub dt: f64,
    pub write_every: usize,
    pub nt_out: usize,
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub dx: Option<f64>,
}

impl RunParams {
    /// Validate eagerly; bounds stay optional since explicit grids don't need them.
    pub fn from_params(params: &ParameterSet) -> FormatResult<Self> {
        let nx = params.require_count("nx")?;
        let nt = params.require_count("nt")?;
        let write_every = params.require_count("write_every")?;
        let dt = params.require("dt")?.as_f64();

        if nx == 0 {
            return Err(FormatError::InvalidParameter {
                name: "nx".to_string(),
                what: "must be positive".to_string(),
            });
        }
        if write_every == 0 {
            return Err(FormatError::InvalidParameter {
                name: "write_every".to_string(),
                what: "must be positive".to_string(),
            });
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FormatError::InvalidParameter {
                name: "dt".to_string(),
                what: format!("must be finite and positive, got {dt}"),
            });
        }

        Ok(Self {
            nx,
            nt,
            dt,
            write_every,
            nt_out: 1 + nt / write_every,
            min_x: params.get_f64("min_x"),
            max_x: params.get_f64("max_x"),
            dx: params.get_f64("dx"),
        })
    }

    /// Simulated time between two written samples.
    pub fn output_interval(&self) -> f64 {
        self.dt * self.write_every as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heat_params() -> ParameterSet {
        let mut p = ParameterSet::new();
        for (name, v) in [
            ("nu", 0.01),
            ("nx", 4.0),
            ("nt", 16.0),
            ("min_x", 0.0),
            ("max_x", 1.0),
            ("dx", 0.25),
            ("dt", 0.1),
            ("write_every", 4.0),
        ] {
            p.insert(name, ParamValue::classify(v));
        }
        p.derive_nt_out();
        p
    }

    #[test]
    fn classify_by_value_shape() {
        assert_eq!(ParamValue::classify(128.0), ParamValue::Int(128));
        assert_eq!(ParamValue::classify(1e3), ParamValue::Int(1000));
        assert_eq!(ParamValue::classify(-2.0), ParamValue::Int(-2));
        assert_eq!(ParamValue::classify(0.5), ParamValue::Real(0.5));
        assert_eq!(ParamValue::classify(2f64.powi(63)), ParamValue::Real(2f64.powi(63)));
    }

    #[test]
    fn nt_out_is_derived() {
        let p = heat_params();
        assert_eq!(p.get(NT_OUT), Some(ParamValue::Int(5)));
    }

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut p = ParameterSet::new();
        p.insert("a", ParamValue::Int(1));
        p.insert("b", ParamValue::Int(2));
        p.insert("a", ParamValue::Real(0.5));
        let names: Vec<_> = p.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(p.get_f64("a"), Some(0.5));
    }

    #[test]
    fn run_params_from_heat() {
        let run = RunParams::from_params(&heat_params()).unwrap();
        assert_eq!(run.nx, 4);
        assert_eq!(run.nt_out, 5);
        assert_eq!(run.min_x, Some(0.0));
        assert!((run.output_interval() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn run_params_missing_dt() {
        let mut p = ParameterSet::new();
        p.insert("nx", ParamValue::Int(4));
        p.insert("nt", ParamValue::Int(4));
        p.insert("write_every", ParamValue::Int(1));
        let err = RunParams::from_params(&p).unwrap_err();
        assert!(matches!(err, FormatError::MissingParameter { ref name } if name == "dt"));
    }

    #[test]
    fn run_params_rejects_fractional_nx() {
        let mut p = heat_params();
        p.insert("nx", ParamValue::Real(4.5));
        let err = RunParams::from_params(&p).unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }

    #[test]
    fn run_params_rejects_zero_write_every() {
        let mut p = heat_params();
        p.insert("write_every", ParamValue::Int(0));
        let err = RunParams::from_params(&p).unwrap_err();
        assert!(matches!(err, FormatError::InvalidParameter { ref name, .. } if name == "write_every"));
    }
}
