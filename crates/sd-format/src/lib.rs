//! sd-format: simulator output format.
//!
//! Parses the space-delimited text stream written by the PDE simulators into
//! a [`Dataset`]: the typed parameter record, the spatial grid, the time axis,
//! the time-by-space field and any static auxiliary arrays.
//!
//! Format drift (field order/count differing between simulators and versions)
//! is handled by caller-supplied [`ParamSchema`]s rather than hard-coded
//! unpacking. Built-in layouts are available through [`SimulationFamily`].

pub mod error;
pub mod field;
pub mod grid;
pub mod params;
pub mod reader;
pub mod schema;

pub use error::{FormatError, FormatResult};
pub use field::{AuxData, Dataset, Field};
pub use grid::{Grid, TimeAxis, explicit_grid, implicit_grid, reconstruct, time_axis};
pub use params::{ParamValue, ParameterSet, RunParams};
pub use reader::{parse_parameter_line, read_dataset, read_dataset_path, tokenize};
pub use schema::{FieldKind, FieldSpec, ParamLayout, ParamSchema, SimulationFamily};
