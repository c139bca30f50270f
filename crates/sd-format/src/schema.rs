//! Parameter schemas and the built-in simulator layouts.

use core::fmt;
use core::str::FromStr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, FormatResult};

/// Declared type of a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Must hold an integral value
    Int,
    /// Always stored as a float
    Real,
    /// Integer if the value is integral, float otherwise
    #[default]
    Auto,
}

/// One named field of the parameter line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldSpecRepr")]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn auto(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Auto,
        }
    }
}

// Lets YAML schemas list bare names next to `{ name, kind }` entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        kind: FieldKind,
    },
}

impl From<FieldSpecRepr> for FieldSpec {
    fn from(repr: FieldSpecRepr) -> Self {
        match repr {
            FieldSpecRepr::Name(name) => Self::auto(name),
            FieldSpecRepr::Full { name, kind } => Self { name, kind },
        }
    }
}

/// How the parameter line names its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLayout {
    /// Bare values, named by position in `fields`
    #[default]
    Positional,
    /// Self-describing `name=value` tokens
    Named,
}

/// Caller-supplied description of an output file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Version label, e.g. `heat-v2`
    pub name: String,
    #[serde(default)]
    pub layout: ParamLayout,
    /// Positional: the full ordered field list. Named: fields that must be present.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// A literal grid row follows the parameter line
    #[serde(default)]
    pub explicit_grid: bool,
    /// Names of static per-point arrays that precede the body, in file order
    #[serde(default)]
    pub aux: Vec<String>,
}

impl ParamSchema {
    pub fn positional(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            layout: ParamLayout::Positional,
            fields: fields.iter().map(|f| FieldSpec::auto(*f)).collect(),
            explicit_grid: false,
            aux: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: ParamLayout::Named,
            fields: Vec::new(),
            explicit_grid: false,
            aux: Vec::new(),
        }
    }

    pub fn with_explicit_grid(mut self) -> Self {
        self.explicit_grid = true;
        self
    }

    pub fn with_aux(mut self, names: &[&str]) -> Self {
        self.aux = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_kind(mut self, field: &str, kind: FieldKind) -> Self {
        if let Some(spec) = self.fields.iter_mut().find(|f| f.name == field) {
            spec.kind = kind;
        }
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn from_yaml_str(s: &str) -> FormatResult<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn load_yaml(path: &Path) -> FormatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Output layouts written by the known simulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationFamily {
    /// Heat equation, boundary values in the record
    HeatV1,
    /// Heat equation with trailing `cfl`
    HeatV2,
    /// Linear advection / wave with Adams-Bashforth order
    Advection,
    /// Inviscid Burgers with Adams-Bashforth order
    BurgersAb,
    /// Viscous Burgers
    Burgers,
    /// Viscous Burgers on a non-uniform grid written out explicitly
    BurgersSpectral,
    /// Nonlinear Schrödinger, field rows straight after the record
    Nls,
    /// Nonlinear Schrödinger with a static potential `V` row before the field
    NlsV,
}

impl SimulationFamily {
    pub const ALL: [SimulationFamily; 8] = [
        Self::HeatV1,
        Self::HeatV2,
        Self::Advection,
        Self::BurgersAb,
        Self::Burgers,
        Self::BurgersSpectral,
        Self::Nls,
        Self::NlsV,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HeatV1 => "heat-v1",
            Self::HeatV2 => "heat-v2",
            Self::Advection => "advection",
            Self::BurgersAb => "burgers-ab",
            Self::Burgers => "burgers",
            Self::BurgersSpectral => "burgers-spectral",
            Self::Nls => "nls",
            Self::NlsV => "nls-v",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HeatV1 => "heat equation u_t = nu u_xx",
            Self::HeatV2 => "heat equation u_t = nu u_xx (with cfl)",
            Self::Advection => "advection u_t + c u_x = 0, Adams-Bashforth",
            Self::BurgersAb => "inviscid Burgers, Adams-Bashforth",
            Self::Burgers => "viscous Burgers",
            Self::BurgersSpectral => "viscous Burgers, explicit grid",
            Self::Nls => "nonlinear Schrödinger",
            Self::NlsV => "nonlinear Schrödinger with potential V",
        }
    }

    pub fn schema(&self) -> ParamSchema {
        let heat_v1 = [
            "nu",
            "nx",
            "nt",
            "min_x",
            "max_x",
            "dx",
            "dt",
            "min_x_bc",
            "max_x_bc",
            "write_every",
        ];
        let nls = [
            "a",
            "b",
            "nx",
            "nt",
            "min_x",
            "max_x",
            "dx",
            "dt",
            "write_every",
        ];
        match self {
            Self::HeatV1 => ParamSchema::positional(self.name(), &heat_v1),
            Self::HeatV2 => {
                let mut fields = heat_v1.to_vec();
                fields.push("cfl");
                ParamSchema::positional(self.name(), &fields)
            }
            Self::Advection => ParamSchema::positional(
                self.name(),
                &[
                    "c",
                    "nx",
                    "nt",
                    "min_x",
                    "max_x",
                    "dx",
                    "dt",
                    "write_every",
                    "which_AB",
                    "cfl",
                ],
            )
            .with_kind("which_AB", FieldKind::Int),
            Self::BurgersAb => ParamSchema::positional(
                self.name(),
                &[
                    "nx",
                    "nt",
                    "min_x",
                    "max_x",
                    "dx",
                    "dt",
                    "write_every",
                    "which_AB",
                    "cfl",
                ],
            )
            .with_kind("which_AB", FieldKind::Int),
            Self::Burgers => ParamSchema::positional(
                self.name(),
                &[
                    "nu",
                    "nx",
                    "nt",
                    "min_x",
                    "max_x",
                    "dx",
                    "dt",
                    "write_every",
                    "cfl",
                ],
            ),
            Self::BurgersSpectral => ParamSchema::positional(
                self.name(),
                &["nu", "nx", "nt", "dt", "write_every", "cfl"],
            )
            .with_explicit_grid(),
            Self::Nls => ParamSchema::positional(self.name(), &nls),
            Self::NlsV => ParamSchema::positional(self.name(), &nls).with_aux(&["V"]),
        }
    }
}

impl fmt::Display for SimulationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimulationFamily {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| FormatError::UnknownFamily {
                name: s.to_string(),
            })
    }
}
