//! Analysis profiles: which layout to parse and which analysis to run.

use std::path::Path;

use sd_diag::{AnalysisKind, DiagnosticsConfig, theoretical_heat_rate};
use sd_format::{FormatError, ParamSchema, ParameterSet, SimulationFamily};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Closed-form rate a family's diagnostics are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheoryModel {
    /// `sigma = 16 pi^2 nu`, decay of `sin(4 pi x)` under `u_t = nu u_xx`
    HeatDiffusion,
    /// Exact transport, `sigma = 0`
    Undamped,
}

impl TheoryModel {
    pub fn rate(&self, params: &ParameterSet) -> AppResult<f64> {
        match self {
            Self::HeatDiffusion => {
                let nu = params
                    .get_f64("nu")
                    .ok_or_else(|| FormatError::MissingParameter {
                        name: "nu".to_string(),
                    })?;
                Ok(theoretical_heat_rate(nu))
            }
            Self::Undamped => Ok(0.0),
        }
    }
}

/// A built-in family by name, or a schema written out in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    Preset(SimulationFamily),
    Inline(ParamSchema),
}

impl SchemaSource {
    pub fn family(&self) -> Option<SimulationFamily> {
        match self {
            Self::Preset(family) => Some(*family),
            Self::Inline(_) => None,
        }
    }

    pub fn schema(&self) -> ParamSchema {
        match self {
            Self::Preset(family) => family.schema(),
            Self::Inline(schema) => schema.clone(),
        }
    }
}

/// Default analysis for a family: heat runs are checked for damping,
/// everything else for stability.
pub fn default_kind(family: SimulationFamily) -> AnalysisKind {
    match family {
        SimulationFamily::HeatV1 | SimulationFamily::HeatV2 => AnalysisKind::Damping,
        _ => AnalysisKind::Stability,
    }
}

pub fn default_theory(family: SimulationFamily) -> Option<TheoryModel> {
    match family {
        SimulationFamily::HeatV1 | SimulationFamily::HeatV2 => Some(TheoryModel::HeatDiffusion),
        SimulationFamily::Advection => Some(TheoryModel::Undamped),
        _ => None,
    }
}

/// Everything needed to analyze one output file.
///
/// Unset `kind` and `theory` fall back to the preset family's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProfile {
    pub schema: SchemaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnalysisKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theory: Option<TheoryModel>,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl AnalysisProfile {
    pub fn preset(family: SimulationFamily) -> Self {
        Self {
            schema: SchemaSource::Preset(family),
            kind: None,
            theory: None,
            diagnostics: DiagnosticsConfig::default(),
        }
    }

    pub fn inline(schema: ParamSchema) -> Self {
        Self {
            schema: SchemaSource::Inline(schema),
            kind: None,
            theory: None,
            diagnostics: DiagnosticsConfig::default(),
        }
    }

    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn analysis_kind(&self) -> AnalysisKind {
        self.kind
            .or_else(|| self.schema.family().map(default_kind))
            .unwrap_or_default()
    }

    pub fn theory_model(&self) -> Option<TheoryModel> {
        self.theory
            .or_else(|| self.schema.family().and_then(default_theory))
    }

    /// Theoretical rate for a parsed run, `None` when the profile has no model.
    pub fn theory_for(&self, params: &ParameterSet) -> AppResult<Option<f64>> {
        self.theory_model().map(|m| m.rate(params)).transpose()
    }

    pub fn from_yaml_str(s: &str) -> AppResult<Self> {
        serde_yaml::from_str(s)
            .map_err(|e| AppError::Profile(format!("Failed to parse profile YAML: {}", e)))
    }
}

/// Load an analysis profile from a YAML file.
pub fn load_profile(path: &Path) -> AppResult<AnalysisProfile> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProfileFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    AnalysisProfile::from_yaml_str(&content)
}
