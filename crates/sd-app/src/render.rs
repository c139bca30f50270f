//! Text and JSON rendering of analysis results.

use std::fmt::Write as _;

use sd_diag::{AnalysisKind, DiagnosticReport, Event, RateEstimate};

use crate::analyze_service::FileAnalysis;
use crate::error::AppResult;

/// How a report is written to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Numbers only, one per line, for scripted sweeps
    Bare,
    /// Annotated lines
    #[default]
    Fancy,
    /// The full analysis as pretty JSON
    Json,
}

/// Format `v` with `digits` significant digits, dropping trailing zeros and
/// switching to exponent notation outside `[1e-4, 10^digits)`.
pub fn format_significant(v: f64, digits: usize) -> String {
    if !v.is_finite() {
        return format!("{v}").to_lowercase();
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(&mantissa), sign, exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn bare_value(v: Option<f64>) -> String {
    v.map_or_else(|| "nan".to_string(), |v| v.to_string())
}

fn event_line(out: &mut String, event: Option<&Event>, label: &str) {
    if let Some(event) = event {
        let _ = writeln!(out, "-- {label} at t = {}", event.time);
    }
}

fn render_bare(report: &DiagnosticReport) -> String {
    match report.kind {
        AnalysisKind::Stability => format!("{}\n", bare_value(report.experimental.measured())),
        AnalysisKind::Damping => format!(
            "{}\n{}\n",
            bare_value(report.theoretical_rate),
            bare_value(report.experimental.measured())
        ),
    }
}

fn render_fancy(report: &DiagnosticReport) -> String {
    let mut out = String::new();

    if report.is_truncated() {
        let _ = writeln!(
            out,
            "-- truncated output: {} of {} samples",
            report.observed_rows, report.nominal_rows
        );
    }
    event_line(&mut out, report.explosion.as_ref(), "explodes");
    event_line(&mut out, report.shock.as_ref(), "shock formation");
    if report.kind == AnalysisKind::Damping {
        match &report.equilibrium {
            Some(event) => {
                let _ = writeln!(out, "-- equilibrium at t = {}", event.time);
            }
            None => out.push_str("-- did not reach equilibrium\n"),
        }
    }

    match &report.experimental {
        RateEstimate::Measured {
            sigma,
            window,
            failed_points,
        } => {
            if *sigma > 0.0 {
                let _ = writeln!(out, "-- damping rate = {}", format_significant(*sigma, 3));
            } else {
                let _ = writeln!(out, "-- growth rate ~= {}", format_significant(-sigma, 3));
            }
            let _ = writeln!(out, "-- fitted over {window} samples");
            if *failed_points > 0 {
                let _ = writeln!(out, "-- {failed_points} point fit(s) failed");
            }
        }
        RateEstimate::Unconverged { seed, reason } => {
            let _ = writeln!(out, "-- rate fit did not converge (seed {seed}): {reason}");
        }
    }

    if let Some(theory) = report.theoretical_rate {
        let _ = writeln!(out, "-- theoretical rate = {}", format_significant(theory, 3));
    }
    if let Some(err) = report.relative_error {
        let _ = writeln!(out, "-- relative error = {}", format_significant(err, 3));
    }
    out
}

/// Render one analysis in the requested mode.
pub fn render_report(analysis: &FileAnalysis, mode: OutputMode) -> AppResult<String> {
    match mode {
        OutputMode::Bare => Ok(render_bare(&analysis.report)),
        OutputMode::Fancy => Ok(render_fancy(&analysis.report)),
        OutputMode::Json => {
            let mut json = serde_json::to_string_pretty(analysis)?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_diag::EventKind;
    use sd_format::{ParamValue, ParameterSet};
    use std::path::PathBuf;

    fn analysis(report: DiagnosticReport) -> FileAnalysis {
        let mut params = ParameterSet::new();
        params.insert("nu", ParamValue::Real(0.01));
        params.insert("nx", ParamValue::Int(4));
        FileAnalysis {
            path: PathBuf::from("out.csv"),
            schema: "heat-v1".to_string(),
            params,
            report,
        }
    }

    fn stability(experimental: RateEstimate) -> DiagnosticReport {
        DiagnosticReport {
            kind: AnalysisKind::Stability,
            theoretical_rate: None,
            experimental,
            relative_error: None,
            explosion: None,
            shock: None,
            equilibrium: None,
            observed_rows: 10,
            nominal_rows: 10,
        }
    }

    #[test]
    fn significant_digits_match_general_format() {
        assert_eq!(format_significant(1.579_136_7, 3), "1.58");
        assert_eq!(format_significant(0.5, 3), "0.5");
        assert_eq!(format_significant(0.012_345, 3), "0.0123");
        assert_eq!(format_significant(123_456.0, 3), "1.23e+05");
        assert_eq!(format_significant(0.000_012_34, 3), "1.23e-05");
        assert_eq!(format_significant(999.9, 3), "1e+03");
        assert_eq!(format_significant(0.0, 3), "0");
        assert_eq!(format_significant(f64::NAN, 3), "nan");
    }

    #[test]
    fn bare_stability_prints_sigma_or_nan() {
        let measured = analysis(stability(RateEstimate::Measured {
            sigma: 0.25,
            window: 10,
            failed_points: 0,
        }));
        assert_eq!(render_report(&measured, OutputMode::Bare).unwrap(), "0.25\n");

        let failed = analysis(stability(RateEstimate::Unconverged {
            seed: 0.0,
            reason: "cap".to_string(),
        }));
        assert_eq!(render_report(&failed, OutputMode::Bare).unwrap(), "nan\n");
    }

    #[test]
    fn bare_damping_prints_theory_then_median() {
        let mut report = stability(RateEstimate::Measured {
            sigma: 1.5,
            window: 5,
            failed_points: 0,
        });
        report.kind = AnalysisKind::Damping;
        report.theoretical_rate = Some(1.25);
        let text = render_report(&analysis(report), OutputMode::Bare).unwrap();
        assert_eq!(text, "1.25\n1.5\n");
    }

    #[test]
    fn fancy_lists_events_and_growth() {
        let mut report = stability(RateEstimate::Measured {
            sigma: -2.0,
            window: 3,
            failed_points: 0,
        });
        report.explosion = Some(Event {
            kind: EventKind::Explosion,
            index: 4,
            time: 0.5,
        });
        report.shock = Some(Event {
            kind: EventKind::ShockFormation,
            index: 3,
            time: 0.25,
        });
        let text = render_report(&analysis(report), OutputMode::Fancy).unwrap();
        assert!(text.contains("-- explodes at t = 0.5\n"));
        assert!(text.contains("-- shock formation at t = 0.25\n"));
        assert!(text.contains("-- growth rate ~= 2\n"));
        assert!(!text.contains("equilibrium"));
    }

    #[test]
    fn fancy_damping_reports_theory_and_missing_equilibrium() {
        let mut report = stability(RateEstimate::Measured {
            sigma: 1.58,
            window: 5,
            failed_points: 1,
        });
        report.kind = AnalysisKind::Damping;
        report.theoretical_rate = Some(1.579_136_7);
        report.relative_error = Some(-0.000_546);
        report.observed_rows = 5;
        report.nominal_rows = 8;
        let text = render_report(&analysis(report), OutputMode::Fancy).unwrap();
        assert!(text.starts_with("-- truncated output: 5 of 8 samples\n"));
        assert!(text.contains("-- did not reach equilibrium\n"));
        assert!(text.contains("-- damping rate = 1.58\n"));
        assert!(text.contains("-- 1 point fit(s) failed\n"));
        assert!(text.contains("-- theoretical rate = 1.58\n"));
        assert!(text.contains("-- relative error = -0.000546\n"));
    }

    #[test]
    fn json_carries_params_and_status() {
        let report = stability(RateEstimate::Unconverged {
            seed: 0.5,
            reason: "cap".to_string(),
        });
        let text = render_report(&analysis(report), OutputMode::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["params"]["nx"], 4);
        assert_eq!(value["report"]["experimental"]["status"], "unconverged");
        assert_eq!(value["report"]["kind"], "stability");
        assert!(value["report"]["explosion"].is_null());
    }
}
