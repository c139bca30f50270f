//! Threshold-crossing and equilibrium events.
//!
//! An event that never happens is `None`. Index 0 always means the event was
//! already present in the first sample.

use core::fmt;

use sd_format::Field;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Explosion,
    ShockFormation,
    Equilibrium,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Explosion => "explosion",
            Self::ShockFormation => "shock formation",
            Self::Equilibrium => "equilibrium",
        };
        f.write_str(label)
    }
}

/// An event located on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub index: usize,
    pub time: f64,
}

impl Event {
    fn at(kind: EventKind, index: usize, time: &[f64]) -> Self {
        Self {
            kind,
            index,
            time: time.get(index).copied().unwrap_or(f64::NAN),
        }
    }
}

/// First index whose amplitude exceeds `factor * amplitudes[0]`.
///
/// Non-finite amplitudes count as exceeding every threshold.
pub fn first_crossing(amplitudes: &[f64], factor: f64) -> Option<usize> {
    let threshold = factor * amplitudes.first()?;
    amplitudes
        .iter()
        .position(|&a| !a.is_finite() || a > threshold)
}

/// End (exclusive) of the fit window: the crossing index, or the full length.
pub fn fit_window_end(amplitudes: &[f64], factor: f64) -> usize {
    first_crossing(amplitudes, factor).unwrap_or(amplitudes.len())
}

pub fn detect_explosion(amplitudes: &[f64], time: &[f64], factor: f64) -> Option<Event> {
    first_crossing(amplitudes, factor).map(|i| Event::at(EventKind::Explosion, i, time))
}

pub fn detect_shock(amplitudes: &[f64], time: &[f64], factor: f64) -> Option<Event> {
    first_crossing(amplitudes, factor).map(|i| Event::at(EventKind::ShockFormation, i, time))
}

fn is_settled(row: &[f64], tol: f64) -> bool {
    row.iter().all(|v| v.is_finite() && v.abs() < tol)
}

/// First observed row whose largest magnitude is below `tol`.
pub fn detect_equilibrium(field: &Field, time: &[f64], tol: f64) -> Option<Event> {
    field
        .observed()
        .position(|row| is_settled(row, tol))
        .map(|i| Event::at(EventKind::Equilibrium, i, time))
}
