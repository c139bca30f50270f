//! sd-core: shared foundation for simdiag.
//!
//! Contains:
//! - numeric (float helpers shared by the parser, fitter and diagnostics)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
