mod diagnostics;
mod errors;
pub mod options;

pub use diagnostics::{Checked, Diagnostic, Diagnostics, Severity};
pub use errors::{ErrorClass, ScoreError};
pub use options::{Options, option_bool, option_f64, option_i64};
