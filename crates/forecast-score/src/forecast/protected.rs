use regex::Regex;
use std::sync::LazyLock;

use crate::Table;

/// Reserved column names that are never part of a forecast unit.
pub const PROTECTED_COLUMNS: &[&str] = &[
    "predicted",
    "observed",
    "sample_id",
    "quantile_level",
    "upper",
    "lower",
    "pit_value",
    "interval_range",
    "boundary",
    "relative_skill",
    "scaled_relative_skill",
    "interval_coverage",
    "interval_coverage_deviation",
    "quantile_coverage",
    "quantile_coverage_deviation",
];

static METRIC_OUTPUT_PAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"coverage_|_relative_skill$").unwrap());

/// A table together with the score names recorded for it.
///
/// Implemented by plain tables (no score names), forecasts and scores so that the
/// resolver functions work on all three.
pub trait Tabular {
    fn table(&self) -> &Table;

    fn recorded_score_names(&self) -> &[String] {
        &[]
    }
}

impl Tabular for Table {
    fn table(&self) -> &Table {
        self
    }
}

/// Whether `name` is reserved, given the score names recorded so far.
pub fn is_protected(name: &str, score_names: &[String]) -> bool {
    PROTECTED_COLUMNS.contains(&name)
        || score_names.iter().any(|s| s == name)
        || METRIC_OUTPUT_PAT.is_match(name)
}

/// Protected names without a table to match against: the static registry
/// followed by the given score names.
pub fn protected_columns(score_names: &[String]) -> Vec<String> {
    PROTECTED_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .chain(score_names.iter().cloned())
        .collect()
}

/// Protected columns present in `data`, in column order.
///
/// Besides the static registry this picks up recorded score names and columns
/// that follow a metric-output naming convention (`coverage_`, `_relative_skill`).
pub fn get_protected_columns(data: &impl Tabular) -> Vec<String> {
    let score_names = data.recorded_score_names();
    data.table()
        .names()
        .filter(|name| is_protected(name, score_names))
        .map(str::to_string)
        .collect()
}

/// Columns that together identify one forecast: everything that is neither
/// protected nor a recorded score. May be empty.
pub fn get_forecast_unit(data: &impl Tabular) -> Vec<String> {
    let score_names = data.recorded_score_names();
    data.table()
        .names()
        .filter(|name| !is_protected(name, score_names))
        .map(str::to_string)
        .collect()
}
