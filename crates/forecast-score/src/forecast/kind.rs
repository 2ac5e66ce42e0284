use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Column, ColumnKind, ScoreError, Table};

pub const OBSERVED: &str = "observed";
pub const PREDICTED: &str = "predicted";
pub const SAMPLE_ID: &str = "sample_id";
pub const QUANTILE_LEVEL: &str = "quantile_level";
pub const MODEL: &str = "model";

/// The four supported forecast shapes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastType {
    /// Probability of the second level of a two-level `observed` factor.
    Binary,
    /// Predictive quantiles, one row per `quantile_level`.
    Quantile,
    /// Predictive samples, one row per `sample_id`.
    Sample,
    /// A single predicted value per forecast.
    Point,
}

impl ForecastType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastType::Binary => "binary",
            ForecastType::Quantile => "quantile",
            ForecastType::Sample => "sample",
            ForecastType::Point => "point",
        }
    }

    /// Columns that must be non-missing for a row to be scored.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            ForecastType::Binary | ForecastType::Point => &[OBSERVED, PREDICTED],
            ForecastType::Quantile => &[OBSERVED, PREDICTED, QUANTILE_LEVEL],
            ForecastType::Sample => &[OBSERVED, PREDICTED, SAMPLE_ID],
        }
    }
}

impl fmt::Display for ForecastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastType {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(ForecastType::Binary),
            "quantile" => Ok(ForecastType::Quantile),
            "sample" => Ok(ForecastType::Sample),
            "point" => Ok(ForecastType::Point),
            other => Err(ScoreError::invalid_values(
                "forecast_type",
                format!("unknown forecast type `{other}`"),
            )),
        }
    }
}

/// Classifies a table as binary, quantile, sample or point.
///
/// Predicates are checked in that order and the first match wins, so a factor
/// `observed` makes the table binary even if a `quantile_level` or `sample_id`
/// column is present.
pub fn get_forecast_type(table: &Table) -> Result<ForecastType, ScoreError> {
    let missing: Vec<String> = [OBSERVED, PREDICTED]
        .into_iter()
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ScoreError::MissingColumns { columns: missing });
    }
    let observed = table.require(OBSERVED)?;
    let predicted = table.require(PREDICTED)?;

    if is_binary(observed, predicted) {
        Ok(ForecastType::Binary)
    } else if is_quantile(table, observed, predicted) {
        Ok(ForecastType::Quantile)
    } else if is_sample(table, observed, predicted) {
        Ok(ForecastType::Sample)
    } else if is_point(table, observed, predicted) {
        Ok(ForecastType::Point)
    } else {
        Err(ScoreError::NoForecastType {
            hint: no_match_hint(observed, predicted),
        })
    }
}

fn is_binary(observed: &Column, predicted: &Column) -> bool {
    observed.is_factor() && predicted.is_numeric()
}

fn is_quantile(table: &Table, observed: &Column, predicted: &Column) -> bool {
    observed.is_numeric() && predicted.is_numeric() && table.has_column(QUANTILE_LEVEL)
}

fn is_sample(table: &Table, observed: &Column, predicted: &Column) -> bool {
    observed.is_numeric() && predicted.is_numeric() && table.has_column(SAMPLE_ID)
}

fn is_point(table: &Table, observed: &Column, predicted: &Column) -> bool {
    observed.is_numeric()
        && predicted.is_numeric()
        && !table.has_column(SAMPLE_ID)
        && !table.has_column(QUANTILE_LEVEL)
}

fn no_match_hint(observed: &Column, predicted: &Column) -> String {
    if !predicted.is_numeric() {
        format!("`predicted` must be numeric, found {}", predicted.kind())
    } else if observed.kind() == ColumnKind::Text {
        "`observed` is text; convert it to a factor with two levels for a binary forecast \
         or to numbers for a point, sample or quantile forecast"
            .to_string()
    } else {
        format!(
            "`observed` must be numeric or a factor with two levels, found {}",
            observed.kind()
        )
    }
}

/// Kind of values held by a vector, used to pick between continuous and integer
/// variants of a scoring rule.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Classification,
    Integer,
    Continuous,
}

/// Classifies a column. Errors when every value is missing.
pub fn get_type(name: &str, column: &Column) -> Result<ValueType, ScoreError> {
    if column.missing_count() == column.len() {
        return Err(ScoreError::AllMissing {
            column: name.to_string(),
        });
    }
    match column {
        Column::Factor(_) | Column::Text(_) | Column::Bool(_) => Ok(ValueType::Classification),
        Column::Int(_) => Ok(ValueType::Integer),
        Column::Float(values) => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            get_value_type(name, &present)
        }
    }
}

/// Classifies plain numbers. NaN counts as missing.
pub fn get_value_type(name: &str, values: &[f64]) -> Result<ValueType, ScoreError> {
    let mut present = values.iter().filter(|v| !v.is_nan()).peekable();
    if present.peek().is_none() {
        return Err(ScoreError::AllMissing {
            column: name.to_string(),
        });
    }
    if present.all(|v| v.is_finite() && v.fract() == 0.0) {
        Ok(ValueType::Integer)
    } else {
        Ok(ValueType::Continuous)
    }
}
