/// Coarse error classification for callers that route on the kind of failure.
///
/// Use [`ScoreError::class`] to get this. `InvalidInput` means the table itself has
/// to be fixed; `InvalidArgument` means the call was made with options that can't
/// work together.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    /// The forecast or scores table does not have the shape or content required.
    InvalidInput,
    /// The options passed to an operation contradict each other or name unknown columns.
    InvalidArgument,
}

/// Fatal failure from one of the table-level operations.
///
/// Anything that is only worth a warning (stale metadata, renamed score columns,
/// duplicate forecasts, a metric that failed on one batch) is reported as a
/// [`Diagnostic`](crate::Diagnostic) instead and never shows up here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// One or more required columns are absent.
    #[error("missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A column referenced by name does not exist in the table.
    #[error("column `{column}` not found in table")]
    UnknownColumn { column: String },

    /// Columns passed to a table constructor have different lengths.
    #[error("column `{column}` has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// None of the forecast-type predicates matched.
    #[error("input doesn't satisfy criteria for any forecast type: {hint}")]
    NoForecastType { hint: String },

    /// A type could not be determined because every value is missing.
    #[error("can't get type of `{column}`: all values are missing")]
    AllMissing { column: String },

    /// A column has the wrong kind or values outside the allowed range.
    #[error("invalid values in column `{column}`: {reason}")]
    InvalidValues { column: String, reason: String },

    /// A forecast unit group holds more than one distinct observed value.
    #[error("`observed` is not unique within forecast unit {unit}")]
    ObservedNotUnique { unit: String },

    /// `summarise_scores` was called with both `by` and `across`.
    #[error("only one of `by` and `across` can be specified")]
    ByAndAcross,

    /// `across` names columns that are not part of the forecast unit.
    #[error("`across` must be a subset of the forecast unit, got {}", columns.join(", "))]
    AcrossNotInForecastUnit { columns: Vec<String> },

    /// A scores table carries no `score_names` and strict checking was requested.
    #[error("scores table has no score names")]
    MissingScoreNames,
}

impl ScoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ByAndAcross | Self::AcrossNotInForecastUnit { .. } => {
                ErrorClass::InvalidArgument
            }
            Self::UnknownColumn { .. } => ErrorClass::InvalidArgument,
            Self::MissingColumns { .. }
            | Self::RaggedColumns { .. }
            | Self::NoForecastType { .. }
            | Self::AllMissing { .. }
            | Self::InvalidValues { .. }
            | Self::ObservedNotUnique { .. }
            | Self::MissingScoreNames => ErrorClass::InvalidInput,
        }
    }

    pub(crate) fn invalid_values(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValues {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }
}
