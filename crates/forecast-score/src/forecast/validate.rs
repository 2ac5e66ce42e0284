use bon::Builder;
use std::collections::BTreeSet;
use tracing::debug;

use crate::{
    Checked, Diagnostics, Forecast, ForecastData, ForecastMeta, ForecastType, MODEL, OBSERVED,
    PREDICTED, QUANTILE_LEVEL, SAMPLE_ID, ScoreError, Table, get_duplicate_forecasts,
    get_forecast_type, get_forecast_unit, is_protected,
};

/// How a raw table is turned into a [`Forecast`].
///
/// The column options name source columns that are renamed to their canonical
/// names (`observed`, `predicted`, ...) before validation.
#[derive(Builder, Debug, Clone, Default)]
pub struct ForecastOptions {
    /// Keep only these identity columns (plus protected ones).
    pub forecast_unit: Option<Vec<String>>,
    /// Type the caller expects. A disagreement with inference is a warning.
    pub forecast_type: Option<ForecastType>,
    #[builder(into)]
    pub observed: Option<String>,
    #[builder(into)]
    pub predicted: Option<String>,
    #[builder(into)]
    pub sample_id: Option<String>,
    #[builder(into)]
    pub quantile_level: Option<String>,
    #[builder(into)]
    pub model: Option<String>,
}

/// Validates `table` as a forecast and tags it with its inferred type.
///
/// Fatal problems (missing columns, no matching type, out-of-range probabilities or
/// quantile levels) are errors. Anything that still allows scoring is recorded in
/// the forecast's diagnostics: a requested type that disagrees with inference,
/// duplicate forecasts, uneven numbers of samples or quantiles, and a forecast unit
/// that looks over-specified.
#[tracing::instrument(
    name = "fscore.as_forecast",
    level = "debug",
    skip_all,
    fields(rows = table.nrow(), cols = table.ncol())
)]
pub fn as_forecast(mut table: Table, options: &ForecastOptions) -> Result<Forecast, ScoreError> {
    let renames = [
        (&options.observed, OBSERVED),
        (&options.predicted, PREDICTED),
        (&options.sample_id, SAMPLE_ID),
        (&options.quantile_level, QUANTILE_LEVEL),
        (&options.model, MODEL),
    ];
    for (source, target) in renames {
        if let Some(source) = source {
            table.rename_column(source, target)?;
        }
    }

    if let Some(unit) = &options.forecast_unit {
        table = set_forecast_unit(&table, unit)?;
    }

    let mut diagnostics = Diagnostics::new();
    let forecast_type = get_forecast_type(&table)?;
    if let Some(requested) = options.forecast_type {
        check_recorded_type(requested, forecast_type, &mut diagnostics);
    }
    check_columns(forecast_type, &table, &mut diagnostics)?;

    let forecast_unit = get_forecast_unit(&table);
    check_quality(forecast_type, &table, &forecast_unit, &mut diagnostics)?;

    debug!(%forecast_type, unit = ?forecast_unit, "forecast validated");
    Ok(Forecast::new(
        forecast_type,
        ForecastData::new(
            table,
            ForecastMeta {
                forecast_unit,
                diagnostics,
            },
        ),
    ))
}

/// Re-runs inference and validation on an existing forecast.
///
/// Returns the freshly inferred type. If it disagrees with the recorded variant, or
/// the forecast unit changed since validation, a warning is attached; the forecast
/// itself is not modified.
pub fn validate_forecast(forecast: &Forecast) -> Result<Checked<ForecastType>, ScoreError> {
    let table = forecast.table();
    let mut diagnostics = Diagnostics::new();

    let inferred = get_forecast_type(table)?;
    check_recorded_type(forecast.forecast_type(), inferred, &mut diagnostics);
    check_columns(inferred, table, &mut diagnostics)?;

    let unit = get_forecast_unit(forecast);
    if unit != forecast.forecast_unit() {
        diagnostics.warn(
            "forecast_unit",
            format!(
                "recorded forecast unit [{}] differs from the current one [{}]",
                forecast.forecast_unit().join(", "),
                unit.join(", ")
            ),
        );
    }
    check_quality(inferred, table, &unit, &mut diagnostics)?;
    Ok(Checked::new(inferred, diagnostics))
}

/// Narrows `table` to the given forecast unit plus all protected columns.
///
/// Every unit column must exist. Other identity columns are dropped, which is how
/// a caller resolves an over-specified unit.
pub fn set_forecast_unit(table: &Table, forecast_unit: &[String]) -> Result<Table, ScoreError> {
    for column in forecast_unit {
        table.require(column)?;
    }
    let keep: Vec<&str> = table
        .names()
        .filter(|name| forecast_unit.iter().any(|u| u == name) || is_protected(name, &[]))
        .collect();
    table.select(&keep)
}

fn check_recorded_type(recorded: ForecastType, inferred: ForecastType, diagnostics: &mut Diagnostics) {
    if recorded != inferred {
        diagnostics.warn(
            "forecast_type",
            format!(
                "forecast type `{recorded}` disagrees with the type inferred from the data \
                 (`{inferred}`); using `{inferred}`"
            ),
        );
    }
}

fn check_columns(
    forecast_type: ForecastType,
    table: &Table,
    diagnostics: &mut Diagnostics,
) -> Result<(), ScoreError> {
    let predicted = table.require(PREDICTED)?;

    match forecast_type {
        ForecastType::Binary => {
            let levels = table
                .require(OBSERVED)?
                .as_factor()
                .map(|f| f.levels().len())
                .unwrap_or_default();
            if levels != 2 {
                return Err(ScoreError::invalid_values(
                    OBSERVED,
                    format!("binary forecasts need a factor with exactly two levels, found {levels}"),
                ));
            }
            let out_of_range = (0..table.nrow())
                .filter_map(|row| predicted.numeric_at(row))
                .any(|p| !(0.0..=1.0).contains(&p));
            if out_of_range {
                return Err(ScoreError::invalid_values(
                    PREDICTED,
                    "binary forecasts must be probabilities between 0 and 1",
                ));
            }
            for ignored in [QUANTILE_LEVEL, SAMPLE_ID] {
                if table.has_column(ignored) {
                    diagnostics.warn(
                        "forecast_type",
                        format!("`observed` is a factor, so the table is binary and `{ignored}` is ignored"),
                    );
                }
            }
        }
        ForecastType::Quantile => {
            let levels = table.require(QUANTILE_LEVEL)?;
            if !levels.is_numeric() {
                return Err(ScoreError::invalid_values(
                    QUANTILE_LEVEL,
                    format!("quantile levels must be numeric, found {}", levels.kind()),
                ));
            }
            let out_of_range = (0..table.nrow())
                .filter_map(|row| levels.numeric_at(row))
                .any(|q| !(0.0..=1.0).contains(&q));
            if out_of_range {
                return Err(ScoreError::invalid_values(
                    QUANTILE_LEVEL,
                    "quantile levels must be between 0 and 1",
                ));
            }
        }
        ForecastType::Sample | ForecastType::Point => {}
    }
    Ok(())
}

fn check_quality(
    forecast_type: ForecastType,
    table: &Table,
    forecast_unit: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<(), ScoreError> {
    let incomplete = (0..table.nrow())
        .filter(|&row| {
            forecast_type
                .required_columns()
                .iter()
                .any(|name| table.column(name).is_none_or(|c| c.is_missing(row)))
        })
        .count();
    if incomplete > 0 {
        diagnostics.note(
            "missing",
            format!("{incomplete} row(s) have missing values and will be dropped when scoring"),
        );
    }

    let duplicates = get_duplicate_forecasts(table, Some(forecast_unit))?.nrow();
    if duplicates > 0 {
        diagnostics.warn(
            "duplicates",
            format!(
                "{duplicates} row(s) belong to forecasts with more than one prediction for the \
                 same target; inspect them with get_duplicate_forecasts()"
            ),
        );
    }

    if matches!(forecast_type, ForecastType::Sample | ForecastType::Quantile) && table.nrow() > 1 {
        let groups = table.group_indices(forecast_unit)?;
        let sizes: BTreeSet<usize> = groups.values().map(Vec::len).collect();
        if sizes.len() > 1 {
            let sizes: Vec<String> = sizes.iter().map(usize::to_string).collect();
            diagnostics.note(
                "number_per_forecast",
                format!(
                    "forecasts have differing numbers of {} rows: {}",
                    forecast_type,
                    sizes.join(", ")
                ),
            );
        }
        if groups.len() == table.nrow() {
            diagnostics.warn(
                "forecast_unit",
                format!(
                    "every forecast unit holds a single row, so [{}] probably includes columns \
                     that vary within one forecast; narrow it with set_forecast_unit()",
                    forecast_unit.join(", ")
                ),
            );
        }
    }
    Ok(())
}
