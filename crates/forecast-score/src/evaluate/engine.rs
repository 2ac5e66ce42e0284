use bon::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::data::describe_key;
use crate::{
    Checked, Column, Diagnostics, Forecast, ForecastType, Matrix, Metric, MetricArgs, MetricSet,
    OBSERVED, Options, PREDICTED, Predicted, QUANTILE_LEVEL, ScoreError, Scores, Table,
    get_forecast_unit, safe_call,
};

/// Settings for [`score`].
#[derive(Builder, Debug, Clone)]
pub struct ScoreOptions {
    /// Run the metrics of a batch on the rayon thread pool.
    #[builder(default = true)]
    pub parallel: bool,
    /// Passed to every metric as `MetricArgs::options`.
    #[builder(default)]
    pub metric_options: Options,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            metric_options: Options::new(),
        }
    }
}

enum BatchPredicted {
    Vector(Vec<f64>),
    Matrix(Matrix),
}

/// Forecasts that are scored by one call of each metric.
struct Batch {
    /// Rows of the complete-case table that receive this batch's scores.
    output_rows: Vec<usize>,
    observed: Vec<f64>,
    predicted: BatchPredicted,
    levels: Option<Vec<f64>>,
    /// Output rows per forecast: 1, or the number of quantile levels.
    per_row: usize,
}

impl Batch {
    fn args<'a>(&'a self, options: &'a Options) -> MetricArgs<'a> {
        MetricArgs {
            observed: &self.observed,
            predicted: match &self.predicted {
                BatchPredicted::Vector(values) => Predicted::Vector(values),
                BatchPredicted::Matrix(matrix) => Predicted::Matrix(matrix),
            },
            quantile_level: self.levels.as_deref(),
            options,
        }
    }
}

/// One forecast unit of a sample or quantile forecast.
struct Group {
    rows: Vec<usize>,
    observed: f64,
    predicted: Vec<f64>,
}

/// Applies every metric in `metrics` to `forecast`.
///
/// Rows with a missing value in a required column are dropped first. Point and
/// binary forecasts are scored in one batch. Sample forecasts are grouped by
/// forecast unit and batched by number of samples; quantile forecasts are batched
/// by their exact set of quantile levels. A metric that fails on a batch leaves
/// missing values there and an error diagnostic on the result; the other metrics
/// and batches are unaffected.
///
/// The result has the forecast-unit columns (plus `quantile_level` for quantile
/// forecasts) followed by one column per metric.
#[tracing::instrument(
    name = "fscore.score",
    level = "debug",
    skip_all,
    fields(forecast_type = %forecast.forecast_type(), metrics = metrics.len())
)]
pub fn score(
    forecast: &Forecast,
    metrics: &MetricSet,
    options: &ScoreOptions,
) -> Result<Scores, ScoreError> {
    let forecast_type = forecast.forecast_type();
    let table = forecast.table();
    let unit = get_forecast_unit(forecast);
    let mut diagnostics = Diagnostics::new();

    let required = forecast_type.required_columns();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ScoreError::MissingColumns { columns: missing });
    }

    let mut identity = unit.clone();
    if forecast_type == ForecastType::Quantile {
        identity.push(QUANTILE_LEVEL.to_string());
    }
    if let Some(clash) = metrics.names().into_iter().find(|name| identity.contains(name)) {
        return Err(ScoreError::invalid_values(
            clash,
            "metric name clashes with a forecast-unit column",
        ));
    }

    let complete: Vec<usize> = (0..table.nrow())
        .filter(|&row| {
            required
                .iter()
                .all(|name| table.column(name).is_some_and(|c| !c.is_missing(row)))
        })
        .collect();
    let dropped = table.nrow() - complete.len();
    if dropped > 0 {
        diagnostics.note(
            "missing",
            format!("dropped {dropped} row(s) with missing values in {}", required.join(", ")),
        );
    }
    let data = table.take(&complete);

    let batches = match forecast_type {
        ForecastType::Binary | ForecastType::Point => single_batch(&data)?,
        ForecastType::Sample => sample_batches(&data, &unit)?,
        ForecastType::Quantile => quantile_batches(&data, &unit)?,
    };
    debug!(rows = data.nrow(), batches = batches.len(), "forecast reshaped");

    let named: Vec<(&str, &Arc<dyn Metric>)> = metrics.iter().collect();
    let mut output_rows = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); named.len()];

    for batch in &batches {
        let args = batch.args(&options.metric_options);
        let run = |&(name, metric): &(&str, &Arc<dyn Metric>)| {
            apply(name, &**metric, &args, batch, forecast_type)
        };
        let results: Vec<Checked<Vec<f64>>> = if options.parallel {
            named.par_iter().map(run).collect()
        } else {
            named.iter().map(run).collect()
        };

        for (column, result) in columns.iter_mut().zip(results) {
            let (values, diags) = result.into_parts();
            column.extend(values);
            diagnostics.extend(diags);
        }
        output_rows.extend_from_slice(&batch.output_rows);
    }

    let mut out = data.select(&identity)?.take(&output_rows);
    for ((name, _), values) in named.iter().zip(columns) {
        out.insert_column(*name, Column::float(values))?;
    }
    debug!(rows = out.nrow(), "scores assembled");
    Ok(Scores::from_parts(out, Some(metrics.names()), diagnostics))
}

/// Calls one metric on one batch and expands its output to one value per output
/// row. Any failure yields NaN for every row of the batch.
fn apply(
    name: &str,
    metric: &dyn Metric,
    args: &MetricArgs<'_>,
    batch: &Batch,
    forecast_type: ForecastType,
) -> Checked<Vec<f64>> {
    let n = batch.observed.len();
    let width = n * batch.per_row;
    let (values, mut diagnostics) = safe_call(name, metric, args).into_parts();

    let values = match values {
        Some(values) if values.len() == n => values
            .into_iter()
            .flat_map(|v| std::iter::repeat_n(v, batch.per_row))
            .collect(),
        Some(values) if forecast_type == ForecastType::Quantile && values.len() == width => {
            values
        }
        Some(values) => {
            let expected = if forecast_type == ForecastType::Quantile {
                format!("{n} or {width}")
            } else {
                n.to_string()
            };
            diagnostics.error(
                name,
                format!("returned {} values, expected {expected}", values.len()),
            );
            vec![f64::NAN; width]
        }
        None => vec![f64::NAN; width],
    };
    trace!(metric = name, forecasts = n, "metric applied");
    Checked::new(values, diagnostics)
}

fn numeric(table: &Table, column: &str) -> Result<Vec<f64>, ScoreError> {
    let column = table.require(column)?;
    Ok((0..table.nrow())
        .map(|row| column.numeric_at(row).unwrap_or(f64::NAN))
        .collect())
}

fn single_batch(data: &Table) -> Result<Vec<Batch>, ScoreError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Batch {
        output_rows: (0..data.nrow()).collect(),
        observed: numeric(data, OBSERVED)?,
        predicted: BatchPredicted::Vector(numeric(data, PREDICTED)?),
        levels: None,
        per_row: 1,
    }])
}

fn collect_groups(
    data: &Table,
    unit: &[String],
    levels: Option<&[f64]>,
) -> Result<Vec<Group>, ScoreError> {
    let observed = numeric(data, OBSERVED)?;
    let predicted = numeric(data, PREDICTED)?;

    data.group_indices(unit)?
        .into_iter()
        .map(|(key, mut rows)| {
            if let Some(levels) = levels {
                rows.sort_by(|&a, &b| levels[a].total_cmp(&levels[b]));
            }
            let first = observed[rows[0]];
            if rows.iter().any(|&row| observed[row].to_bits() != first.to_bits()) {
                return Err(ScoreError::ObservedNotUnique {
                    unit: describe_key(unit, &key),
                });
            }
            Ok(Group {
                predicted: rows.iter().map(|&row| predicted[row]).collect(),
                observed: first,
                rows,
            })
        })
        .collect()
}

fn matrix_of(groups: &[Group]) -> Result<Matrix, ScoreError> {
    let rows: Vec<Vec<f64>> = groups.iter().map(|g| g.predicted.clone()).collect();
    Matrix::from_rows(&rows).map_err(|err| ScoreError::invalid_values(PREDICTED, err.to_string()))
}

fn sample_batches(data: &Table, unit: &[String]) -> Result<Vec<Batch>, ScoreError> {
    let mut by_size: IndexMap<usize, Vec<Group>> = IndexMap::new();
    for group in collect_groups(data, unit, None)? {
        by_size.entry(group.rows.len()).or_default().push(group);
    }

    by_size
        .into_values()
        .map(|groups| {
            Ok(Batch {
                output_rows: groups.iter().map(|g| g.rows[0]).collect(),
                observed: groups.iter().map(|g| g.observed).collect(),
                predicted: BatchPredicted::Matrix(matrix_of(&groups)?),
                levels: None,
                per_row: 1,
            })
        })
        .collect()
}

fn quantile_batches(data: &Table, unit: &[String]) -> Result<Vec<Batch>, ScoreError> {
    let levels = numeric(data, QUANTILE_LEVEL)?;
    let mut by_levels: IndexMap<Vec<u64>, Vec<Group>> = IndexMap::new();
    for group in collect_groups(data, unit, Some(&levels))? {
        let key = group.rows.iter().map(|&row| levels[row].to_bits()).collect();
        by_levels.entry(key).or_default().push(group);
    }

    by_levels
        .into_values()
        .map(|groups| {
            let group_levels: Vec<f64> = groups[0].rows.iter().map(|&row| levels[row]).collect();
            Ok(Batch {
                output_rows: groups.iter().flat_map(|g| g.rows.iter().copied()).collect(),
                observed: groups.iter().map(|g| g.observed).collect(),
                predicted: BatchPredicted::Matrix(matrix_of(&groups)?),
                per_row: group_levels.len(),
                levels: Some(group_levels),
            })
        })
        .collect()
}
