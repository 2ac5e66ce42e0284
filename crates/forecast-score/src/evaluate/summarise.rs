use bon::Builder;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{
    Column, Options, ScoreError, Scores, get_forecast_unit, get_score_names,
    option_bool, option_i64,
};

/// Collapses the scores of one group into a single value.
///
/// Receives only present values; missing-value handling happens before the call.
pub trait Reducer: Send + Sync {
    fn name(&self) -> &str;
    fn reduce(&self, values: &[f64], params: &Options) -> f64;
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Reducer for Mean {
    fn name(&self) -> &str {
        "mean"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        mean(values)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

impl Reducer for Median {
    fn name(&self) -> &str {
        "median"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        crate::metrics::median(values)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Reducer for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        values.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl Reducer for Min {
    fn name(&self) -> &str {
        "min"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl Reducer for Max {
    fn name(&self) -> &str {
        "max"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than two values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sd;

impl Reducer for Sd {
    fn name(&self) -> &str {
        "sd"
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        crate::metrics::variance(values).sqrt()
    }
}

/// Group mean rounded to `digits` decimal places (default 0), ties to even.
#[derive(Debug, Clone, Copy, Default)]
pub struct Round;

impl Reducer for Round {
    fn name(&self) -> &str {
        "round"
    }

    fn reduce(&self, values: &[f64], params: &Options) -> f64 {
        let digits = option_i64(params, "digits").unwrap_or(0);
        round_to(mean(values), digits)
    }
}

/// Group mean rounded to `digits` significant digits (default 6).
#[derive(Debug, Clone, Copy, Default)]
pub struct Signif;

impl Reducer for Signif {
    fn name(&self) -> &str {
        "signif"
    }

    fn reduce(&self, values: &[f64], params: &Options) -> f64 {
        let digits = option_i64(params, "digits").unwrap_or(6).max(1);
        let value = mean(values);
        if value == 0.0 || !value.is_finite() {
            return value;
        }
        let magnitude = value.abs().log10().floor() as i64;
        round_to(value, digits - 1 - magnitude)
    }
}

fn round_to(value: f64, digits: i64) -> f64 {
    let factor = 10f64.powi(digits.unsigned_abs().min(300) as i32);
    if digits >= 0 {
        (value * factor).round_ties_even() / factor
    } else {
        (value / factor).round_ties_even() * factor
    }
}

/// Adapts a closure to [`Reducer`]. See [`reducer_fn`].
pub struct FnReducer<F> {
    name: String,
    f: F,
}

impl<F> Reducer for FnReducer<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn reduce(&self, values: &[f64], _params: &Options) -> f64 {
        (self.f)(values)
    }
}

pub fn reducer_fn<F>(name: impl Into<String>, f: F) -> FnReducer<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    FnReducer {
        name: name.into(),
        f,
    }
}

/// Settings for [`summarise_scores`].
///
/// At most one of `by` and `across` may be set. `params` is passed to the reducer;
/// `na_rm: true` drops missing scores before reducing.
#[derive(Builder, Clone)]
pub struct SummariseOptions {
    /// Columns to keep as grouping keys.
    pub by: Option<Vec<String>>,
    /// Forecast-unit columns to aggregate over; the rest of the unit is kept.
    pub across: Option<Vec<String>>,
    #[builder(default = Arc::new(Mean) as Arc<dyn Reducer>)]
    pub fun: Arc<dyn Reducer>,
    #[builder(default)]
    pub params: Options,
}

impl Default for SummariseOptions {
    fn default() -> Self {
        Self {
            by: None,
            across: None,
            fun: Arc::new(Mean),
            params: Options::new(),
        }
    }
}

impl fmt::Debug for SummariseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummariseOptions")
            .field("by", &self.by)
            .field("across", &self.across)
            .field("fun", &self.fun.name())
            .field("params", &self.params)
            .finish()
    }
}

/// Aggregates score columns over groups.
///
/// Groups are the `by` columns, the forecast unit minus `across`, or by default the
/// whole forecast unit of `scores`. Only metric columns are reduced; the result
/// holds the grouping columns followed by the metric columns and keeps the score
/// names, so calls can be chained.
#[tracing::instrument(name = "fscore.summarise", level = "debug", skip_all, fields(fun = options.fun.name()))]
pub fn summarise_scores(scores: &Scores, options: &SummariseOptions) -> Result<Scores, ScoreError> {
    if options.by.is_some() && options.across.is_some() {
        return Err(ScoreError::ByAndAcross);
    }
    let (names, mut diagnostics) = get_score_names(scores, true)?.into_parts();
    let names = names.unwrap_or_default();
    let table = scores.table();
    let unit = get_forecast_unit(scores);

    let by = match (&options.by, &options.across) {
        (Some(by), _) => {
            for column in by {
                table.require(column)?;
            }
            by.clone()
        }
        (None, Some(across)) => {
            let outside: Vec<String> = across
                .iter()
                .filter(|column| !unit.contains(column))
                .cloned()
                .collect();
            if !outside.is_empty() {
                return Err(ScoreError::AcrossNotInForecastUnit { columns: outside });
            }
            unit.iter()
                .filter(|column| !across.contains(column))
                .cloned()
                .collect()
        }
        (None, None) => unit,
    };

    let na_rm = option_bool(&options.params, "na_rm").unwrap_or(false);
    let groups = table.group_indices(&by)?;
    let heads: Vec<usize> = groups.values().map(|rows| rows[0]).collect();
    let mut out = table.select(&by)?.take(&heads);

    let mut incomplete = 0usize;
    for name in names.iter().filter(|name| table.has_column(name)) {
        if by.contains(name) {
            continue;
        }
        let column = table.require(name)?;
        let reduced: Vec<Option<f64>> = groups
            .values()
            .map(|rows| {
                let values: Vec<Option<f64>> = rows.iter().map(|&row| column.numeric_at(row)).collect();
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                if present.len() < values.len() && !na_rm {
                    incomplete += 1;
                    return None;
                }
                if present.is_empty() {
                    return None;
                }
                Some(options.fun.reduce(&present, &options.params))
            })
            .collect();
        out.insert_column(name.clone(), Column::float_opt(reduced))?;
    }
    if incomplete > 0 {
        diagnostics.note(
            "summarise",
            format!("{incomplete} group(s) contain missing scores and were left missing; set `na_rm` to drop them"),
        );
    }

    debug!(groups = out.nrow(), by = ?by, "scores summarised");
    Ok(Scores::from_parts(out, Some(names), diagnostics))
}
