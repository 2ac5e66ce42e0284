use anyhow::{Result, bail};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::{Options, option_bool};

/// Row-major matrix of predictions: one row per forecast, one column per sample or
/// quantile level.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    nrow: usize,
    ncol: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn new(nrow: usize, ncol: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != nrow * ncol {
            bail!(
                "matrix of {nrow}x{ncol} needs {} values, got {}",
                nrow * ncol,
                data.len()
            );
        }
        Ok(Self { nrow, ncol, data })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncol = rows.first().map(Vec::len).unwrap_or_default();
        if let Some(bad) = rows.iter().position(|row| row.len() != ncol) {
            bail!("row {bad} has {} values, expected {ncol}", rows[bad].len());
        }
        Self::new(rows.len(), ncol, rows.concat())
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.ncol..(i + 1) * self.ncol]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.nrow).map(|i| self.row(i))
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.ncol + j]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Predictions handed to a metric.
#[derive(Debug, Clone, Copy)]
pub enum Predicted<'a> {
    /// One value per forecast (point and binary).
    Vector(&'a [f64]),
    /// One row per forecast (sample and quantile).
    Matrix(&'a Matrix),
}

/// Argument record every metric receives.
///
/// `quantile_level` is set for quantile forecasts only and has one entry per matrix
/// column. `options` is shared by all metrics of a call; keys a metric does not use
/// are ignored.
#[derive(Debug, Clone, Copy)]
pub struct MetricArgs<'a> {
    pub observed: &'a [f64],
    pub predicted: Predicted<'a>,
    pub quantile_level: Option<&'a [f64]>,
    pub options: &'a Options,
}

impl<'a> MetricArgs<'a> {
    pub fn predicted_vector(&self) -> Result<&'a [f64]> {
        match self.predicted {
            Predicted::Vector(values) => Ok(values),
            Predicted::Matrix(_) => bail!("expected one prediction per forecast, got a matrix"),
        }
    }

    pub fn predicted_matrix(&self) -> Result<&'a Matrix> {
        match self.predicted {
            Predicted::Matrix(matrix) => Ok(matrix),
            Predicted::Vector(_) => bail!("expected a prediction matrix, got a vector"),
        }
    }

    pub fn quantile_levels(&self) -> Result<&'a [f64]> {
        self.quantile_level
            .ok_or_else(|| anyhow::anyhow!("metric needs quantile levels"))
    }

    /// Number of forecasts in this batch.
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn na_rm(&self) -> bool {
        option_bool(self.options, "na_rm").unwrap_or(false)
    }
}

/// Values produced by one metric call, plus any warnings it wants reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricOutput {
    pub values: Vec<f64>,
    pub warnings: Vec<String>,
}

impl MetricOutput {
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

impl From<Vec<f64>> for MetricOutput {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values,
            warnings: Vec::new(),
        }
    }
}

/// A scoring rule.
///
/// Returns one value per forecast, or for quantile forecasts optionally one value
/// per forecast and level in row-major order.
pub trait Metric: Send + Sync {
    fn compute(&self, args: &MetricArgs<'_>) -> Result<MetricOutput>;
}

/// Adapts a closure to [`Metric`]. See [`metric_fn`].
pub struct FnMetric<F>(F);

impl<F, R> Metric for FnMetric<F>
where
    F: Fn(&MetricArgs<'_>) -> Result<R> + Send + Sync,
    R: Into<MetricOutput>,
{
    fn compute(&self, args: &MetricArgs<'_>) -> Result<MetricOutput> {
        (self.0)(args).map(Into::into)
    }
}

/// Wraps a closure as a metric.
///
/// ```
/// use forecast_score::{MetricArgs, metric_fn};
///
/// let abs_error = metric_fn(|args: &MetricArgs<'_>| {
///     let predicted = args.predicted_vector()?;
///     Ok(args
///         .observed
///         .iter()
///         .zip(predicted)
///         .map(|(y, p)| (y - p).abs())
///         .collect::<Vec<f64>>())
/// });
/// # let _ = abs_error;
/// ```
pub fn metric_fn<F, R>(f: F) -> FnMetric<F>
where
    F: Fn(&MetricArgs<'_>) -> Result<R> + Send + Sync,
    R: Into<MetricOutput>,
{
    FnMetric(f)
}

/// Named, ordered collection of metrics. The names become score columns.
#[derive(Clone, Default)]
pub struct MetricSet {
    metrics: IndexMap<String, Arc<dyn Metric>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, metric: impl Metric + 'static) -> Self {
        self.insert(name, metric);
        self
    }

    /// Adds or replaces a metric. A replaced metric keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, metric: impl Metric + 'static) {
        self.metrics.insert(name.into(), Arc::new(metric));
    }

    pub fn insert_shared(&mut self, name: impl Into<String>, metric: Arc<dyn Metric>) {
        self.metrics.insert(name.into(), metric);
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Metric>> {
        self.metrics.shift_remove(name)
    }

    /// Keeps only the named metrics, in the set's order. Unknown names are ignored.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> MetricSet {
        let metrics = self
            .metrics
            .iter()
            .filter(|(name, _)| names.iter().any(|n| n.as_ref() == name.as_str()))
            .map(|(name, metric)| (name.clone(), Arc::clone(metric)))
            .collect();
        MetricSet { metrics }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Metric>> {
        self.metrics.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Metric>)> + '_ {
        self.metrics.iter().map(|(name, metric)| (name.as_str(), metric))
    }
}

impl fmt::Debug for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSet")
            .field("metrics", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}
