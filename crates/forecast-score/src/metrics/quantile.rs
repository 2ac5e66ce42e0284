use anyhow::{Result, anyhow, bail};

use super::check_lengths;
use crate::{Matrix, Metric, MetricArgs, MetricOutput};

const LEVEL_TOLERANCE: f64 = 1e-9;

fn find_level(levels: &[f64], level: f64) -> Option<usize> {
    levels.iter().position(|q| (q - level).abs() < LEVEL_TOLERANCE)
}

/// Quantile levels of a batch split into the median and symmetric central
/// intervals.
struct Intervals {
    median: Option<usize>,
    /// (lower column, upper column, alpha) where the interval covers `1 - alpha`.
    pairs: Vec<(usize, usize, f64)>,
    unpaired: Vec<f64>,
}

impl Intervals {
    fn new(levels: &[f64]) -> Self {
        let median = find_level(levels, 0.5);
        let mut pairs = Vec::new();
        let mut unpaired = Vec::new();
        for (i, &q) in levels.iter().enumerate() {
            if (q - 0.5).abs() < LEVEL_TOLERANCE {
                continue;
            }
            match find_level(levels, 1.0 - q) {
                Some(j) if q < 0.5 => pairs.push((i, j, 2.0 * q)),
                Some(_) => {}
                None => unpaired.push(q),
            }
        }
        Self {
            median,
            pairs,
            unpaired,
        }
    }

    fn weight(&self) -> f64 {
        self.pairs.len() as f64 + if self.median.is_some() { 0.5 } else { 0.0 }
    }

    /// Weighted (dispersion, overprediction, underprediction) of one forecast. The
    /// three add up to the weighted interval score.
    fn decompose(&self, y: f64, row: &[f64]) -> (f64, f64, f64) {
        let (mut dispersion, mut over, mut under) = (0.0, 0.0, 0.0);
        for &(l, u, alpha) in &self.pairs {
            dispersion += alpha / 2.0 * (row[u] - row[l]);
            over += (row[l] - y).max(0.0);
            under += (y - row[u]).max(0.0);
        }
        if let Some(m) = self.median {
            over += 0.5 * (row[m] - y).max(0.0);
            under += 0.5 * (y - row[m]).max(0.0);
        }
        let weight = self.weight();
        (dispersion / weight, over / weight, under / weight)
    }
}

fn quantile_inputs<'a>(args: &MetricArgs<'a>) -> Result<(&'a Matrix, &'a [f64])> {
    let predicted = args.predicted_matrix()?;
    let levels = args.quantile_levels()?;
    check_lengths(args.observed, predicted.nrow())?;
    if levels.len() != predicted.ncol() {
        bail!(
            "{} quantile levels for {} prediction columns",
            levels.len(),
            predicted.ncol()
        );
    }
    Ok((predicted, levels))
}

fn interval_component(
    args: &MetricArgs<'_>,
    pick: impl Fn((f64, f64, f64)) -> f64,
) -> Result<MetricOutput> {
    let (predicted, levels) = quantile_inputs(args)?;
    let intervals = Intervals::new(levels);
    if intervals.weight() == 0.0 {
        bail!("quantile levels contain neither a median nor a symmetric central interval");
    }
    let values = args
        .observed
        .iter()
        .zip(predicted.rows())
        .map(|(&y, row)| pick(intervals.decompose(y, row)))
        .collect::<Vec<f64>>();

    let mut output = MetricOutput::from(values);
    if !intervals.unpaired.is_empty() {
        let levels: Vec<String> = intervals.unpaired.iter().map(f64::to_string).collect();
        output = output.with_warning(format!(
            "quantile levels without a symmetric counterpart were ignored: {}",
            levels.join(", ")
        ));
    }
    Ok(output)
}

/// Weighted interval score.
///
/// Each central interval contributes its interval score weighted by `alpha / 2`,
/// the median its absolute error weighted by 1/2, and the sum is divided by the
/// total weight. Levels without a symmetric counterpart are dropped with a warning.
pub fn wis(args: &MetricArgs<'_>) -> Result<MetricOutput> {
    interval_component(args, |(d, o, u)| d + o + u)
}

/// Width component of the weighted interval score.
pub fn dispersion_quantile(args: &MetricArgs<'_>) -> Result<MetricOutput> {
    interval_component(args, |(d, _, _)| d)
}

/// Component of the weighted interval score from observations below the forecast.
pub fn overprediction_quantile(args: &MetricArgs<'_>) -> Result<MetricOutput> {
    interval_component(args, |(_, o, _)| o)
}

/// Component of the weighted interval score from observations above the forecast.
pub fn underprediction_quantile(args: &MetricArgs<'_>) -> Result<MetricOutput> {
    interval_component(args, |(_, _, u)| u)
}

/// Median prediction of one forecast, interpolated linearly between the nearest
/// levels around 0.5 when 0.5 itself is absent.
fn median_of(row: &[f64], levels: &[f64]) -> Result<f64> {
    if let Some(m) = find_level(levels, 0.5) {
        return Ok(row[m]);
    }
    let below = (0..levels.len())
        .filter(|&i| levels[i] < 0.5)
        .max_by(|&a, &b| levels[a].total_cmp(&levels[b]));
    let above = (0..levels.len())
        .filter(|&i| levels[i] > 0.5)
        .min_by(|&a, &b| levels[a].total_cmp(&levels[b]));
    let (Some(lo), Some(hi)) = (below, above) else {
        return Err(anyhow!(
            "can't interpolate the median without levels on both sides of 0.5"
        ));
    };
    let (ql, qh) = (levels[lo], levels[hi]);
    Ok((row[lo] * (qh - 0.5) + row[hi] * (0.5 - ql)) / (qh - ql))
}

/// Bias in [-1, 1] based on where the observation falls among the quantiles.
///
/// 0 when the observation equals the median. Below the median it is `1 - 2q`
/// for the highest level `q` whose prediction does not exceed the observation
/// (1 if the observation is below every quantile); above it, `1 - 2q` for the
/// lowest level whose prediction is at least the observation (-1 above every
/// quantile).
pub fn bias_quantile(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let (predicted, levels) = quantile_inputs(args)?;
    args.observed
        .iter()
        .zip(predicted.rows())
        .map(|(&y, row)| {
            let median = median_of(row, levels)?;
            let bias = if y == median {
                0.0
            } else if y < median {
                levels
                    .iter()
                    .zip(row)
                    .filter(|&(_, &p)| p <= y)
                    .map(|(&q, _)| q)
                    .reduce(f64::max)
                    .map_or(1.0, |q| 1.0 - 2.0 * q)
            } else {
                levels
                    .iter()
                    .zip(row)
                    .filter(|&(_, &p)| p >= y)
                    .map(|(&q, _)| q)
                    .reduce(f64::min)
                    .map_or(-1.0, |q| 1.0 - 2.0 * q)
            };
            Ok(bias)
        })
        .collect()
}

/// Absolute error of the median (level 0.5) prediction.
pub fn ae_median_quantile(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let (predicted, levels) = quantile_inputs(args)?;
    let m = find_level(levels, 0.5)
        .ok_or_else(|| anyhow!("no median (quantile level 0.5) in the forecast"))?;
    Ok(args
        .observed
        .iter()
        .zip(predicted.rows())
        .map(|(&y, row)| (y - row[m]).abs())
        .collect())
}

/// Pinball loss `2 (1{y <= p} - q) (p - y)` for every quantile.
///
/// Returns one value per forecast and level, so the score rows keep their
/// per-quantile detail.
pub fn quantile_score(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let (predicted, levels) = quantile_inputs(args)?;
    Ok(args
        .observed
        .iter()
        .zip(predicted.rows())
        .flat_map(|(&y, row)| {
            row.iter().zip(levels).map(move |(&p, &q)| {
                let below = if y <= p { 1.0 } else { 0.0 };
                2.0 * (below - q) * (p - y)
            })
        })
        .collect())
}

/// Whether the observation lies inside the central prediction interval of the
/// given range (in percent). Errors when either bound is not a forecast level.
#[derive(Debug, Clone, Copy)]
pub struct IntervalCoverage {
    range: f64,
}

impl IntervalCoverage {
    pub fn new(range: f64) -> Self {
        Self { range }
    }
}

impl Metric for IntervalCoverage {
    fn compute(&self, args: &MetricArgs<'_>) -> Result<MetricOutput> {
        let (predicted, levels) = quantile_inputs(args)?;
        let lower_level = (100.0 - self.range) / 200.0;
        let upper_level = 1.0 - lower_level;
        let (Some(l), Some(u)) = (find_level(levels, lower_level), find_level(levels, upper_level))
        else {
            bail!(
                "the {}% interval needs quantile levels {lower_level} and {upper_level}",
                self.range
            );
        };
        Ok(args
            .observed
            .iter()
            .zip(predicted.rows())
            .map(|(&y, row)| if row[l] <= y && y <= row[u] { 1.0 } else { 0.0 })
            .collect::<Vec<f64>>()
            .into())
    }
}
