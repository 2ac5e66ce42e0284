//! Default scoring rules.
//!
//! Every rule follows the [`Metric`](crate::Metric) contract: it receives the
//! observations of a batch and returns one value per forecast. Lower is better for
//! all of them except the coverage metrics, which are 0/1 indicators, and `bias`,
//! which is best at 0.

pub mod binary;
pub mod point;
pub mod quantile;
pub mod sample;

use crate::{ForecastType, MetricSet, metric_fn};

pub use quantile::IntervalCoverage;

/// The default metrics for a forecast type, in output column order.
pub fn get_metrics(forecast_type: ForecastType) -> MetricSet {
    match forecast_type {
        ForecastType::Binary => MetricSet::new()
            .with("brier_score", metric_fn(binary::brier_score))
            .with("log_score", metric_fn(binary::log_score)),
        ForecastType::Point => MetricSet::new()
            .with("ae_point", metric_fn(point::ae_point))
            .with("se_point", metric_fn(point::se_point))
            .with("ape", metric_fn(point::ape)),
        ForecastType::Sample => MetricSet::new()
            .with("bias", metric_fn(sample::bias_sample))
            .with("dss", metric_fn(sample::dss_sample))
            .with("crps", metric_fn(sample::crps_sample))
            .with("mad", metric_fn(sample::mad_sample))
            .with("ae_median", metric_fn(sample::ae_median_sample))
            .with("se_mean", metric_fn(sample::se_mean_sample)),
        ForecastType::Quantile => MetricSet::new()
            .with("wis", metric_fn(quantile::wis))
            .with("overprediction", metric_fn(quantile::overprediction_quantile))
            .with("underprediction", metric_fn(quantile::underprediction_quantile))
            .with("dispersion", metric_fn(quantile::dispersion_quantile))
            .with("bias", metric_fn(quantile::bias_quantile))
            .with("interval_coverage_50", IntervalCoverage::new(50.0))
            .with("interval_coverage_90", IntervalCoverage::new(90.0))
            .with("ae_median", metric_fn(quantile::ae_median_quantile)),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even lengths. NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample variance with an n - 1 denominator. NaN for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub(crate) fn check_lengths(observed: &[f64], predicted: usize) -> anyhow::Result<()> {
    if observed.len() != predicted {
        anyhow::bail!(
            "`observed` has {} values but `predicted` has {predicted} forecasts",
            observed.len()
        );
    }
    Ok(())
}
