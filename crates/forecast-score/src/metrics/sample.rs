use anyhow::Result;

use super::{check_lengths, mean, median, variance};
use crate::{Matrix, MetricArgs, ValueType, get_value_type};

/// Consistency factor that turns the median absolute deviation into an estimate
/// of the standard deviation under normality.
const MAD_CONSTANT: f64 = 1.4826;

fn per_forecast(args: &MetricArgs<'_>, f: impl Fn(f64, &[f64]) -> f64) -> Result<Vec<f64>> {
    let predicted = args.predicted_matrix()?;
    check_lengths(args.observed, predicted.nrow())?;
    Ok(args
        .observed
        .iter()
        .zip(predicted.rows())
        .map(|(&y, samples)| f(y, samples))
        .collect())
}

fn share_at_most(samples: &[f64], threshold: f64) -> f64 {
    samples.iter().filter(|&&x| x <= threshold).count() as f64 / samples.len() as f64
}

/// Bias in [-1, 1]: `1 - 2 P(X <= y)` for continuous samples and
/// `1 - (P(X <= y) + P(X <= y - 1))` when every sample is a whole number.
pub fn bias_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let predicted: &Matrix = args.predicted_matrix()?;
    let integer = get_value_type("predicted", predicted.as_slice())? == ValueType::Integer;
    per_forecast(args, |y, samples| {
        if integer {
            1.0 - (share_at_most(samples, y) + share_at_most(samples, y - 1.0))
        } else {
            1.0 - 2.0 * share_at_most(samples, y)
        }
    })
}

/// Dawid-Sebastiani score `(y - mean)^2 / var + ln(var)` using the sample mean and
/// variance.
pub fn dss_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    per_forecast(args, |y, samples| {
        let var = variance(samples);
        (y - mean(samples)).powi(2) / var + var.ln()
    })
}

/// Continuous ranked probability score of the empirical distribution of the
/// samples.
///
/// Uses `E|X - y| - E|X - X'| / 2`, with the pairwise term computed from the sorted
/// samples in `O(m log m)`.
pub fn crps_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    per_forecast(args, |y, samples| {
        let m = samples.len() as f64;
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let spread: f64 = sorted
            .iter()
            .enumerate()
            .map(|(i, x)| (2.0 * (i as f64 + 1.0) - m - 1.0) * x)
            .sum();
        mean(&sorted.iter().map(|x| (x - y).abs()).collect::<Vec<_>>()) - spread / (m * m)
    })
}

/// Median absolute deviation of the samples, scaled to be consistent with the
/// standard deviation. Ignores the observation.
pub fn mad_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    per_forecast(args, |_, samples| {
        let centre = median(samples);
        let deviations: Vec<f64> = samples.iter().map(|x| (x - centre).abs()).collect();
        MAD_CONSTANT * median(&deviations)
    })
}

/// Absolute error of the sample median.
pub fn ae_median_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    per_forecast(args, |y, samples| (y - median(samples)).abs())
}

/// Squared error of the sample mean.
pub fn se_mean_sample(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    per_forecast(args, |y, samples| (y - mean(samples)).powi(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Predicted};

    fn check(f: fn(&MetricArgs<'_>) -> Result<Vec<f64>>, observed: &[f64], rows: &[Vec<f64>]) -> Vec<f64> {
        let options = Options::new();
        let matrix = Matrix::from_rows(rows).unwrap();
        let args = MetricArgs {
            observed,
            predicted: Predicted::Matrix(&matrix),
            quantile_level: None,
            options: &options,
        };
        f(&args).unwrap()
    }

    #[test]
    fn crps_matches_pairwise_definition() {
        let samples = vec![0.5, 2.0, 1.0, 3.5];
        let y = 1.7;
        let m = samples.len() as f64;
        let direct = samples.iter().map(|x: &f64| (x - y).abs()).sum::<f64>() / m
            - samples
                .iter()
                .flat_map(|a| samples.iter().map(move |b| (a - b).abs()))
                .sum::<f64>()
                / (2.0 * m * m);
        let crps = check(crps_sample, &[y], &[samples]);
        assert!((crps[0] - direct).abs() < 1e-12);
    }

    #[test]
    fn crps_of_a_point_mass_is_absolute_error() {
        let crps = check(crps_sample, &[3.0], &[vec![1.0, 1.0, 1.0]]);
        assert!((crps[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bias_sign_follows_the_forecast() {
        let too_high = check(bias_sample, &[0.0], &[vec![1.5, 2.5, 3.5]]);
        let too_low = check(bias_sample, &[10.0], &[vec![1.5, 2.5, 3.5]]);
        assert_eq!(too_high, vec![1.0]);
        assert_eq!(too_low, vec![-1.0]);
    }

    #[test]
    fn integer_bias_uses_both_cdf_points() {
        // P(X <= 2) = 2/4, P(X <= 1) = 1/4
        let bias = check(bias_sample, &[2.0], &[vec![1.0, 2.0, 3.0, 4.0]]);
        assert!((bias[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn spread_and_location_errors() {
        let rows = [vec![1.0, 2.0, 3.0, 4.0, 5.0]];
        assert!((check(mad_sample, &[0.0], &rows)[0] - MAD_CONSTANT).abs() < 1e-12);
        assert_eq!(check(ae_median_sample, &[1.0], &rows), vec![2.0]);
        assert_eq!(check(se_mean_sample, &[1.0], &rows), vec![4.0]);
        let dss = check(dss_sample, &[3.0], &rows)[0];
        assert!((dss - 2.5f64.ln()).abs() < 1e-12);
    }
}
