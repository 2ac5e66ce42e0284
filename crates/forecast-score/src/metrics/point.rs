use anyhow::Result;

use super::check_lengths;
use crate::MetricArgs;

fn pairwise(args: &MetricArgs<'_>, f: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
    let predicted = args.predicted_vector()?;
    check_lengths(args.observed, predicted.len())?;
    Ok(args
        .observed
        .iter()
        .zip(predicted)
        .map(|(&y, &p)| f(y, p))
        .collect())
}

/// Absolute error `|observed - predicted|`.
pub fn ae_point(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    pairwise(args, |y, p| (y - p).abs())
}

/// Squared error `(observed - predicted)^2`.
pub fn se_point(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    pairwise(args, |y, p| (y - p).powi(2))
}

/// Absolute percentage error `|observed - predicted| / |observed|`. Infinite for
/// a zero observation.
pub fn ape(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    pairwise(args, |y, p| (y - p).abs() / y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Predicted};

    #[test]
    fn errors_per_forecast() {
        let options = Options::new();
        let args = MetricArgs {
            observed: &[1.0, 2.0, 4.0],
            predicted: Predicted::Vector(&[1.5, 1.0, 4.0]),
            quantile_level: None,
            options: &options,
        };
        assert_eq!(ae_point(&args).unwrap(), vec![0.5, 1.0, 0.0]);
        assert_eq!(se_point(&args).unwrap(), vec![0.25, 1.0, 0.0]);
        assert_eq!(ape(&args).unwrap(), vec![0.5, 0.5, 0.0]);
    }
}
