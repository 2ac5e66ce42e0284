use anyhow::{Result, bail};

use super::check_lengths;
use crate::MetricArgs;

/// Binary outcomes as 0/1 and the matching probabilities. `observed` holds the
/// factor code, so 1 means the second level.
fn outcomes<'a>(args: &MetricArgs<'a>) -> Result<(&'a [f64], &'a [f64])> {
    let predicted = args.predicted_vector()?;
    check_lengths(args.observed, predicted.len())?;
    if let Some(bad) = args.observed.iter().find(|&&y| y != 0.0 && y != 1.0) {
        bail!("binary outcomes must be 0 or 1, found {bad}");
    }
    if predicted.iter().any(|p| !(0.0..=1.0).contains(p)) {
        bail!("probabilities must be between 0 and 1");
    }
    Ok((args.observed, predicted))
}

/// Brier score `(observed - predicted)^2`.
pub fn brier_score(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let (observed, predicted) = outcomes(args)?;
    Ok(observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .collect())
}

/// Negative log of the probability assigned to what happened.
pub fn log_score(args: &MetricArgs<'_>) -> Result<Vec<f64>> {
    let (observed, predicted) = outcomes(args)?;
    Ok(observed
        .iter()
        .zip(predicted)
        .map(|(&y, &p)| if y == 1.0 { -p.ln() } else { -(1.0 - p).ln() })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Predicted};

    #[test]
    fn brier_and_log_score() {
        let options = Options::new();
        let args = MetricArgs {
            observed: &[1.0, 0.0],
            predicted: Predicted::Vector(&[0.8, 0.8]),
            quantile_level: None,
            options: &options,
        };
        let brier = brier_score(&args).unwrap();
        assert!((brier[0] - 0.04).abs() < 1e-12);
        assert!((brier[1] - 0.64).abs() < 1e-12);
        let log = log_score(&args).unwrap();
        assert!((log[0] + 0.8f64.ln()).abs() < 1e-12);
        assert!((log[1] + 0.2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_binary_outcomes() {
        let options = Options::new();
        let args = MetricArgs {
            observed: &[2.0],
            predicted: Predicted::Vector(&[0.5]),
            quantile_level: None,
            options: &options,
        };
        assert!(brier_score(&args).is_err());
    }
}
