use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{Checked, Diagnostics, Metric, MetricArgs};

/// Calls `metric` and turns every failure mode into a diagnostic.
///
/// An `Err` or a panic gives `None` plus an error diagnostic with `source = name`;
/// warnings the metric returned become warning diagnostics. The caller's batch
/// carries on either way.
pub fn safe_call(name: &str, metric: &dyn Metric, args: &MetricArgs<'_>) -> Checked<Option<Vec<f64>>> {
    let mut diagnostics = Diagnostics::new();
    let outcome = catch_unwind(AssertUnwindSafe(|| metric.compute(args)));

    let values = match outcome {
        Ok(Ok(output)) => {
            for warning in output.warnings {
                diagnostics.warn(name, warning);
            }
            Some(output.values)
        }
        Ok(Err(err)) => {
            diagnostics.error(name, format!("computation failed: {err:#}"));
            None
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            diagnostics.error(name, format!("computation panicked: {message}"));
            None
        }
    };
    Checked::new(values, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricOutput, Options, Predicted, metric_fn};
    use anyhow::{Result, bail};

    fn args(options: &Options) -> MetricArgs<'_> {
        MetricArgs {
            observed: &[1.0, 2.0],
            predicted: Predicted::Vector(&[1.5, 2.5]),
            quantile_level: None,
            options,
        }
    }

    fn failing(_: &MetricArgs<'_>) -> Result<Vec<f64>> {
        bail!("no luck")
    }

    fn panicking(_: &MetricArgs<'_>) -> Result<Vec<f64>> {
        panic!("boom")
    }

    fn noisy(args: &MetricArgs<'_>) -> Result<MetricOutput> {
        Ok(MetricOutput::from(vec![0.0; args.len()]).with_warning("rounded"))
    }

    #[test]
    fn errors_become_diagnostics() {
        let options = Options::new();
        let result = safe_call("bad", &metric_fn(failing), &args(&options));
        assert_eq!(*result.value(), None);
        let diag = result.diagnostics().errors().next().unwrap();
        assert_eq!(diag.source, "bad");
        assert!(diag.message.contains("no luck"));
    }

    #[test]
    fn panics_are_caught() {
        let options = Options::new();
        let result = safe_call("explodes", &metric_fn(panicking), &args(&options));
        assert_eq!(*result.value(), None);
        assert!(result.diagnostics().errors().next().unwrap().message.contains("boom"));
    }

    #[test]
    fn metric_warnings_are_kept() {
        let options = Options::new();
        let result = safe_call("noisy", &metric_fn(noisy), &args(&options));
        assert_eq!(result.value().as_deref(), Some(&[0.0, 0.0][..]));
        assert_eq!(result.diagnostics().warnings().count(), 1);
    }
}
