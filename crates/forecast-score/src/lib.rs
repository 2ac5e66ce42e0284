//! Scoring of probabilistic and point forecasts held in tables.
//!
//! A raw [`Table`] becomes a typed [`Forecast`] through [`as_forecast`], which
//! infers whether it is a binary, point, sample or quantile forecast and records
//! anything suspicious as [`Diagnostics`]. [`score`] applies a [`MetricSet`]
//! (by default [`get_metrics`]) per forecast and [`summarise_scores`] aggregates
//! the resulting [`Scores`].
//!
//! ```
//! use forecast_score::{ForecastOptions, ScoreOptions, SummariseOptions, as_forecast,
//!     get_metrics, score, summarise_scores, table};
//!
//! let data = table! {
//!     "model" => vec!["a", "a", "b"],
//!     "day" => vec![1_i64, 2, 1],
//!     "observed" => vec![1.0, 2.0, 3.0],
//!     "predicted" => vec![1.1, 1.9, 3.2],
//! }?;
//! let forecast = as_forecast(data, &ForecastOptions::default())?;
//! let metrics = get_metrics(forecast.forecast_type());
//! let scores = score(&forecast, &metrics, &ScoreOptions::default())?;
//! let by_model = summarise_scores(
//!     &scores,
//!     &SummariseOptions::builder().by(vec!["model".to_string()]).build(),
//! )?;
//! assert_eq!(by_model.table().nrow(), 2);
//! # Ok::<(), forecast_score::ScoreError>(())
//! ```

pub mod core;
pub mod data;
pub mod evaluate;
pub mod forecast;
pub mod metrics;
pub mod utils;

pub use core::*;
pub use data::*;
pub use evaluate::*;
pub use forecast::*;
pub use metrics::get_metrics;
pub use utils::*;

/// Builds a [`Table`] from `name => column` pairs, where each column is anything
/// that converts into a [`Column`]. Evaluates to `Result<Table, ScoreError>`.
#[macro_export]
macro_rules! table {
    { $($name:expr => $column:expr),* $(,)? } => {
        $crate::Table::from_columns([
            $(($name, $crate::Column::from($column))),*
        ])
    };
}
