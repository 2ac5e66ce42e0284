//! Scoring and aggregation.
//!
//! [`score`] applies a [`MetricSet`] to a validated [`Forecast`](crate::Forecast)
//! and returns [`Scores`]; [`summarise_scores`] aggregates those scores over
//! grouping columns. Each metric call goes through [`safe_call`], so a metric that
//! errors or panics on one batch only leaves missing values and a diagnostic.

pub mod engine;
pub mod metric;
mod safe_call;
pub mod scores;
pub mod summarise;

pub use engine::{ScoreOptions, score};
pub use metric::*;
pub use safe_call::safe_call;
pub use scores::*;
pub use summarise::*;
