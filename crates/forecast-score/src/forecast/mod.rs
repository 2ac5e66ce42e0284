mod counts;
mod duplicates;
pub mod kind;
mod object;
pub mod protected;
mod validate;

pub use counts::get_forecast_counts;
pub use duplicates::get_duplicate_forecasts;
pub use kind::*;
pub use object::{Forecast, ForecastData, ForecastMeta};
pub use protected::*;
pub use validate::{ForecastOptions, as_forecast, set_forecast_unit, validate_forecast};
