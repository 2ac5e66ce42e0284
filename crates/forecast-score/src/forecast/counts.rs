use crate::{Column, Forecast, ScoreError, Table, get_forecast_unit};

/// Number of distinct forecasts per group of `by` (default: the forecast unit).
///
/// A forecast is one forecast-unit group, so for sample and quantile forecasts the
/// rows belonging to one forecast are counted once. The result has the `by`
/// columns followed by an integer `count` column.
pub fn get_forecast_counts(forecast: &Forecast, by: Option<&[String]>) -> Result<Table, ScoreError> {
    let table = forecast.table();
    let unit = get_forecast_unit(forecast);
    let by = by.map(<[String]>::to_vec).unwrap_or_else(|| unit.clone());

    let forecasts: Vec<usize> = table
        .group_indices(&unit)?
        .values()
        .map(|rows| rows[0])
        .collect();
    let firsts = table.take(&forecasts);

    let groups = firsts.group_indices(&by)?;
    let heads: Vec<usize> = groups.values().map(|rows| rows[0]).collect();
    let counts = groups.values().map(|rows| rows.len() as i64);

    let mut out = firsts.select(&by)?.take(&heads);
    out.insert_column("count", Column::int(counts))?;
    Ok(out)
}
