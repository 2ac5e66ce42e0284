use crate::{QUANTILE_LEVEL, SAMPLE_ID, ScoreError, Table, Tabular, get_forecast_unit};

/// Rows that share a forecast unit and, where present, a `sample_id` or
/// `quantile_level` with at least one other row.
///
/// Each such combination should identify exactly one prediction. Rows are returned
/// in their original order and the input is left untouched. Without an explicit
/// `forecast_unit` the unit is inferred from the column names.
#[tracing::instrument(name = "fscore.duplicates", level = "debug", skip_all)]
pub fn get_duplicate_forecasts(
    data: &impl Tabular,
    forecast_unit: Option<&[String]>,
) -> Result<Table, ScoreError> {
    let table = data.table();
    let mut keys = match forecast_unit {
        Some(unit) => unit.to_vec(),
        None => get_forecast_unit(data),
    };
    for column in [SAMPLE_ID, QUANTILE_LEVEL] {
        if table.has_column(column) && !keys.iter().any(|k| k == column) {
            keys.push(column.to_string());
        }
    }

    let groups = table.group_indices(&keys)?;
    let mut rows: Vec<usize> = groups
        .values()
        .filter(|rows| rows.len() > 1)
        .flatten()
        .copied()
        .collect();
    rows.sort_unstable();
    tracing::debug!(duplicates = rows.len(), "duplicate scan complete");
    Ok(table.take(&rows))
}
