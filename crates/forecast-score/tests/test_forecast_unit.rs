use forecast_score::{
    Column, ForecastOptions, PROTECTED_COLUMNS, ScoreError, Table, as_forecast, get_forecast_unit,
    get_protected_columns, set_forecast_unit,
};
use proptest::prelude::*;
use rstest::*;

#[fixture]
fn samples() -> Table {
    Table::from_columns([
        ("model", Column::text(["a", "a", "b", "b"])),
        ("location", Column::text(["x", "x", "x", "x"])),
        ("run", Column::int([1, 2, 3, 4])),
        ("truth", Column::float([2.0, 2.0, 2.0, 2.0])),
        ("value", Column::float([1.0, 3.0, 2.0, 2.5])),
        ("draw", Column::int([1, 2, 1, 2])),
    ])
    .unwrap()
}

#[rstest]
fn test_as_forecast_renames_columns(samples: Table) {
    let options = ForecastOptions::builder()
        .observed("truth")
        .predicted("value")
        .sample_id("draw")
        .forecast_unit(vec!["model".to_string(), "location".to_string()])
        .build();
    let forecast = as_forecast(samples, &options).unwrap();

    assert_eq!(forecast.forecast_unit(), ["model", "location"]);
    assert_eq!(
        forecast.table().column_names(),
        vec!["model", "location", "observed", "predicted", "sample_id"]
    );
    assert!(forecast.diagnostics().warnings().next().is_none());
}

#[rstest]
fn test_overspecified_unit_is_flagged(samples: Table) {
    let options = ForecastOptions::builder()
        .observed("truth")
        .predicted("value")
        .sample_id("draw")
        .build();
    let forecast = as_forecast(samples, &options).unwrap();

    assert_eq!(forecast.forecast_unit(), ["model", "location", "run"]);
    assert!(
        forecast
            .diagnostics()
            .from_source("forecast_unit")
            .any(|d| d.is_warning() && d.message.contains("run"))
    );
}

#[rstest]
fn test_set_forecast_unit_rejects_unknown_columns(samples: Table) {
    let err = set_forecast_unit(&samples, &["horizon".to_string()]).unwrap_err();
    assert_eq!(
        err,
        ScoreError::UnknownColumn {
            column: "horizon".to_string()
        }
    );
}

#[rstest]
fn test_rename_of_missing_source_fails(samples: Table) {
    let options = ForecastOptions::builder().observed("nope").build();
    assert!(as_forecast(samples, &options).is_err());
}

#[rstest]
fn test_unit_may_be_empty() {
    let table = Table::from_columns([
        ("observed", Column::float([1.0])),
        ("predicted", Column::float([1.0])),
    ])
    .unwrap();
    assert!(get_forecast_unit(&table).is_empty());
}

const POOL: &[&str] = &[
    "model",
    "location",
    "target_end_date",
    "horizon",
    "observed",
    "predicted",
    "sample_id",
    "quantile_level",
    "interval_coverage_50",
    "wis_relative_skill",
    "pit_value",
    "boundary",
];

proptest! {
    #[test]
    fn unit_and_protected_partition_the_columns(mask in prop::collection::vec(any::<bool>(), POOL.len())) {
        let names: Vec<&str> = POOL
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| *name)
            .collect();
        let table = Table::from_columns(names.iter().map(|name| (*name, Column::float([1.0])))).unwrap();

        let unit = get_forecast_unit(&table);
        let protected = get_protected_columns(&table);
        prop_assert!(unit.iter().all(|name| !protected.contains(name)));
        prop_assert!(unit.iter().all(|name| !PROTECTED_COLUMNS.contains(&name.as_str())));

        let mut all: Vec<String> = unit.into_iter().chain(protected).collect();
        all.sort();
        let mut expected: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        expected.sort();
        prop_assert_eq!(all, expected);
    }
}
