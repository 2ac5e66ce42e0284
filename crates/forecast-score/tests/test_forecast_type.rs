use forecast_score::{
    Column, ErrorClass, ForecastOptions, ForecastType, ScoreError, Table, as_forecast,
    get_forecast_type, validate_forecast,
};
use rstest::*;

fn base(observed: Column, predicted: Column) -> Vec<(&'static str, Column)> {
    vec![
        ("model", Column::text(["a", "a"])),
        ("observed", observed),
        ("predicted", predicted),
    ]
}

#[rstest]
#[case::point(vec![], ForecastType::Point)]
#[case::sample(vec![("sample_id", Column::int([1, 2]))], ForecastType::Sample)]
#[case::quantile(vec![("quantile_level", Column::float([0.25, 0.75]))], ForecastType::Quantile)]
#[case::quantile_wins_over_sample(
    vec![("sample_id", Column::int([1, 2])), ("quantile_level", Column::float([0.25, 0.75]))],
    ForecastType::Quantile
)]
fn test_numeric_observed_types(
    #[case] extra: Vec<(&'static str, Column)>,
    #[case] expected: ForecastType,
) {
    let mut columns = base(Column::float([1.0, 1.0]), Column::float([0.5, 1.5]));
    columns.extend(extra);
    let table = Table::from_columns(columns).unwrap();
    assert_eq!(get_forecast_type(&table).unwrap(), expected);
}

#[rstest]
fn test_factor_observed_is_binary_even_with_quantile_level() {
    let mut columns = base(Column::factor(["no", "yes"]), Column::float([0.2, 0.9]));
    columns.push(("quantile_level", Column::float([0.5, 0.5])));
    let table = Table::from_columns(columns).unwrap();
    assert_eq!(get_forecast_type(&table).unwrap(), ForecastType::Binary);

    let forecast = as_forecast(table, &ForecastOptions::default()).unwrap();
    assert_eq!(forecast.forecast_type(), ForecastType::Binary);
    assert!(
        forecast
            .diagnostics()
            .warnings()
            .any(|d| d.message.contains("quantile_level"))
    );
}

#[rstest]
fn test_missing_required_columns_are_listed() {
    let table = Table::from_columns([("model", Column::text(["a"]))]).unwrap();
    let err = get_forecast_type(&table).unwrap_err();
    assert_eq!(
        err,
        ScoreError::MissingColumns {
            columns: vec!["observed".to_string(), "predicted".to_string()]
        }
    );
    assert_eq!(err.class(), ErrorClass::InvalidInput);
}

#[rstest]
fn test_text_predicted_matches_nothing() {
    let table = Table::from_columns(base(Column::float([1.0, 2.0]), Column::text(["x", "y"]))).unwrap();
    let err = get_forecast_type(&table).unwrap_err();
    assert!(matches!(err, ScoreError::NoForecastType { .. }));
    assert!(err.to_string().contains("predicted"));
}

#[rstest]
fn test_text_observed_hints_at_factor() {
    let table = Table::from_columns(base(Column::text(["x", "y"]), Column::float([0.1, 0.2]))).unwrap();
    let err = get_forecast_type(&table).unwrap_err();
    assert!(err.to_string().contains("factor"));
}

#[rstest]
fn test_requested_type_mismatch_is_a_warning() {
    let table = Table::from_columns(base(Column::float([1.0, 2.0]), Column::float([1.0, 2.0]))).unwrap();
    let options = ForecastOptions::builder()
        .forecast_type(ForecastType::Sample)
        .build();
    let forecast = as_forecast(table, &options).unwrap();
    assert_eq!(forecast.forecast_type(), ForecastType::Point);
    assert!(forecast.diagnostics().from_source("forecast_type").any(|d| d.is_warning()));
}

#[rstest]
#[case::probability_above_one(Column::factor(["no", "yes"]), Column::float([0.2, 1.2]), "predicted")]
#[case::valid(Column::factor(["a", "b"]), Column::float([0.2, 0.3]), "")]
fn test_binary_validation(#[case] observed: Column, #[case] predicted: Column, #[case] column: &str) {
    let table = Table::from_columns(base(observed, predicted)).unwrap();
    let result = as_forecast(table, &ForecastOptions::default());
    if column.is_empty() {
        assert!(result.is_ok());
    } else {
        match result.unwrap_err() {
            ScoreError::InvalidValues { column: bad, .. } => assert_eq!(bad, column),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[rstest]
fn test_binary_needs_exactly_two_levels() {
    let observed = Column::factor_with_levels(["a", "b"], ["a", "b", "c"]).unwrap();
    let table = Table::from_columns(base(observed, Column::float([0.2, 0.3]))).unwrap();
    let err = as_forecast(table, &ForecastOptions::default()).unwrap_err();
    assert!(err.to_string().contains("two levels"));
}

#[rstest]
fn test_quantile_levels_outside_unit_interval_fail() {
    let mut columns = base(Column::float([1.0, 1.0]), Column::float([0.5, 1.5]));
    columns.push(("quantile_level", Column::float([0.5, 1.5])));
    let table = Table::from_columns(columns).unwrap();
    let err = as_forecast(table, &ForecastOptions::default()).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidValues { ref column, .. } if column == "quantile_level"));
}

#[rstest]
fn test_validate_forecast_flags_stale_type() {
    let mut columns = base(Column::float([1.0, 1.0]), Column::float([0.5, 1.5]));
    columns.push(("sample_id", Column::int([1, 2])));
    let table = Table::from_columns(columns).unwrap();
    let mut forecast = as_forecast(table, &ForecastOptions::default()).unwrap();
    assert_eq!(forecast.forecast_type(), ForecastType::Sample);

    forecast.table_mut().remove_column("sample_id");
    let checked = validate_forecast(&forecast).unwrap();
    assert_eq!(*checked.value(), ForecastType::Point);
    assert!(checked.diagnostics().from_source("forecast_type").any(|d| d.is_warning()));
}
