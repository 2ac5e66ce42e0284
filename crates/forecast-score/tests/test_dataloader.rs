use forecast_score::{
    Column, ColumnKind, DataLoader, ForecastOptions, ForecastType, LoadOptions, Table, as_forecast,
};
use rstest::*;
use std::fs;
use tempfile::tempdir;

#[rstest]
fn test_csv_kinds_are_inferred() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecasts.csv");
    fs::write(
        &path,
        "model,day,observed,predicted,flag\na,1,1.5,2,true\nb,2,NA,2.5,false\n",
    )
    .unwrap();

    let table = DataLoader::load_csv(path.to_str().unwrap(), ',', &LoadOptions::default()).unwrap();
    let kinds: Vec<ColumnKind> = table.columns().map(|(_, c)| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnKind::Text,
            ColumnKind::Int,
            ColumnKind::Float,
            ColumnKind::Float,
            ColumnKind::Bool
        ]
    );
    assert!(table.column("observed").unwrap().is_missing(1));
}

#[rstest]
fn test_factor_columns_make_binary_forecasts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("binary.csv");
    fs::write(&path, "day,observed,predicted\n1,yes,0.7\n2,no,0.4\n").unwrap();

    let options = LoadOptions::builder()
        .factor_columns(vec!["observed".to_string()])
        .build();
    let table = DataLoader::load_csv(path.to_str().unwrap(), ',', &options).unwrap();
    let forecast = as_forecast(table, &ForecastOptions::default()).unwrap();
    assert_eq!(forecast.forecast_type(), ForecastType::Binary);
}

#[rstest]
#[case::csv(false)]
#[case::json(true)]
fn test_save_and_load_round_trip(#[case] json: bool) {
    let dir = tempdir().unwrap();
    let table = Table::from_columns([
        ("model", Column::text_opt([Some("a"), None])),
        ("day", Column::int([1, 2])),
        ("wis", Column::float_opt([Some(0.25), None])),
    ])
    .unwrap();

    let loaded = if json {
        let path = dir.path().join("scores.jsonl");
        let path = path.to_str().unwrap();
        DataLoader::save_json(path, &table, true).unwrap();
        DataLoader::load_json(path, true, &LoadOptions::default()).unwrap()
    } else {
        let path = dir.path().join("scores.csv");
        let path = path.to_str().unwrap();
        DataLoader::save_csv(path, &table, ',').unwrap();
        DataLoader::load_csv(path, ',', &LoadOptions::default()).unwrap()
    };
    assert_eq!(loaded, table);
}

#[rstest]
fn test_missing_file_has_context() {
    let err = DataLoader::load_csv("/nonexistent/forecasts.csv", ',', &LoadOptions::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("failed to open"));
}
