use forecast_score::{
    Column, ErrorClass, Median, Round, ScoreError, Scores, SummariseOptions, Table, new_scores,
    reducer_fn, summarise_scores,
};
use rstest::*;
use serde_json::json;
use std::sync::Arc;

fn floats(table: &Table, column: &str) -> Vec<Option<f64>> {
    let column = table.column(column).unwrap();
    (0..table.nrow()).map(|row| column.numeric_at(row)).collect()
}

#[fixture]
fn scores() -> Scores {
    let table = Table::from_columns([
        ("model", Column::text(["a", "a", "b", "b"])),
        ("location", Column::text(["x", "y", "x", "y"])),
        ("wis", Column::float([1.0, 2.0, 3.0, 5.0])),
        ("ae_median", Column::float_opt([Some(0.5), None, Some(1.0), Some(2.0)])),
    ])
    .unwrap();
    new_scores(table, vec!["wis".to_string(), "ae_median".to_string()])
}

fn by(columns: &[&str]) -> SummariseOptions {
    SummariseOptions::builder()
        .by(columns.iter().map(|c| c.to_string()).collect())
        .build()
}

#[rstest]
fn test_by_and_across_conflict(scores: Scores) {
    let options = SummariseOptions::builder()
        .by(vec!["model".to_string()])
        .across(vec!["location".to_string()])
        .build();
    let err = summarise_scores(&scores, &options).unwrap_err();
    assert_eq!(err, ScoreError::ByAndAcross);
    assert_eq!(err.class(), ErrorClass::InvalidArgument);
}

#[rstest]
fn test_across_must_be_in_unit(scores: Scores) {
    let options = SummariseOptions::builder().across(vec!["wis".to_string()]).build();
    assert_eq!(
        summarise_scores(&scores, &options).unwrap_err(),
        ScoreError::AcrossNotInForecastUnit {
            columns: vec!["wis".to_string()]
        }
    );
}

#[rstest]
fn test_unknown_by_column(scores: Scores) {
    let err = summarise_scores(&scores, &by(&["horizon"])).unwrap_err();
    assert!(matches!(err, ScoreError::UnknownColumn { .. }));
}

#[rstest]
fn test_by_model_takes_means(scores: Scores) {
    let summary = summarise_scores(&scores, &by(&["model"])).unwrap();
    let table = summary.table();
    assert_eq!(table.column_names(), vec!["model", "wis", "ae_median"]);
    assert_eq!(floats(table, "wis"), vec![Some(1.5), Some(4.0)]);
    // missing values propagate unless na_rm is set
    assert_eq!(floats(table, "ae_median"), vec![None, Some(1.5)]);
    assert!(summary.diagnostics().from_source("summarise").next().is_some());
}

#[rstest]
fn test_across_is_the_complement_of_by(scores: Scores) {
    let across = SummariseOptions::builder()
        .across(vec!["location".to_string()])
        .build();
    let a = summarise_scores(&scores, &across).unwrap();
    let b = summarise_scores(&scores, &by(&["model"])).unwrap();
    assert_eq!(a.table(), b.table());
}

#[rstest]
fn test_na_rm_drops_missing_scores(scores: Scores) {
    let mut params = forecast_score::Options::new();
    params.insert("na_rm".to_string(), json!(true));
    let options = SummariseOptions::builder()
        .by(vec!["model".to_string()])
        .params(params)
        .build();
    let summary = summarise_scores(&scores, &options).unwrap();
    assert_eq!(floats(summary.table(), "ae_median"), vec![Some(0.5), Some(1.5)]);
}

#[rstest]
fn test_default_summary_is_idempotent(scores: Scores) {
    let once = summarise_scores(&scores, &SummariseOptions::default()).unwrap();
    let twice = summarise_scores(&once, &SummariseOptions::default()).unwrap();
    assert_eq!(once.table(), scores.table());
    assert_eq!(twice.table(), once.table());
    assert_eq!(twice.score_names(), scores.score_names());
}

#[rstest]
fn test_chained_summaries_only_touch_metrics(scores: Scores) {
    let mut params = forecast_score::Options::new();
    params.insert("digits".to_string(), json!(0));
    let means = summarise_scores(&scores, &by(&["model"])).unwrap();
    let rounded = summarise_scores(
        &means,
        &SummariseOptions::builder()
            .by(vec!["model".to_string()])
            .fun(Arc::new(Round))
            .params(params)
            .build(),
    )
    .unwrap();

    assert_eq!(rounded.table().column_names(), means.table().column_names());
    assert_eq!(floats(rounded.table(), "wis"), vec![Some(2.0), Some(4.0)]);
}

#[rstest]
fn test_custom_reducers(scores: Scores) {
    let options = SummariseOptions::builder()
        .by(vec!["location".to_string()])
        .fun(Arc::new(reducer_fn("range", |values: &[f64]| {
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                - values.iter().copied().fold(f64::INFINITY, f64::min)
        })))
        .build();
    let summary = summarise_scores(&scores, &options).unwrap();
    assert_eq!(floats(summary.table(), "wis"), vec![Some(2.0), Some(3.0)]);

    let median = SummariseOptions::builder()
        .by(vec!["model".to_string()])
        .fun(Arc::new(Median))
        .build();
    let summary = summarise_scores(&scores, &median).unwrap();
    assert_eq!(floats(summary.table(), "wis"), vec![Some(1.5), Some(4.0)]);
}

#[rstest]
fn test_needs_score_names() {
    let table = Table::from_columns([("wis", Column::float([1.0]))]).unwrap();
    let err = summarise_scores(&Scores::from_table(table), &SummariseOptions::default()).unwrap_err();
    assert_eq!(err, ScoreError::MissingScoreNames);
}
