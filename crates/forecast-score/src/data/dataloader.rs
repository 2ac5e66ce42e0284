use anyhow::{Context, Result, anyhow};
use bon::Builder;
use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use std::fs;
use tracing::debug;

use crate::{Column, Factor, Table};

/// How cells are read when loading a table.
#[derive(Builder, Debug, Clone)]
pub struct LoadOptions {
    /// Columns converted to factors after loading, e.g. a binary `observed`.
    #[builder(default)]
    pub factor_columns: Vec<String>,
    /// Cell contents read as missing.
    #[builder(default = vec![String::new(), "NA".to_string()])]
    pub na_values: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Reads and writes forecast and score tables.
///
/// Column kinds are inferred per column: integers, then floats, then booleans,
/// falling back to text. A column that is entirely missing is read as float.
pub struct DataLoader;

impl DataLoader {
    #[tracing::instrument(name = "fscore.load_csv", level = "debug", skip(options))]
    pub fn load_csv(path: &str, delimiter: char, options: &LoadOptions) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("failed to open `{path}`"))?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed record at row {}", idx + 1))?;
            for (col, cell) in record.iter().enumerate() {
                if col >= cells.len() {
                    return Err(anyhow!("row {} has more fields than the header", idx + 1));
                }
                let missing = options.na_values.iter().any(|na| na == cell);
                cells[col].push((!missing).then(|| cell.to_string()));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| (name, infer_column(cells)));
        let table = finish(Table::from_columns(columns)?, options)?;
        debug!(rows = table.nrow(), cols = table.ncol(), "csv loaded");
        Ok(table)
    }

    /// Loads a JSON array of objects, or one object per line when `lines` is set.
    #[tracing::instrument(name = "fscore.load_json", level = "debug", skip(options))]
    pub fn load_json(path: &str, lines: bool, options: &LoadOptions) -> Result<Table> {
        let data = fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))?;

        let records: Vec<serde_json::Map<String, serde_json::Value>> = if lines {
            data.lines()
                .filter(|line| !line.trim().is_empty())
                .enumerate()
                .map(|(idx, line)| {
                    serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line)
                        .with_context(|| format!("invalid JSON object at line {}", idx + 1))
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            serde_json::from_str(&data).context("expected a JSON array of objects")?
        };

        let mut cells: IndexMap<String, Vec<Option<serde_json::Value>>> = IndexMap::new();
        for (row, record) in records.iter().enumerate() {
            for key in record.keys() {
                cells
                    .entry(key.clone())
                    .or_insert_with(|| vec![None; row]);
            }
            for (key, column) in cells.iter_mut() {
                let value = record.get(key).filter(|v| !v.is_null()).cloned();
                column.push(value);
            }
        }

        let columns = cells
            .into_iter()
            .map(|(name, values)| (name, json_column(values, &options.na_values)));
        let table = finish(Table::from_columns(columns)?, options)?;
        debug!(rows = table.nrow(), cols = table.ncol(), "json loaded");
        Ok(table)
    }

    pub fn save_csv(path: &str, table: &Table, delimiter: char) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter as u8)
            .from_path(path)
            .with_context(|| format!("failed to create `{path}`"))?;
        writer.write_record(table.names())?;
        for row in 0..table.nrow() {
            writer.write_record(
                table
                    .columns()
                    .map(|(_, column)| column.get(row).to_string())
                    .collect::<Vec<String>>(),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save_json(path: &str, table: &Table, lines: bool) -> Result<()> {
        let records = table.to_records();
        let data = if lines {
            records
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<String>, _>>()?
                .join("\n")
        } else {
            serde_json::to_string(&records)?
        };
        fs::write(path, data).with_context(|| format!("failed to write `{path}`"))?;
        Ok(())
    }
}

fn finish(mut table: Table, options: &LoadOptions) -> Result<Table> {
    for name in &options.factor_columns {
        let column = table
            .column(name)
            .ok_or_else(|| anyhow!("factor column `{name}` not found"))?;
        let factor = Factor::from_values((0..column.len()).map(|row| {
            let value = column.get(row);
            (!value.is_missing()).then(|| value.to_string())
        }));
        table.insert_column(name.clone(), Column::Factor(factor))?;
    }
    Ok(table)
}

fn infer_column(cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten();

    if present().next().is_none() {
        return Column::Float(vec![None; cells.len()]);
    }
    if present().all(|c| c.parse::<i64>().is_ok()) {
        return Column::Int(
            cells
                .iter()
                .map(|c| c.as_ref().and_then(|c| c.parse().ok()))
                .collect(),
        );
    }
    if present().all(|c| c.parse::<f64>().is_ok()) {
        return Column::Float(
            cells
                .iter()
                .map(|c| c.as_ref().and_then(|c| c.parse().ok()))
                .collect(),
        );
    }
    if present().all(|c| parse_bool(c).is_some()) {
        return Column::Bool(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(parse_bool))
                .collect(),
        );
    }
    Column::Text(cells)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "TRUE" | "True" => Some(true),
        "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn json_column(values: Vec<Option<serde_json::Value>>, na_values: &[String]) -> Column {
    use serde_json::Value as Json;

    let values: Vec<Option<Json>> = values
        .into_iter()
        .map(|v| match v {
            Some(Json::String(s)) if na_values.contains(&s) => None,
            other => other,
        })
        .collect();
    let present = || values.iter().flatten();

    if present().next().is_none() {
        return Column::Float(vec![None; values.len()]);
    }
    if present().all(|v| v.is_i64()) {
        return Column::Int(values.iter().map(|v| v.as_ref().and_then(Json::as_i64)).collect());
    }
    if present().all(Json::is_number) {
        return Column::Float(values.iter().map(|v| v.as_ref().and_then(Json::as_f64)).collect());
    }
    if present().all(Json::is_boolean) {
        return Column::Bool(values.iter().map(|v| v.as_ref().and_then(Json::as_bool)).collect());
    }
    Column::Text(
        values
            .iter()
            .map(|v| {
                v.as_ref().map(|v| match v {
                    Json::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_win_over_floats() {
        let column = infer_column(vec![Some("1".into()), None, Some("3".into())]);
        assert_eq!(column, Column::Int(vec![Some(1), None, Some(3)]));
    }

    #[test]
    fn mixed_numbers_are_floats() {
        let column = infer_column(vec![Some("1".into()), Some("0.5".into())]);
        assert_eq!(column, Column::Float(vec![Some(1.0), Some(0.5)]));
    }

    #[test]
    fn anything_else_is_text() {
        let column = infer_column(vec![Some("a".into()), Some("1".into())]);
        assert_eq!(column.kind(), crate::ColumnKind::Text);
    }
}
