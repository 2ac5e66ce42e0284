use indexmap::IndexMap;

use crate::{Column, ScoreError, Value};

/// Row groups keyed by the values of the grouping columns, in order of first
/// appearance.
pub type Groups = IndexMap<Vec<Value>, Vec<usize>>;

/// Column-oriented in-memory table.
///
/// Column order is preserved and is the order used by every operation that lists
/// columns (forecast unit, protected columns, summary output). All columns share
/// one length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
    nrow: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns<I, S>(columns: I) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, column) in columns {
            let name = name.into();
            if table.has_column(&name) {
                return Err(ScoreError::invalid_values(name, "duplicate column name"));
            }
            table.insert_column(name, column)?;
        }
        Ok(table)
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrow == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Column, ScoreError> {
        self.column(name)
            .ok_or_else(|| ScoreError::unknown_column(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<Value> {
        self.column(column).map(|c| c.get(row))
    }

    /// Adds `column`, replacing an existing column of the same name in place.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), ScoreError> {
        let name = name.into();
        let replaces_only_column = self.columns.len() == 1 && self.columns.contains_key(&name);
        if self.columns.is_empty() || replaces_only_column {
            self.nrow = column.len();
        } else if column.len() != self.nrow {
            return Err(ScoreError::RaggedColumns {
                column: name,
                expected: self.nrow,
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let removed = self.columns.shift_remove(name);
        if self.columns.is_empty() {
            self.nrow = 0;
        }
        removed
    }

    /// Renames `from` to `to`, keeping its position.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), ScoreError> {
        if from == to {
            return self.require(from).map(|_| ());
        }
        if !self.has_column(from) {
            return Err(ScoreError::unknown_column(from));
        }
        if self.has_column(to) {
            return Err(ScoreError::invalid_values(
                to,
                format!("can't rename `{from}`: a column with this name already exists"),
            ));
        }
        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .map(|(name, column)| {
                if name == from {
                    (to.to_string(), column)
                } else {
                    (name, column)
                }
            })
            .collect();
        Ok(())
    }

    /// New table with only `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, ScoreError> {
        let mut table = Table::new();
        for name in names {
            let name = name.as_ref();
            table.insert_column(name, self.require(name)?.clone())?;
        }
        if names.is_empty() {
            table.nrow = self.nrow;
        }
        Ok(table)
    }

    /// New table with the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take(indices)))
                .collect(),
            nrow: indices.len(),
        }
    }

    /// Values of `columns` at `row`.
    pub fn row_key<S: AsRef<str>>(&self, row: usize, columns: &[S]) -> Result<Vec<Value>, ScoreError> {
        columns
            .iter()
            .map(|name| self.require(name.as_ref()).map(|c| c.get(row)))
            .collect()
    }

    /// Row indices grouped by the values of `columns`.
    ///
    /// With no grouping columns every row lands in a single group.
    pub fn group_indices<S: AsRef<str>>(&self, columns: &[S]) -> Result<Groups, ScoreError> {
        let keys: Vec<&Column> = columns
            .iter()
            .map(|name| self.require(name.as_ref()))
            .collect::<Result<_, _>>()?;

        let mut groups = Groups::new();
        for row in 0..self.nrow {
            let key = keys.iter().map(|c| c.get(row)).collect();
            groups.entry(key).or_insert_with(Vec::new).push(row);
        }
        Ok(groups)
    }

    /// Rows as JSON objects, missing cells as `null`.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        (0..self.nrow)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|(name, column)| (name.clone(), column.get(row).to_json()))
                    .collect()
            })
            .collect()
    }
}

/// Renders a group key as `a=1, b=x` for messages.
pub(crate) fn describe_key<S: AsRef<str>>(columns: &[S], key: &[Value]) -> String {
    if columns.is_empty() {
        return "(whole table)".to_string();
    }
    columns
        .iter()
        .zip(key)
        .map(|(name, value)| format!("{}={}", name.as_ref(), value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns([
            ("model", Column::text(["a", "a", "b"])),
            ("value", Column::float([1.0, 2.0, 3.0])),
        ])
        .unwrap()
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = Table::from_columns([
            ("a", Column::float([1.0, 2.0])),
            ("b", Column::float([1.0])),
        ])
        .unwrap_err();
        assert!(matches!(err, ScoreError::RaggedColumns { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn group_indices_keep_first_appearance_order() {
        let groups = sample().group_indices(&["model"]).unwrap();
        let sizes: Vec<usize> = groups.values().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(groups.keys().next(), Some(&vec![Value::Text("a".to_string())]));
    }

    #[test]
    fn no_grouping_columns_is_one_group() {
        let groups = sample().group_indices::<&str>(&[]).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], vec![0, 1, 2]);
    }

    #[test]
    fn rename_keeps_position() {
        let mut table = sample();
        table.rename_column("model", "forecaster").unwrap();
        assert_eq!(table.column_names(), vec!["forecaster", "value"]);
        assert!(table.rename_column("value", "forecaster").is_err());
    }

    #[test]
    fn take_reorders_rows() {
        let taken = sample().take(&[2, 0]);
        assert_eq!(taken.nrow(), 2);
        assert_eq!(taken.value(0, "model"), Some(Value::Text("b".to_string())));
    }
}
