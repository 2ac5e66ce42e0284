use crate::{Checked, Diagnostics, ScoreError, Table, Tabular};

/// A table of scores together with the names of its metric columns.
///
/// `score_names` is `None` when a plain table was wrapped without naming its
/// metrics; such a table still works with every operation except those that need
/// to tell metric columns apart from identity columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    table: Table,
    score_names: Option<Vec<String>>,
    diagnostics: Diagnostics,
}

impl Scores {
    pub(crate) fn from_parts(
        table: Table,
        score_names: Option<Vec<String>>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            table,
            score_names,
            diagnostics,
        }
    }

    /// Wraps `table` without metric names.
    pub fn from_table(table: Table) -> Self {
        Self::from_parts(table, None, Diagnostics::new())
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Mutable access to the table. Score names are not updated; renaming or
    /// dropping a metric column surfaces as a warning from [`validate_scores`].
    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn score_names(&self) -> Option<&[String]> {
        self.score_names.as_deref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

impl Tabular for Scores {
    fn table(&self) -> &Table {
        &self.table
    }

    fn recorded_score_names(&self) -> &[String] {
        self.score_names.as_deref().unwrap_or_default()
    }
}

/// Tags `table` with its metric names.
pub fn new_scores(table: Table, score_names: Vec<String>) -> Scores {
    Scores::from_parts(table, Some(score_names), Diagnostics::new())
}

/// Tags `table` with its metric names and checks that each of them is a column.
pub fn as_scores(table: Table, score_names: Vec<String>) -> Result<Checked<Scores>, ScoreError> {
    let scores = new_scores(table, score_names);
    let diagnostics = validate_scores(&scores, true)?;
    Ok(Checked::new(scores, diagnostics))
}

/// Checks the score names against the table.
///
/// With `strict`, a table without score names is an error. Score names that are not
/// columns produce a warning.
pub fn validate_scores(scores: &Scores, strict: bool) -> Result<Diagnostics, ScoreError> {
    let mut diagnostics = Diagnostics::new();
    match scores.score_names() {
        None if strict => return Err(ScoreError::MissingScoreNames),
        None => {}
        Some(names) => warn_missing(scores.table(), names, &mut diagnostics),
    }
    Ok(diagnostics)
}

/// Names of the metric columns.
///
/// Without recorded names this is an error when `error` is set and `None` otherwise.
/// Recorded names that are no longer columns are returned anyway, with a warning
/// that lists them.
pub fn get_score_names(
    scores: &Scores,
    error: bool,
) -> Result<Checked<Option<Vec<String>>>, ScoreError> {
    let Some(names) = scores.score_names() else {
        if error {
            return Err(ScoreError::MissingScoreNames);
        }
        return Ok(Checked::clean(None));
    };
    let mut diagnostics = Diagnostics::new();
    warn_missing(scores.table(), names, &mut diagnostics);
    Ok(Checked::new(Some(names.to_vec()), diagnostics))
}

fn warn_missing(table: &Table, names: &[String], diagnostics: &mut Diagnostics) {
    let missing: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !table.has_column(name))
        .collect();
    if !missing.is_empty() {
        diagnostics.warn(
            "score_names",
            format!(
                "recorded score names are not columns of the table: {}; they may have been \
                 renamed or removed",
                missing.join(", ")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;

    fn table() -> Table {
        Table::from_columns([
            ("model", Column::text(["a", "b"])),
            ("ae_point", Column::float([0.1, 0.2])),
        ])
        .unwrap()
    }

    #[test]
    fn strict_validation_needs_score_names() {
        let scores = Scores::from_table(table());
        assert_eq!(
            validate_scores(&scores, true).unwrap_err(),
            ScoreError::MissingScoreNames
        );
        assert!(validate_scores(&scores, false).unwrap().is_empty());
    }

    #[test]
    fn score_names_make_columns_protected() {
        let scores = new_scores(table(), vec!["ae_point".to_string()]);
        assert_eq!(crate::get_forecast_unit(&scores), vec!["model"]);
    }
}
