use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ScoreError;

/// A single cell read out of a [`Column`].
///
/// Values are hashable so rows can be grouped by key columns. Floats compare by bit
/// pattern after normalising `-0.0` to `0.0` and all NaNs to one NaN, which makes
/// grouping deterministic but means `Float(0.1 + 0.2) != Float(0.3)`.
#[derive(Debug, Clone)]
pub enum Value {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Missing => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(v) => serde_json::Value::String(v.clone()),
        }
    }

    fn float_bits(value: f64) -> u64 {
        if value == 0.0 {
            0.0f64.to_bits()
        } else if value.is_nan() {
            f64::NAN.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => Value::float_bits(*a) == Value::float_bits(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => {}
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => Value::float_bits(*v).hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NA"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Categorical values stored as codes into an ordered level list.
///
/// For binary forecasts the first level is the non-event and the second the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    levels: Vec<String>,
    codes: Vec<Option<usize>>,
}

impl Factor {
    /// Builds a factor whose levels are the sorted distinct non-missing values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let values: Vec<Option<String>> = values.into_iter().map(|v| v.map(Into::into)).collect();
        let levels: Vec<String> = values
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = values
            .iter()
            .map(|v| v.as_ref().and_then(|v| levels.iter().position(|l| l == v)))
            .collect();
        Self { levels, codes }
    }

    /// Builds a factor with an explicit level order. Values outside `levels` are an error.
    pub fn with_levels<I, S, L>(values: I, levels: L) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        let mut codes = Vec::new();
        for value in values {
            match value.map(Into::into) {
                None => codes.push(None),
                Some(value) => {
                    let code = levels.iter().position(|l| *l == value).ok_or_else(|| {
                        ScoreError::invalid_values("factor", format!("`{value}` is not a level"))
                    })?;
                    codes.push(Some(code));
                }
            }
        }
        Ok(Self { levels, codes })
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn codes(&self) -> &[Option<usize>] {
        &self.codes
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .copied()
            .flatten()
            .map(|code| self.levels[code].as_str())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColumnKind {
    Float,
    Int,
    Bool,
    Text,
    Factor,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Float => "float",
            ColumnKind::Int => "integer",
            ColumnKind::Bool => "boolean",
            ColumnKind::Text => "text",
            ColumnKind::Factor => "factor",
        };
        f.write_str(name)
    }
}

/// A typed column with optional cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Factor(Factor),
}

impl Column {
    /// Float column; NaN inputs are stored as missing.
    pub fn float(values: impl IntoIterator<Item = f64>) -> Self {
        Column::Float(
            values
                .into_iter()
                .map(|v| if v.is_nan() { None } else { Some(v) })
                .collect(),
        )
    }

    pub fn float_opt(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Column::Float(values.into_iter().collect())
    }

    pub fn int(values: impl IntoIterator<Item = i64>) -> Self {
        Column::Int(values.into_iter().map(Some).collect())
    }

    pub fn int_opt(values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Column::Int(values.into_iter().collect())
    }

    pub fn bool(values: impl IntoIterator<Item = bool>) -> Self {
        Column::Bool(values.into_iter().map(Some).collect())
    }

    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Column::Text(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn text_opt<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        Column::Text(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Factor column with sorted levels.
    pub fn factor<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Column::Factor(Factor::from_values(values.into_iter().map(Some)))
    }

    pub fn factor_with_levels<S, L>(
        values: impl IntoIterator<Item = S>,
        levels: L,
    ) -> Result<Self, ScoreError>
    where
        S: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Factor::with_levels(values.into_iter().map(Some), levels).map(Column::Factor)
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Float(_) => ColumnKind::Float,
            Column::Int(_) => ColumnKind::Int,
            Column::Bool(_) => ColumnKind::Bool,
            Column::Text(_) => ColumnKind::Text,
            Column::Factor(_) => ColumnKind::Factor,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Factor(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Float(_) | Column::Int(_))
    }

    pub fn is_factor(&self) -> bool {
        matches!(self, Column::Factor(_))
    }

    pub fn as_factor(&self) -> Option<&Factor> {
        match self {
            Column::Factor(f) => Some(f),
            _ => None,
        }
    }

    pub fn get(&self, row: usize) -> Value {
        let value = match self {
            Column::Float(v) => v.get(row).copied().flatten().map(Value::Float),
            Column::Int(v) => v.get(row).copied().flatten().map(Value::Int),
            Column::Bool(v) => v.get(row).copied().flatten().map(Value::Bool),
            Column::Text(v) => v.get(row).cloned().flatten().map(Value::Text),
            Column::Factor(f) => f.get(row).map(|s| Value::Text(s.to_string())),
        };
        value.unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Float(v) => v.get(row).is_none_or(|v| v.is_none()),
            Column::Int(v) => v.get(row).is_none_or(|v| v.is_none()),
            Column::Bool(v) => v.get(row).is_none_or(|v| v.is_none()),
            Column::Text(v) => v.get(row).is_none_or(|v| v.is_none()),
            Column::Factor(f) => f.codes.get(row).is_none_or(|v| v.is_none()),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Numeric cells as floats, `None` for non-numeric columns.
    pub fn numeric_values(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Column::Float(v) => Some(v.clone()),
            Column::Int(v) => Some(v.iter().map(|v| v.map(|v| v as f64)).collect()),
            _ => None,
        }
    }

    /// Numeric view of a single cell. Factor cells read as their level code.
    pub fn numeric_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Float(v) => v.get(row).copied().flatten(),
            Column::Int(v) => v.get(row).copied().flatten().map(|v| v as f64),
            Column::Factor(f) => f.codes.get(row).copied().flatten().map(|c| c as f64),
            _ => None,
        }
    }

    /// Rows at `indices`, in that order. Factors keep their level list.
    pub fn take(&self, indices: &[usize]) -> Column {
        fn pick<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|&i| values.get(i).cloned().flatten())
                .collect()
        }

        match self {
            Column::Float(v) => Column::Float(pick(v, indices)),
            Column::Int(v) => Column::Int(pick(v, indices)),
            Column::Bool(v) => Column::Bool(pick(v, indices)),
            Column::Text(v) => Column::Text(pick(v, indices)),
            Column::Factor(f) => Column::Factor(Factor {
                levels: f.levels.clone(),
                codes: pick(&f.codes, indices),
            }),
        }
    }

    /// Empty column of the same kind.
    pub fn empty_like(&self) -> Column {
        self.take(&[])
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::float(values)
    }
}

impl From<Vec<Option<f64>>> for Column {
    fn from(values: Vec<Option<f64>>) -> Self {
        Column::Float(values)
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::int(values)
    }
}

impl From<Vec<Option<i64>>> for Column {
    fn from(values: Vec<Option<i64>>) -> Self {
        Column::Int(values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Column::bool(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::text(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::text(values)
    }
}

impl From<Factor> for Column {
    fn from(factor: Factor) -> Self {
        Column::Factor(factor)
    }
}
