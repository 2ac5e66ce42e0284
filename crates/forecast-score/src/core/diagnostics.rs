use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; nothing needs fixing.
    Note,
    /// Something looks wrong but the operation went ahead.
    Warning,
    /// A captured failure, e.g. a metric that errored on one batch.
    Error,
}

/// One message produced while validating, scoring or inspecting a table.
///
/// `source` names what produced it: a check such as `"duplicates"` or the name of
/// the metric whose call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level} [{}]: {}", self.source, self.message)
    }
}

/// Ordered list of diagnostics attached to a forecast, a scores table, or a
/// [`Checked`] value.
///
/// The `note`/`warn`/`error` helpers also emit a `tracing` event, so anything
/// recorded here is visible in logs as well. [`extend`](Diagnostics::extend) does
/// not re-emit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, source: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(Severity::Note, source, message);
        debug!(source = %diagnostic.source, "{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    pub fn warn(&mut self, source: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(Severity::Warning, source, message);
        warn!(source = %diagnostic.source, "{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, source: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(Severity::Error, source, message);
        warn!(source = %diagnostic.source, captured = true, "{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter().filter(|d| d.is_warning())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter().filter(|d| d.is_error())
    }

    /// Diagnostics recorded by one check or metric.
    pub fn from_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.source == source)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A value together with the warnings produced while computing it.
///
/// Returned by lookups that succeed but may have something to say, such as
/// [`get_score_names`](crate::get_score_names) finding a recorded name that is no
/// longer a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
    value: T,
    diagnostics: Diagnostics,
}

impl<T> Checked<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

impl<T> Deref for Checked<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
