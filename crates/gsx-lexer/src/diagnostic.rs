//! Structured diagnostics shared by every stage of the pipeline.

use std::fmt;

use serde::Serialize;

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One finding with its location, an optional end for range-highlightable
/// errors, and an optional hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            end: None,
            message: message.into(),
            hint: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(position: Position, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(position, message)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_end(mut self, end: Position) -> Self {
        self.end = Some(end);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.position, self.severity, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics.
///
/// Stages append to it and keep going; the caller decides whether the
/// aggregate is fatal via [`Diagnostics::into_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", join_lines(.0))]
pub struct Diagnostics(Vec<Diagnostic>);

fn join_lines(list: &[Diagnostic]) -> String {
    list.iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn error(&mut self, position: Position, message: impl Into<String>) {
        self.push(Diagnostic::error(position, message));
    }

    pub fn warning(&mut self, position: Position, message: impl Into<String>) {
        self.push(Diagnostic::warning(position, message));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when at least one entry is an error; warnings alone do not count.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(list: Vec<Diagnostic>) -> Self {
        Self(list)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::FileId;

    fn pos(line: usize, column: usize) -> Position {
        Position::new(FileId::new("test.gsx"), line, column)
    }

    #[test]
    fn test_display_with_hint() {
        let d = Diagnostic::error(pos(4, 9), "unknown attribute colour")
            .with_hint("did you mean color?");
        assert_eq!(
            d.to_string(),
            "test.gsx:4:9: error: unknown attribute colour (did you mean color?)"
        );
    }

    #[test]
    fn test_warnings_are_not_fatal() {
        let mut list = Diagnostics::new();
        list.warning(pos(1, 1), "empty deps attribute has no effect");
        assert!(!list.has_errors());
        assert!(list.clone().into_result().is_ok());

        list.error(pos(2, 1), "unknown element tag <foo>");
        assert!(list.has_errors());
        assert_eq!(list.errors().count(), 1);
        assert_eq!(list.warnings().count(), 1);
        assert!(list.into_result().is_err());
    }

    #[test]
    fn test_list_display_joins_lines() {
        let mut list = Diagnostics::new();
        list.error(pos(1, 2), "first");
        list.warning(pos(3, 4), "second");
        assert_eq!(
            list.to_string(),
            "test.gsx:1:2: error: first\ntest.gsx:3:4: warning: second"
        );
    }

    #[test]
    fn test_serializes_as_array() {
        let mut list = Diagnostics::new();
        list.push(Diagnostic::error(pos(1, 5), "bad").with_end(pos(1, 8)));
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value[0]["message"], "bad");
        assert_eq!(value[0]["severity"], "error");
        assert_eq!(value[0]["end"]["column"], 8);
        assert!(value[0].get("hint").is_none());
    }
}
