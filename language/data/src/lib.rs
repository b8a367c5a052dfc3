use std::fmt::{Display, Formatter};

use colored::Colorize;

/// The category a fatal semantic error falls into, used only to keep
/// error messages prefixed consistently; callers otherwise treat every
/// `SemanticError` the same way (first failure aborts the pass).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    DuplicateName,
    InvalidAlias,
    UnknownType,
    UnknownName,
    ArityMismatch,
    TypeMismatch,
    NotReady,
    WrongKind,
    MissingReturn,
    InheritanceCycle,
}

impl SemanticErrorKind {
    fn prefix(&self) -> &'static str {
        return match self {
            SemanticErrorKind::DuplicateName => "Duplicate name",
            SemanticErrorKind::InvalidAlias => "Invalid alias",
            SemanticErrorKind::UnknownType => "Unknown type",
            SemanticErrorKind::UnknownName => "Unknown name",
            SemanticErrorKind::ArityMismatch => "Arity mismatch",
            SemanticErrorKind::TypeMismatch => "Type mismatch",
            SemanticErrorKind::NotReady => "Not ready",
            SemanticErrorKind::WrongKind => "Wrong kind",
            SemanticErrorKind::MissingReturn => "Missing return",
            SemanticErrorKind::InheritanceCycle => "Inheritance cycle",
        };
    }
}

/// The single fatal error kind produced by the analyzer. All errors are
/// fatal; there is no recovery, the first one detected wins.
#[derive(Debug, Clone)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, message: impl Into<String>) -> Self {
        return Self { kind, message: message.into() };
    }

    pub fn duplicate_name(name: &str) -> Self {
        return Self::new(SemanticErrorKind::DuplicateName, format!("'{}' is already declared", name));
    }

    pub fn invalid_alias(alias: &str, target: &str) -> Self {
        return Self::new(
            SemanticErrorKind::InvalidAlias,
            format!("alias '{}' targets unknown class '{}'", alias, target),
        );
    }

    pub fn unknown_type(type_string: &str) -> Self {
        return Self::new(SemanticErrorKind::UnknownType, format!("'{}' does not resolve to a class", type_string));
    }

    pub fn unknown_name(path: &[String]) -> Self {
        return Self::new(SemanticErrorKind::UnknownName, format!("'{}' is not declared in this scope", path.join(".")));
    }

    pub fn arity_mismatch(what: &str, expected: usize, found: usize) -> Self {
        return Self::new(
            SemanticErrorKind::ArityMismatch,
            format!("{} expects {} argument(s) but found {}", what, expected, found),
        );
    }

    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        return Self::new(SemanticErrorKind::TypeMismatch, format!("expected '{}' but found '{}'", expected, found));
    }

    pub fn not_ready(name: &str) -> Self {
        return Self::new(SemanticErrorKind::NotReady, format!("'{}' is used before it is ready", name));
    }

    pub fn wrong_kind(name: &str, expected: &str) -> Self {
        return Self::new(SemanticErrorKind::WrongKind, format!("'{}' is not a {}", name, expected));
    }

    pub fn missing_return(function_name: &str, return_type: &str) -> Self {
        return Self::new(
            SemanticErrorKind::MissingReturn,
            format!("'{}' never returns a value of type '{}'", function_name, return_type),
        );
    }

    pub fn inheritance_cycle(remaining: &[String]) -> Self {
        return Self::new(SemanticErrorKind::InheritanceCycle, format!("inheritance cycle among: {}", remaining.join(", ")));
    }

    /// Prints the error to stderr the way the CLI reports any fatal failure.
    pub fn print(&self) {
        eprintln!("{}", self.to_string().bright_red());
    }
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}: {}", self.kind.prefix(), self.message);
    }
}

impl std::error::Error for SemanticError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefixes_every_category() {
        assert_eq!(SemanticError::duplicate_name("Foo").to_string(), "Duplicate name: 'Foo' is already declared");
        assert_eq!(
            SemanticError::unknown_name(&["a".to_string(), "b".to_string()]).to_string(),
            "Unknown name: 'a.b' is not declared in this scope"
        );
    }
}
