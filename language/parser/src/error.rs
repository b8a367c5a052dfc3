use std::fmt::{Display, Formatter};

/// The parser's own failure kind: a syntax error sits outside the
/// semantic analyzer's §7 category list (it's the external collaborator
/// named in §1), but the CLI reports it the same way — printed, nonzero
/// exit.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        return Self { message: message.into(), line, column };
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Syntax error at {}:{}: {}", self.line, self.column, self.message);
    }
}

impl std::error::Error for ParseError {}
