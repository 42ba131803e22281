//! Parser/lexer-facing error types.
//!
//! Kept small and hand-rolled, in the teacher's style (`r2e-core::AppError`,
//! `r2e-data::DataError`) rather than reached for via a derive-macro error
//! crate: there is no HTTP response to shape here (§7 — parse errors abort
//! Site load before a server ever starts), just a message and a line number.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeError {
    pub path: String,
    pub message: String,
}

impl IncludeError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn cyclic(path: impl Into<String>) -> Self {
        Self::new(path, "cyclic inclusion detected")
    }

    pub fn too_deep(path: impl Into<String>, max_depth: usize) -> Self {
        Self::new(path, format!("include depth exceeds maximum of {max_depth}"))
    }
}

impl fmt::Display for IncludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "include \"{}\": {}", self.path, self.message)
    }
}

impl std::error::Error for IncludeError {}
