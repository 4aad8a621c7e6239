//! Error type shared by the compiler and the orchestra VM.
//!
//! Every failure the toolchain can surface is a [`SymphonyError`]: a kind,
//! an optional source line, and a message written for the person who wrote
//! the program, not for the person who wrote the compiler.

use std::fmt;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parse failure
    Grammatical,
    /// Duplicate variable or function name in a scope
    Redeclaration,
    /// Use of an undefined variable or function
    Undeclared,
    /// Invalid operand/argument types, mismatched assignment, bad index type
    Type,
    /// Wrong number of arguments, or wrong number of stdin lines
    Arity,
    /// Statement in a place it cannot appear (break outside while, bad return)
    Misplaced,
    /// Array access out of bounds at runtime
    Index,
    /// Runtime division (or modulo) by zero
    DivisionByZero,
    /// Read of an address with no value
    Uninitialized,
    /// A memory sector ran out of addresses during compilation
    Capacity,
    /// Source file could not be read, or configuration could not be loaded
    Io,
    /// Operation without an implementation (reserved builtins, corrupt quads)
    NotImplemented,
}

/// A compile-time or runtime failure with a human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct SymphonyError {
    pub kind: ErrorKind,
    /// 1-based source line, when the failure can be pinned to one.
    pub line: Option<usize>,
    pub message: String,
}

impl SymphonyError {
    pub fn new(kind: ErrorKind, line: Option<usize>, message: impl Into<String>) -> Self {
        SymphonyError {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn grammatical(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Grammatical, Some(line), message)
    }

    pub fn redeclaration(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Redeclaration, Some(line), message)
    }

    pub fn undeclared(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Undeclared, Some(line), message)
    }

    pub fn type_error(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, Some(line), message)
    }

    pub fn arity(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, Some(line), message)
    }

    pub fn misplaced(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Misplaced, Some(line), message)
    }

    pub fn capacity(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Capacity, Some(line), message)
    }

    /// Runtime failures carry no source line; the quadruple stream has
    /// already lost that information.
    pub fn runtime(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, None, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, None, message)
    }
}

impl fmt::Display for SymphonyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Error on line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SymphonyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let err = SymphonyError::type_error(7, "you are trying to assign a(n) STR value to a(n) INT type");
        assert_eq!(
            err.to_string(),
            "Error on line 7: you are trying to assign a(n) STR value to a(n) INT type"
        );
    }

    #[test]
    fn test_display_without_line() {
        let err = SymphonyError::runtime(ErrorKind::DivisionByZero, "division by zero");
        assert_eq!(err.to_string(), "division by zero");
    }
}
