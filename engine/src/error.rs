//! Error types for parsing and execution.
//!
//! Parse errors are collected into the [`ParseResult`](crate::ParseResult)
//! rather than raised, so one invocation can report every problem at once.
//! Business failures are wrapped in [`ExecutionError`] with the command path
//! that was active when they were raised.

use std::fmt;

use argbind_core::Arity;
use serde::Serialize;
use thiserror::Error;

/// Run-time errors found while binding an argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// Option-like token that matches no option at the current level.
    #[error("unknown option: '{name}'")]
    UnknownOption { command: String, name: String },

    /// Abbreviated option matching more than one option.
    #[error("option '{name}' is ambiguous; it could be {}", candidates.join(", "))]
    AmbiguousOption {
        name: String,
        candidates: Vec<String>,
    },

    /// Required option never given.
    #[error("missing required option: '{name}'")]
    MissingRequiredOption { command: String, name: String },

    /// Too few or too many values for an option or positional parameter.
    #[error("{target} expects {arity} value(s) but {found} were given")]
    ArityViolation {
        target: String,
        arity: Arity,
        found: usize,
    },

    /// A raw token could not be converted to the target type.
    #[error("invalid value '{raw}' for {target} (expected {expected}): {reason}")]
    ConversionError {
        target: String,
        raw: String,
        expected: String,
        reason: String,
    },

    /// No converter is available for the target type.
    #[error("cannot convert values for {target}: no converter for {type_name}")]
    UnsupportedType { target: String, type_name: String },

    /// Positional word that no positional parameter accepts.
    #[error("unexpected argument: '{arg}'")]
    UnexpectedArgument { command: String, arg: String },
}

/// A business failure, tagged with the command path that raised it.
#[derive(Debug)]
pub struct ExecutionError {
    /// Space-separated command path, e.g. `git remote add`.
    pub command: String,
    pub error: anyhow::Error,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.command, self.error)
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = ParseError::AmbiguousOption {
            name: "--tr".into(),
            candidates: vec!["--tree".into(), "--trace".into()],
        };
        assert_eq!(
            err.to_string(),
            "option '--tr' is ambiguous; it could be --tree, --trace"
        );
    }

    #[test]
    fn test_arity_message() {
        let err = ParseError::ArityViolation {
            target: "option '--pair'".into(),
            arity: Arity::exactly(2),
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "option '--pair' expects 2 value(s) but 1 were given"
        );
    }

    #[test]
    fn test_execution_error_exposes_source() {
        let err = ExecutionError {
            command: "git push".into(),
            error: anyhow::anyhow!("remote rejected"),
        };
        assert_eq!(err.to_string(), "git push: remote rejected");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_conversion_message_names_expected_type() {
        let err = ParseError::ConversionError {
            target: "option '--port'".into(),
            raw: "x".into(),
            expected: "port".into(),
            reason: "invalid digit found in string".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'x' for option '--port' (expected port): invalid digit found in string"
        );
    }
}
