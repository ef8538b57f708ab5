//! Spec validation.
//!
//! Validates the structural invariants of a [`CommandSpec`] once, at build
//! time: option names are well formed and unique per level, arities are
//! consistent with value types, and positional index ranges do not overlap.
//!
//! # Examples
//!
//! ```
//! use argbind_core::*;
//!
//! let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["-v", "--verbose"]));
//! assert!(validate_spec(&spec).is_empty());
//!
//! // Invalid: `-v` declared twice
//! let bad = CommandSpec::new("tool")
//!     .with_option(OptionSpec::flag(&["-v", "--verbose"]))
//!     .with_option(OptionSpec::flag(&["-v", "--version"]));
//! assert!(matches!(
//!     validate_spec(&bad).as_slice(),
//!     [SpecError::DuplicateName { .. }]
//! ));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Arity, CommandSpec, IndexRange, ValueKind, ValueType};

/// Spec definition errors.
///
/// These are build-time programming errors: a command line whose spec fails
/// validation cannot be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Command or subcommand name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// An option declares no names.
    #[error("option in command '{command}' must declare at least one name")]
    MissingOptionName { command: String },
    /// Option name lacks a leading dash, is too short, or contains `=` or
    /// whitespace.
    #[error("invalid option name '{name}' in command '{command}'")]
    InvalidOptionName { command: String, name: String },
    /// Two options in the same command share a name or alias.
    #[error("duplicate option name '{name}' in command '{command}'")]
    DuplicateName { command: String, name: String },
    /// Two subcommands in the same scope share a name or alias.
    #[error("duplicate subcommand '{name}' in command '{command}'")]
    DuplicateSubcommand { command: String, name: String },
    /// Arity bounds are malformed or inconsistent with the value type.
    #[error("invalid arity {arity} for {target} in command '{command}': {reason}")]
    InvalidArity {
        command: String,
        target: String,
        arity: Arity,
        reason: String,
    },
    /// Two positional parameters claim the same index, or an open-ended
    /// tail is not the last positional.
    #[error("positional '{first}' overlaps '{second}' in command '{command}'")]
    OverlappingPositional {
        command: String,
        first: String,
        second: String,
    },
}

/// Validates a command spec and all of its subcommands.
///
/// Returns every error found; an empty vector means the spec is valid.
/// Unset positional indices and arities are derived exactly as
/// [`CommandSpec::validate`] derives them, so both accept the same specs.
pub fn validate_spec(spec: &CommandSpec) -> Vec<SpecError> {
    let mut normalized = spec.clone();
    normalize_spec(&mut normalized);
    check_spec(&normalized)
}

/// Checks an already normalized spec.
pub(crate) fn check_spec(spec: &CommandSpec) -> Vec<SpecError> {
    let mut errors = Vec::new();
    validate_level(spec, &mut errors);
    errors
}

/// Fills in derived positional indices and option/positional arities.
pub(crate) fn normalize_spec(spec: &mut CommandSpec) {
    for option in &mut spec.options {
        option.arity = Some(option.arity());
    }

    let mut next = 0usize;
    for positional in &mut spec.positionals {
        let arity = positional.arity();
        positional.arity = Some(arity);

        let index = *positional.index.get_or_insert_with(|| match positional.value_type {
            ValueType::Scalar(_) => IndexRange::single(next),
            ValueType::Collection(_) => {
                // Bounds too large to address end up as an open tail.
                let end = arity
                    .max
                    .and_then(|max| max.checked_sub(1))
                    .and_then(|span| next.checked_add(span));
                match end {
                    Some(end) => IndexRange::range(next, end),
                    None => IndexRange::tail(next),
                }
            }
        });
        next = index.next_index().unwrap_or(index.start.saturating_add(1));
    }

    for sub in &mut spec.subcommands {
        normalize_spec(sub);
    }
}

fn validate_level(spec: &CommandSpec, errors: &mut Vec<SpecError>) {
    if spec.name.trim().is_empty() {
        errors.push(SpecError::EmptyCommandName);
        return;
    }

    validate_options(spec, errors);
    validate_positionals(spec, errors);

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in &spec.subcommands {
        let names = std::iter::once(sub.name.as_str()).chain(sub.aliases.iter().map(String::as_str));
        for name in names {
            if !name.trim().is_empty() && !seen.insert(name) {
                errors.push(SpecError::DuplicateSubcommand {
                    command: spec.name.clone(),
                    name: name.to_string(),
                });
            }
        }
        validate_level(sub, errors);
    }
}

fn validate_options(spec: &CommandSpec, errors: &mut Vec<SpecError>) {
    let command = &spec.name;
    let mut seen: HashSet<&str> = HashSet::new();

    for option in &spec.options {
        if option.names.is_empty() {
            errors.push(SpecError::MissingOptionName {
                command: command.clone(),
            });
            continue;
        }

        for name in &option.names {
            if !is_valid_option_name(name) {
                errors.push(SpecError::InvalidOptionName {
                    command: command.clone(),
                    name: name.clone(),
                });
            } else if !seen.insert(name.as_str()) {
                errors.push(SpecError::DuplicateName {
                    command: command.clone(),
                    name: name.clone(),
                });
            }
        }

        let arity = option.arity();
        let target = format!("option '{}'", option.canonical_name());
        let invalid = |reason: &str| SpecError::InvalidArity {
            command: command.clone(),
            target: target.clone(),
            arity,
            reason: reason.to_string(),
        };

        if !arity.is_well_formed() {
            errors.push(invalid("minimum exceeds maximum"));
        } else if arity.is_zero() && option.value_type.element() != &ValueKind::Bool {
            errors.push(invalid("only boolean options may take zero values"));
        } else if !option.value_type.is_collection() && arity.max.is_none_or(|max| max > 1) {
            errors.push(invalid("a scalar option takes at most one value per occurrence"));
        } else if option.is_short_circuit() && !arity.is_zero() {
            errors.push(invalid("help and version options take no values"));
        }
    }
}

fn validate_positionals(spec: &CommandSpec, errors: &mut Vec<SpecError>) {
    let command = &spec.name;

    for positional in &spec.positionals {
        let arity = positional.arity();
        let invalid = |reason: &str| SpecError::InvalidArity {
            command: command.clone(),
            target: format!("positional '{}'", positional.label),
            arity,
            reason: reason.to_string(),
        };

        if !arity.is_well_formed() {
            errors.push(invalid("minimum exceeds maximum"));
        } else if !positional.value_type.is_collection() && arity.max.is_none_or(|max| max > 1) {
            errors.push(invalid("a scalar positional binds at most one value"));
        } else if positional.range().end.is_some_and(|end| end < positional.range().start) {
            errors.push(invalid("index range ends before it starts"));
        }
    }

    for (i, first) in spec.positionals.iter().enumerate() {
        for second in &spec.positionals[i + 1..] {
            // An open tail overlaps everything after it, so this also keeps
            // the single allowed tail last.
            if first.range().overlaps(&second.range()) {
                errors.push(SpecError::OverlappingPositional {
                    command: command.clone(),
                    first: first.label.clone(),
                    second: second.label.clone(),
                });
            }
        }
    }
}

fn is_valid_option_name(name: &str) -> bool {
    name.starts_with('-')
        && name.len() >= 2
        && name != "--"
        && !name.contains('=')
        && !name.chars().any(char::is_whitespace)
}
