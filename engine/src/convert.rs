//! Type conversion registry.
//!
//! Raw tokens are turned into [`Value`]s by [`Converter`]s. Resolution for a
//! slot runs, in order: the option's named converter override, a converter
//! registered for the exact [`ValueKind`], then the built-in converter for
//! that kind. Slots that resolve to nothing report
//! [`UnsupportedType`](crate::ParseError::UnsupportedType) when input reaches
//! them.
//!
//! # Examples
//!
//! ```
//! use argbind_core::ValueKind;
//! use argbind_engine::{ConvertError, ConverterRegistry, Value};
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register(ValueKind::Custom("port".into()), |raw: &str| {
//!     raw.parse::<u16>()
//!         .map(|port| Value::Integer(port.into()))
//!         .map_err(|e| ConvertError::new(e.to_string()))
//! });
//!
//! let port = registry.resolve(&ValueKind::Custom("port".into()), None).unwrap();
//! assert_eq!(port.convert("8080").unwrap(), Value::Integer(8080));
//!
//! let integer = registry.resolve(&ValueKind::Integer, None).unwrap();
//! assert_eq!(integer.convert("0x10").unwrap(), Value::Integer(16));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use argbind_core::{CommandSpec, ValueKind};
use regex::Regex;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::value::Value;

/// Reason a raw token could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Converts one raw token into a typed [`Value`].
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &str) -> Result<Value, ConvertError>;
}

impl<F> Converter for F
where
    F: Fn(&str) -> Result<Value, ConvertError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Result<Value, ConvertError> {
        self(raw)
    }
}

/// Converter for a built-in [`ValueKind`].
#[derive(Debug, Clone)]
pub struct BuiltinConverter {
    kind: ValueKind,
}

impl BuiltinConverter {
    /// Returns the built-in converter for `kind`, or `None` for custom kinds.
    pub fn for_kind(kind: &ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Custom(_) => None,
            other => Some(Self {
                kind: other.clone(),
            }),
        }
    }
}

impl Converter for BuiltinConverter {
    fn convert(&self, raw: &str) -> Result<Value, ConvertError> {
        match &self.kind {
            ValueKind::Bool => convert_bool(raw),
            ValueKind::Text => Ok(Value::Text(raw.to_string())),
            ValueKind::Integer => convert_integer(raw),
            ValueKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| ConvertError::new(e.to_string())),
            ValueKind::Path => {
                if raw.is_empty() {
                    Err(ConvertError::new("path is empty"))
                } else {
                    Ok(Value::Path(PathBuf::from(raw)))
                }
            }
            ValueKind::Pattern => Regex::new(raw)
                .map(Value::Pattern)
                .map_err(|e| ConvertError::new(e.to_string())),
            ValueKind::Duration => humantime::parse_duration(raw)
                .map(Value::Duration)
                .map_err(|e| ConvertError::new(format!("{e}; use a form such as '1h 30m'"))),
            ValueKind::Charset => convert_charset(raw),
            ValueKind::Uri => Url::parse(raw)
                .map(Value::Uri)
                .map_err(|e| ConvertError::new(e.to_string())),
            ValueKind::Choice(candidates) => candidates
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(raw))
                .map(|candidate| Value::Choice(candidate.clone()))
                .ok_or_else(|| ConvertError::new("no candidate matches")),
            ValueKind::Custom(name) => Err(ConvertError::new(format!(
                "no built-in converter for {name}"
            ))),
        }
    }
}

fn convert_bool(raw: &str) -> Result<Value, ConvertError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(Value::Bool(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(Value::Bool(false))
    } else {
        Err(ConvertError::new("use 'true' or 'false'"))
    }
}

fn convert_integer(raw: &str) -> Result<Value, ConvertError> {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => parse_hex(hex, negative),
        None => trimmed.parse::<i64>().map_err(|e| e.to_string()),
    };
    parsed.map(Value::Integer).map_err(ConvertError::new)
}

/// Parses a hex magnitude and applies the sign, so `-0x8000000000000000`
/// still fits.
fn parse_hex(hex: &str, negative: bool) -> Result<i64, String> {
    let magnitude = i128::from(u64::from_str_radix(hex, 16).map_err(|e| e.to_string())?);
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| "number too large to fit in target type".to_string())
}

const CHARSETS: &[(&str, &[&str])] = &[
    ("UTF-8", &["utf8"]),
    ("UTF-16", &["utf16"]),
    ("UTF-16BE", &["utf16be"]),
    ("UTF-16LE", &["utf16le"]),
    ("US-ASCII", &["usascii", "ascii"]),
    ("ISO-8859-1", &["iso88591", "latin1"]),
    ("ISO-8859-15", &["iso885915", "latin9"]),
    ("WINDOWS-1252", &["windows1252", "cp1252"]),
];

fn convert_charset(raw: &str) -> Result<Value, ConvertError> {
    let key: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    CHARSETS
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(canonical, _)| Value::Charset(canonical.to_string()))
        .ok_or_else(|| {
            let known: Vec<&str> = CHARSETS.iter().map(|(name, _)| *name).collect();
            ConvertError::new(format!("known charsets are {}", known.join(", ")))
        })
}

/// Why a slot has no converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// The named per-option override is not registered.
    MissingNamed(String),
    /// No registered or built-in converter serves the kind.
    MissingKind(ValueKind),
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNamed(name) => write!(f, "converter '{name}'"),
            Self::MissingKind(kind) => write!(f, "type '{kind}'"),
        }
    }
}

/// Registry mapping value kinds and override names to converters.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    by_kind: HashMap<ValueKind, Arc<dyn Converter>>,
    named: HashMap<String, Arc<dyn Converter>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.by_kind.keys().map(ToString::to_string).collect();
        kinds.sort();
        let mut named: Vec<&String> = self.named.keys().collect();
        named.sort();
        f.debug_struct("ConverterRegistry")
            .field("by_kind", &kinds)
            .field("named", &named)
            .finish()
    }
}

impl ConverterRegistry {
    /// Creates a registry with no custom converters; built-ins are always
    /// available as the last resolution step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for an exact value kind, replacing any earlier
    /// one and taking precedence over the built-in.
    pub fn register(
        &mut self,
        kind: ValueKind,
        converter: impl Converter + 'static,
    ) -> &mut Self {
        self.by_kind.insert(kind, Arc::new(converter));
        self
    }

    /// Registers a converter that options can select by name.
    pub fn register_named(
        &mut self,
        name: &str,
        converter: impl Converter + 'static,
    ) -> &mut Self {
        self.named.insert(name.to_string(), Arc::new(converter));
        self
    }

    /// Resolves the converter for `kind`, honoring an optional named override.
    pub fn resolve(
        &self,
        kind: &ValueKind,
        override_name: Option<&str>,
    ) -> Result<Arc<dyn Converter>, Unresolved> {
        if let Some(name) = override_name {
            return self
                .named
                .get(name)
                .cloned()
                .ok_or_else(|| Unresolved::MissingNamed(name.to_string()));
        }
        if let Some(converter) = self.by_kind.get(kind) {
            return Ok(Arc::clone(converter));
        }
        BuiltinConverter::for_kind(kind)
            .map(|builtin| Arc::new(builtin) as Arc<dyn Converter>)
            .ok_or_else(|| Unresolved::MissingKind(kind.clone()))
    }
}

/// Resolved converter for one option or positional slot.
pub(crate) type Resolved = Result<Arc<dyn Converter>, Unresolved>;

/// Converters resolved once for every slot of a spec tree.
///
/// Mirrors the [`CommandSpec`] layout: `options[i]` serves
/// `spec.options[i]`, and `subcommands[i]` serves `spec.subcommands[i]`.
pub(crate) struct ConverterPlan {
    pub(crate) options: Vec<Resolved>,
    pub(crate) positionals: Vec<Resolved>,
    pub(crate) subcommands: Vec<ConverterPlan>,
}

impl ConverterPlan {
    pub(crate) fn build(spec: &CommandSpec, registry: &ConverterRegistry) -> Self {
        let options = spec
            .options
            .iter()
            .map(|option| {
                let resolved =
                    registry.resolve(option.value_type.element(), option.converter.as_deref());
                if let Err(missing) = &resolved {
                    warn!(command = %spec.name, option = option.canonical_name(), %missing, "No converter resolved");
                }
                resolved
            })
            .collect();
        let positionals = spec
            .positionals
            .iter()
            .map(|positional| {
                let resolved = registry.resolve(positional.value_type.element(), None);
                if let Err(missing) = &resolved {
                    warn!(command = %spec.name, positional = %positional.label, %missing, "No converter resolved");
                }
                resolved
            })
            .collect();
        let subcommands = spec
            .subcommands
            .iter()
            .map(|sub| Self::build(sub, registry))
            .collect();

        Self {
            options,
            positionals,
            subcommands,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn builtin(kind: ValueKind) -> BuiltinConverter {
        BuiltinConverter::for_kind(&kind).unwrap()
    }

    #[test]
    fn test_integer_accepts_decimal_and_hex() {
        let conv = builtin(ValueKind::Integer);
        assert_eq!(conv.convert("42").unwrap(), Value::Integer(42));
        assert_eq!(conv.convert("-7").unwrap(), Value::Integer(-7));
        assert_eq!(conv.convert("0xff").unwrap(), Value::Integer(255));
        assert_eq!(conv.convert("-0x10").unwrap(), Value::Integer(-16));
        assert_eq!(conv.convert("abc").unwrap_err().0, "invalid digit found in string");
        assert_eq!(conv.convert("-0x8000000000000000").unwrap(), Value::Integer(i64::MIN));
        assert_eq!(conv.convert("0x7fffffffffffffff").unwrap(), Value::Integer(i64::MAX));
        assert!(conv.convert("0x8000000000000000").is_err());
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        let conv = builtin(ValueKind::Bool);
        assert_eq!(conv.convert("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(conv.convert("False").unwrap(), Value::Bool(false));
        assert!(conv.convert("yes").is_err());
    }

    #[test]
    fn test_choice_matches_case_insensitively_and_lists_candidates() {
        let conv = builtin(ValueKind::Choice(vec!["Fast".into(), "Slow".into()]));
        assert_eq!(conv.convert("fast").unwrap(), Value::Choice("Fast".into()));

        let err = conv.convert("medium").unwrap_err();
        assert_eq!(err.0, "no candidate matches");
    }

    #[test]
    fn test_duration_uri_pattern_and_charset() {
        assert_eq!(
            builtin(ValueKind::Duration).convert("1h 30m").unwrap(),
            Value::Duration(Duration::from_secs(5400))
        );
        assert!(builtin(ValueKind::Uri).convert("https://example.com/x").is_ok());
        assert!(builtin(ValueKind::Uri).convert("not a uri").is_err());
        assert!(builtin(ValueKind::Pattern).convert("(unclosed").is_err());
        assert_eq!(
            builtin(ValueKind::Charset).convert("utf8").unwrap(),
            Value::Charset("UTF-8".into())
        );
        assert_eq!(
            builtin(ValueKind::Charset).convert("Latin1").unwrap(),
            Value::Charset("ISO-8859-1".into())
        );
        assert!(builtin(ValueKind::Charset).convert("klingon").is_err());
    }

    #[test]
    fn test_path_rejects_empty() {
        assert!(builtin(ValueKind::Path).convert("").is_err());
        assert_eq!(
            builtin(ValueKind::Path).convert("a/b").unwrap(),
            Value::Path(PathBuf::from("a/b"))
        );
    }

    #[test]
    fn test_resolution_order() {
        let mut registry = ConverterRegistry::new();
        registry.register(ValueKind::Integer, |_: &str| -> Result<Value, ConvertError> {
            Ok(Value::Integer(1))
        });
        registry.register_named("two", |_: &str| -> Result<Value, ConvertError> {
            Ok(Value::Integer(2))
        });

        let by_kind = registry.resolve(&ValueKind::Integer, None).unwrap();
        assert_eq!(by_kind.convert("99").unwrap(), Value::Integer(1));

        let named = registry.resolve(&ValueKind::Integer, Some("two")).unwrap();
        assert_eq!(named.convert("99").unwrap(), Value::Integer(2));

        let fallback = registry.resolve(&ValueKind::Float, None).unwrap();
        assert_eq!(fallback.convert("1.5").unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_unresolved_kinds() {
        let registry = ConverterRegistry::new();
        assert_eq!(
            registry
                .resolve(&ValueKind::Custom("color".into()), None)
                .err(),
            Some(Unresolved::MissingKind(ValueKind::Custom("color".into())))
        );
        assert_eq!(
            registry.resolve(&ValueKind::Text, Some("nope")).err(),
            Some(Unresolved::MissingNamed("nope".into()))
        );
    }
}
