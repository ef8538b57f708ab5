//! Spec model type definitions.
//!
//! This module defines the declarative description of a command line: the
//! options a command accepts, its positional parameters and nested
//! subcommands. The types are designed for serialization with [`serde`] so
//! that collaborators such as completion generators can read the same
//! structural contract the parser binds against.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::validate::{SpecError, check_spec, normalize_spec};

/// Version of the spec serialization contract (semver).
///
/// Embedded in every [`CommandSpec`] built through [`CommandSpec::new`] to
/// track compatibility of serialized specs.
pub const SPEC_CONTRACT_VERSION: &str = "1.0.0";

/// Minimum and maximum number of raw tokens consumed per occurrence.
///
/// A `max` of `None` means the arity is unbounded (`m..*`).
///
/// # Examples
///
/// ```
/// use argbind_core::Arity;
///
/// assert_eq!(Arity::exactly(2).to_string(), "2");
/// assert_eq!(Arity::range(0, 1).to_string(), "0..1");
/// assert_eq!(Arity::at_least(1).to_string(), "1..*");
/// assert!(Arity::ZERO.is_fixed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arity {
    /// Minimum number of values.
    pub min: usize,
    /// Maximum number of values; `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    /// Arity of a flag that takes no values.
    pub const ZERO: Arity = Arity {
        min: 0,
        max: Some(0),
    };

    /// Exactly `n` values.
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Between `min` and `max` values (inclusive).
    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// At least `min` values, no upper bound.
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Returns `true` when `min == max`.
    pub fn is_fixed(&self) -> bool {
        self.max == Some(self.min)
    }

    /// Returns `true` when there is no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Returns `true` when the arity takes no values at all.
    pub fn is_zero(&self) -> bool {
        self.max == Some(0)
    }

    /// Returns `true` if `count` values satisfy this arity.
    pub fn allows(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// Returns `true` when `min <= max` (or `max` is unbounded).
    pub fn is_well_formed(&self) -> bool {
        self.max.is_none_or(|max| self.min <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Element type a raw token is converted into.
///
/// # Examples
///
/// ```
/// use argbind_core::ValueKind;
///
/// assert_eq!(ValueKind::default(), ValueKind::Text);
/// let mode = ValueKind::Choice(vec!["fast".into(), "slow".into()]);
/// assert_eq!(mode.to_string(), "one of [fast, slow]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// `true` / `false`; flags bind `true` when given without a value.
    Bool,
    /// Free text (the default).
    #[default]
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// File-system path.
    Path,
    /// Regular expression.
    Pattern,
    /// Human-readable duration such as `1h 30m`.
    Duration,
    /// Character-set name such as `UTF-8`.
    Charset,
    /// Absolute URI.
    Uri,
    /// One of a fixed set of symbolic names, matched case-insensitively.
    Choice(Vec<String>),
    /// Application-defined type served only by a registered converter.
    Custom(String),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "boolean"),
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "number"),
            Self::Path => write!(f, "path"),
            Self::Pattern => write!(f, "regular expression"),
            Self::Duration => write!(f, "duration"),
            Self::Charset => write!(f, "charset"),
            Self::Uri => write!(f, "URI"),
            Self::Choice(values) => write!(f, "one of [{}]", values.join(", ")),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Shape of the value bound to an option or positional parameter.
///
/// # Examples
///
/// ```
/// use argbind_core::{Arity, ValueKind, ValueType};
///
/// let flag = ValueType::Scalar(ValueKind::Bool);
/// assert_eq!(flag.default_option_arity(), Arity::ZERO);
///
/// let files = ValueType::Collection(ValueKind::Path);
/// assert!(files.is_collection());
/// assert_eq!(files.element(), &ValueKind::Path);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// A single value; repeated occurrences overwrite (last wins).
    Scalar(ValueKind),
    /// An ordered collection accumulated across occurrences.
    Collection(ValueKind),
}

impl Default for ValueType {
    fn default() -> Self {
        Self::Scalar(ValueKind::Text)
    }
}

impl ValueType {
    /// Returns the element kind.
    pub fn element(&self) -> &ValueKind {
        match self {
            Self::Scalar(kind) | Self::Collection(kind) => kind,
        }
    }

    /// Returns `true` for collection-typed values.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Arity used for options that do not declare one.
    pub fn default_option_arity(&self) -> Arity {
        match self {
            Self::Scalar(ValueKind::Bool) => Arity::ZERO,
            _ => Arity::exactly(1),
        }
    }

    /// Arity used for positional parameters that do not declare one.
    pub fn default_positional_arity(&self) -> Arity {
        match self {
            Self::Scalar(_) => Arity::exactly(1),
            Self::Collection(_) => Arity::at_least(0),
        }
    }
}

/// Index range of a positional parameter (inclusive).
///
/// An `end` of `None` marks an open-ended tail (`n..*`).
///
/// # Examples
///
/// ```
/// use argbind_core::IndexRange;
///
/// let tail = IndexRange::tail(1);
/// assert!(tail.contains(7));
/// assert!(!tail.contains(0));
/// assert!(tail.overlaps(&IndexRange::single(3)));
/// assert_eq!(IndexRange::range(0, 2).to_string(), "0..2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl IndexRange {
    pub const fn single(index: usize) -> Self {
        Self {
            start: index,
            end: Some(index),
        }
    }

    pub const fn range(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub const fn tail(start: usize) -> Self {
        Self { start, end: None }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end.is_none_or(|end| index <= end)
    }

    pub fn overlaps(&self, other: &IndexRange) -> bool {
        let self_before_other = self.end.is_some_and(|end| end < other.start);
        let other_before_self = other.end.is_some_and(|end| end < self.start);
        !self_before_other && !other_before_self
    }

    /// Index following this range, or `None` for an open tail or a range
    /// ending at `usize::MAX`.
    pub fn next_index(&self) -> Option<usize> {
        self.end.and_then(|end| end.checked_add(1))
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{end}"),
            Some(end) => write!(f, "{}..{end}", self.start),
            None => write!(f, "{}..*", self.start),
        }
    }
}

/// Spec of a named option.
///
/// An option has one or more names (aliases such as `-t` and `--tree`), a
/// value type, and an arity describing how many raw tokens each occurrence
/// consumes. Use [`new`](OptionSpec::new) or [`flag`](OptionSpec::flag) and
/// chain the builder methods.
///
/// # Examples
///
/// ```
/// use argbind_core::{Arity, OptionSpec, ValueKind, ValueType};
///
/// let verbose = OptionSpec::flag(&["-v", "--verbose"]).with_description("Be chatty");
/// assert_eq!(verbose.arity(), Arity::ZERO);
/// assert_eq!(verbose.canonical_name(), "--verbose");
///
/// let output = OptionSpec::new(&["-o", "--output"], ValueType::Scalar(ValueKind::Path))
///     .required();
/// assert!(output.matches("-o"));
/// assert_eq!(output.arity(), Arity::exactly(1));
/// assert_eq!(output.param_label(), "<output>");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Accepted names, each including its prefix (e.g. `-t`, `--tree`).
    pub names: Vec<String>,
    /// Target value type.
    #[serde(default)]
    pub value_type: ValueType,
    /// Explicit arity; derived from the value type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,
    /// Label shown for the option's parameter in usage help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Must be given on every invocation.
    #[serde(default)]
    pub required: bool,
    /// Omitted from usage help.
    #[serde(default)]
    pub hidden: bool,
    /// Requests usage help; short-circuits parsing.
    #[serde(default)]
    pub usage_help: bool,
    /// Requests version output; short-circuits parsing.
    #[serde(default)]
    pub version_help: bool,
    /// Name of a registered converter that overrides type-based lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    /// Raw value converted and bound when the option is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Raw value bound when the option occurs without any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_value: Option<String>,
    /// Separator splitting each raw value into several elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
}

impl OptionSpec {
    /// Creates an option with the given names and value type.
    pub fn new(names: &[&str], value_type: ValueType) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            value_type,
            ..Default::default()
        }
    }

    /// Creates a boolean flag that takes no values.
    pub fn flag(names: &[&str]) -> Self {
        Self::new(names, ValueType::Scalar(ValueKind::Bool))
    }

    /// Creates the conventional `-h`/`--help` option.
    pub fn help() -> Self {
        let mut option =
            Self::flag(&["-h", "--help"]).with_description("Show this help message and exit.");
        option.usage_help = true;
        option
    }

    /// Creates the conventional `-V`/`--version` option.
    pub fn version() -> Self {
        let mut option = Self::flag(&["-V", "--version"])
            .with_description("Print version information and exit.");
        option.version_help = true;
        option
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Marks the option as mandatory.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Hides the option from usage help.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Uses the named registered converter instead of the type's.
    pub fn with_converter(mut self, name: &str) -> Self {
        self.converter = Some(name.to_string());
        self
    }

    pub fn with_default(mut self, raw: &str) -> Self {
        self.default_value = Some(raw.to_string());
        self
    }

    pub fn with_fallback(mut self, raw: &str) -> Self {
        self.fallback_value = Some(raw.to_string());
        self
    }

    /// Splits every raw value on `separator` before conversion.
    pub fn split_on(mut self, separator: &str) -> Self {
        self.split = Some(separator.to_string());
        self
    }

    /// Returns the explicit arity, or the one implied by the value type.
    pub fn arity(&self) -> Arity {
        self.arity
            .unwrap_or_else(|| self.value_type.default_option_arity())
    }

    /// Returns the canonical name (first long form, falling back to the
    /// first declared name).
    pub fn canonical_name(&self) -> &str {
        self.names
            .iter()
            .find(|name| name.starts_with("--"))
            .or(self.names.first())
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Returns the single-character names (`-x`).
    pub fn short_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| is_short_name(name))
    }

    /// Checks if this option is known under `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns `true` for help or version options.
    pub fn is_short_circuit(&self) -> bool {
        self.usage_help || self.version_help
    }

    /// Label of the option's parameter, e.g. `<output>`.
    pub fn param_label(&self) -> String {
        match &self.label {
            Some(label) => angle_label(label),
            None => angle_label(self.canonical_name().trim_start_matches('-')),
        }
    }
}

/// Spec of a positional parameter.
///
/// Index and arity may be left unset; [`CommandSpec::validate`] assigns them
/// from declaration order and value type.
///
/// # Examples
///
/// ```
/// use argbind_core::{Arity, PositionalSpec, ValueKind, ValueType};
///
/// let files = PositionalSpec::new("file", ValueType::Collection(ValueKind::Path))
///     .with_arity(Arity::at_least(1));
/// assert_eq!(files.display_label(), "<file>");
/// assert_eq!(files.arity(), Arity::at_least(1));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionalSpec {
    /// Display label, e.g. `file`.
    pub label: String,
    #[serde(default)]
    pub value_type: ValueType,
    /// Total number of values bound; derived from the value type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,
    /// Positions covered; assigned during validation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl PositionalSpec {
    pub fn new(label: &str, value_type: ValueType) -> Self {
        Self {
            label: label.to_string(),
            value_type,
            ..Default::default()
        }
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn at_index(mut self, index: IndexRange) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn arity(&self) -> Arity {
        self.arity
            .unwrap_or_else(|| self.value_type.default_positional_arity())
    }

    /// Positions covered by this parameter.
    ///
    /// Always set on a validated spec; unvalidated specs report index 0.
    pub fn range(&self) -> IndexRange {
        self.index.unwrap_or(IndexRange::single(0))
    }

    /// Label in angle brackets, e.g. `<file>`.
    pub fn display_label(&self) -> String {
        angle_label(&self.label)
    }
}

/// Complete spec of a command level.
///
/// Built once through the `add_*`/`with_*` methods and then frozen by
/// [`validate`](CommandSpec::validate), which returns a shareable
/// [`ValidSpec`].
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let mut git = CommandSpec::new("git");
/// git.add_option(OptionSpec::help());
/// git.add_subcommand(
///     "commit",
///     CommandSpec::new("commit").with_option(
///         OptionSpec::new(&["-m", "--message"], ValueType::Scalar(ValueKind::Text)).required(),
///     ),
/// );
///
/// assert!(git.find_option("--help").is_some());
/// assert_eq!(git.subcommand_names(), vec!["commit"]);
///
/// let spec = git.validate().unwrap();
/// assert_eq!(spec.name, "git");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Spec contract version (populated from [`SPEC_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lines printed when version output is requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version: Vec<String>,
    /// Alternate names when used as a subcommand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default)]
    pub positionals: Vec<PositionalSpec>,
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
}

impl CommandSpec {
    pub fn new(name: &str) -> Self {
        Self {
            spec_version: Some(SPEC_CONTRACT_VERSION.to_string()),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds a line of version output.
    pub fn with_version(mut self, line: &str) -> Self {
        self.version.push(line.to_string());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn add_option(&mut self, option: OptionSpec) -> &mut Self {
        self.options.push(option);
        self
    }

    pub fn add_positional(&mut self, positional: PositionalSpec) -> &mut Self {
        self.positionals.push(positional);
        self
    }

    /// Registers `spec` as the subcommand `name`.
    pub fn add_subcommand(&mut self, name: &str, mut spec: CommandSpec) -> &mut Self {
        spec.name = name.to_string();
        self.subcommands.push(spec);
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.add_option(option);
        self
    }

    pub fn with_positional(mut self, positional: PositionalSpec) -> Self {
        self.add_positional(positional);
        self
    }

    pub fn with_subcommand(mut self, spec: CommandSpec) -> Self {
        let name = spec.name.clone();
        self.add_subcommand(&name, spec);
        self
    }

    /// Finds an option by exact name, returning its slot index.
    pub fn find_option(&self, name: &str) -> Option<(usize, &OptionSpec)> {
        self.options
            .iter()
            .enumerate()
            .find(|(_, option)| option.matches(name))
    }

    /// Finds a subcommand by name or alias, returning its slot index.
    pub fn find_subcommand(&self, name: &str) -> Option<(usize, &CommandSpec)> {
        self.subcommands
            .iter()
            .enumerate()
            .find(|(_, sub)| sub.name == name || sub.aliases.iter().any(|alias| alias == name))
    }

    /// Finds a positional parameter by label.
    pub fn find_positional(&self, label: &str) -> Option<(usize, &PositionalSpec)> {
        self.positionals
            .iter()
            .enumerate()
            .find(|(_, positional)| positional.label == label)
    }

    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }

    /// Iterates over every option name declared at this level.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .flat_map(|option| option.names.iter().map(String::as_str))
    }

    /// Validates the spec and freezes it.
    ///
    /// Unset positional indices and arities are assigned first, then every
    /// structural invariant is checked.
    ///
    /// # Errors
    ///
    /// Returns the first [`SpecError`] found; use
    /// [`validate_spec`](crate::validate_spec) to collect all of them.
    pub fn validate(mut self) -> Result<ValidSpec, SpecError> {
        normalize_spec(&mut self);
        match check_spec(&self).into_iter().next() {
            Some(error) => Err(error),
            None => Ok(ValidSpec(Arc::new(self))),
        }
    }
}

/// A validated, read-only [`CommandSpec`].
///
/// Cloning is cheap and the handle is `Send + Sync`, so one spec can back
/// any number of independent parses.
#[derive(Debug, Clone)]
pub struct ValidSpec(Arc<CommandSpec>);

impl ValidSpec {
    pub fn spec(&self) -> &CommandSpec {
        &self.0
    }
}

impl Deref for ValidSpec {
    type Target = CommandSpec;

    fn deref(&self) -> &CommandSpec {
        &self.0
    }
}

impl AsRef<CommandSpec> for ValidSpec {
    fn as_ref(&self) -> &CommandSpec {
        &self.0
    }
}

/// Returns `true` for names of the form `-x`.
pub fn is_short_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|ch| ch != '-') && chars.next().is_none()
}

fn angle_label(label: &str) -> String {
    if label.starts_with('<') && label.ends_with('>') {
        label.to_string()
    } else {
        format!("<{label}>")
    }
}
