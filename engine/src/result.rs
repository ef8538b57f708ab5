//! Parse results and the query surface over them.
//!
//! A [`ParseResult`] is produced by one [`Parser::parse`](crate::Parser::parse)
//! call and is read-only afterwards. It holds one [`CommandMatch`] per command
//! level entered (root first) plus every error collected along the way.

use argbind_core::CommandSpec;
use serde::Serialize;

use crate::error::ParseError;
use crate::value::Value;

/// One occurrence of an option on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMatch {
    /// Slot index of the option in its [`CommandSpec::options`].
    pub option: usize,
    /// The name as resolved from the token, e.g. `--tree` for `--tr`.
    pub name: String,
    /// Raw values consumed by this occurrence.
    pub raw: Vec<String>,
    /// Converted values of this occurrence.
    pub values: Vec<Value>,
}

/// Bindings for a single command level.
#[derive(Debug, Clone)]
pub struct CommandMatch<'s> {
    pub(crate) spec: &'s CommandSpec,
    pub(crate) occurrences: Vec<OptionMatch>,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) positional_values: Vec<Option<Value>>,
    pub(crate) positional_counts: Vec<usize>,
    pub(crate) words: Vec<String>,
    pub(crate) unmatched: Vec<String>,
}

impl<'s> CommandMatch<'s> {
    pub(crate) fn new(spec: &'s CommandSpec) -> Self {
        Self {
            spec,
            occurrences: Vec::new(),
            values: vec![None; spec.options.len()],
            positional_values: vec![None; spec.positionals.len()],
            positional_counts: vec![0; spec.positionals.len()],
            words: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    /// The spec of this level.
    pub fn spec(&self) -> &'s CommandSpec {
        self.spec
    }

    /// Returns `true` if the option known as `name` occurred at least once.
    pub fn has_option(&self, name: &str) -> bool {
        self.spec
            .find_option(name)
            .is_some_and(|(index, _)| self.is_matched(index))
    }

    pub(crate) fn is_matched(&self, index: usize) -> bool {
        self.occurrences.iter().any(|m| m.option == index)
    }

    /// Value bound to the option known as `name`, including its default.
    ///
    /// Scalars hold the last occurrence; collections hold a
    /// [`Value::List`] in encounter order.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        let (index, _) = self.spec.find_option(name)?;
        self.values.get(index)?.as_ref()
    }

    /// Returns `true` when the option's value came from its default.
    pub fn is_defaulted(&self, name: &str) -> bool {
        self.spec.find_option(name).is_some_and(|(index, _)| {
            !self.is_matched(index) && self.values.get(index).is_some_and(Option::is_some)
        })
    }

    /// Occurrences of the option known as `name`, in command-line order.
    pub fn matches<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a OptionMatch> + 'a {
        let index = self.spec.find_option(name).map(|(index, _)| index);
        self.occurrences
            .iter()
            .filter(move |m| Some(m.option) == index)
    }

    /// Every option occurrence at this level, in command-line order.
    pub fn occurrences(&self) -> &[OptionMatch] {
        &self.occurrences
    }

    /// Value bound to the positional parameter `label`.
    pub fn positional(&self, label: &str) -> Option<&Value> {
        let (index, _) = self.spec.find_positional(label)?;
        self.positional_values.get(index)?.as_ref()
    }

    /// Bound positional parameters as `(label, value)` in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = (&'s str, &Value)> + '_ {
        self.spec
            .positionals
            .iter()
            .zip(&self.positional_values)
            .filter_map(|(spec, value)| value.as_ref().map(|v| (spec.label.as_str(), v)))
    }

    /// Raw positional words in the order they were given.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Tokens collected because unmatched arguments were permitted.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }
}

/// Outcome of binding one argument vector.
#[derive(Debug, Clone)]
pub struct ParseResult<'s> {
    pub(crate) levels: Vec<CommandMatch<'s>>,
    pub(crate) errors: Vec<ParseError>,
}

impl<'s> ParseResult<'s> {
    /// All entered levels, root first.
    pub fn levels(&self) -> &[CommandMatch<'s>] {
        &self.levels
    }

    pub fn root(&self) -> &CommandMatch<'s> {
        &self.levels[0]
    }

    /// The deepest subcommand level entered.
    pub fn leaf(&self) -> &CommandMatch<'s> {
        &self.levels[self.levels.len() - 1]
    }

    /// Specs of the entered levels, root first.
    pub fn spec_path(&self) -> Vec<&'s CommandSpec> {
        self.levels.iter().map(|level| level.spec).collect()
    }

    /// Names of the entered levels, root first.
    pub fn command_path(&self) -> Vec<&'s str> {
        self.levels.iter().map(|level| level.spec.name.as_str()).collect()
    }

    /// Returns `true` if `name` occurred at the deepest level declaring it.
    pub fn has_option(&self, name: &str) -> bool {
        self.declaring_level(name)
            .is_some_and(|level| level.has_option(name))
    }

    /// Value of `name` at the deepest level declaring it.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.declaring_level(name)?.value_of(name)
    }

    fn declaring_level(&self, name: &str) -> Option<&CommandMatch<'s>> {
        self.levels
            .iter()
            .rev()
            .find(|level| level.spec.find_option(name).is_some())
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Builds a serializable summary of every binding and error.
    pub fn report(&self) -> ParseReport {
        ParseReport {
            command_path: self.command_path().into_iter().map(String::from).collect(),
            levels: self.levels.iter().map(LevelReport::from_match).collect(),
            errors: self.errors.clone(),
        }
    }
}

/// Short-circuit-aware result of [`Parser::parse`](crate::Parser::parse).
///
/// Help and version requests take priority over every error.
#[derive(Debug, Clone)]
pub enum ParseOutcome<'s> {
    Help(ParseResult<'s>),
    Version(ParseResult<'s>),
    Parsed(ParseResult<'s>),
    Errors(ParseResult<'s>),
}

impl<'s> ParseOutcome<'s> {
    pub fn result(&self) -> &ParseResult<'s> {
        match self {
            Self::Help(result)
            | Self::Version(result)
            | Self::Parsed(result)
            | Self::Errors(result) => result,
        }
    }

    pub fn into_result(self) -> ParseResult<'s> {
        match self {
            Self::Help(result)
            | Self::Version(result)
            | Self::Parsed(result)
            | Self::Errors(result) => result,
        }
    }

    /// Short name of the outcome, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Help(_) => "help",
            Self::Version(_) => "version",
            Self::Parsed(_) => "parsed",
            Self::Errors(_) => "errors",
        }
    }
}

/// Serializable summary of a [`ParseResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub command_path: Vec<String>,
    pub levels: Vec<LevelReport>,
    pub errors: Vec<ParseError>,
}

/// Bindings of one command level in a [`ParseReport`].
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    pub command: String,
    pub options: Vec<BoundOption>,
    pub positionals: Vec<BoundPositional>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundOption {
    pub name: String,
    pub value: Option<Value>,
    pub occurrences: usize,
    /// `true` when the value came from the option's default.
    pub defaulted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundPositional {
    pub label: String,
    pub value: Value,
}

impl LevelReport {
    fn from_match(level: &CommandMatch<'_>) -> Self {
        let options = level
            .spec
            .options
            .iter()
            .enumerate()
            .filter_map(|(index, option)| {
                let occurrences = level.occurrences.iter().filter(|m| m.option == index).count();
                let value = level.values[index].clone();
                (occurrences > 0 || value.is_some()).then(|| BoundOption {
                    name: option.canonical_name().to_string(),
                    defaulted: occurrences == 0,
                    value,
                    occurrences,
                })
            })
            .collect();
        let positionals = level
            .positionals()
            .map(|(label, value)| BoundPositional {
                label: label.to_string(),
                value: value.clone(),
            })
            .collect();

        Self {
            command: level.spec.name.clone(),
            options,
            positionals,
            unmatched: level.unmatched.clone(),
        }
    }
}
