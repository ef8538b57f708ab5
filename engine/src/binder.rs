//! Matcher/binder: walks the token stream and writes converted values into
//! the slot tables of a [`ParseResult`].
//!
//! Matching works on one command level at a time. A word naming a
//! subcommand closes the current level (defaults, required options and
//! positional minimums are settled) and opens the subcommand's level for
//! every following token.
//!
//! Value consumption follows the option's arity:
//!
//! - fixed arity `N` takes exactly the next `N` arguments literally, even if
//!   they look like options;
//! - variable arity `m..n` / `m..*` takes arguments greedily and stops at
//!   `--`, at anything naming an option of the current level, or at a
//!   subcommand name.

use argbind_core::{CommandSpec, OptionSpec, PositionalSpec, ValidSpec, ValueKind, ValueType};
use tracing::debug;

use crate::config::ParserConfig;
use crate::convert::{ConverterPlan, ConverterRegistry, Resolved};
use crate::error::ParseError;
use crate::result::{CommandMatch, OptionMatch, ParseOutcome, ParseResult};
use crate::tokenize::{Token, Tokenizer};
use crate::value::Value;

/// Binds argument vectors against a validated spec.
///
/// Converters are resolved once at construction. The parser is immutable
/// afterwards and can be shared between threads; each call to
/// [`parse`](Parser::parse) owns its own result.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
/// use argbind_engine::{ConverterRegistry, ParseOutcome, Parser, Value};
///
/// let spec = CommandSpec::new("tool")
///     .with_option(OptionSpec::new(&["-x"], ValueType::Collection(ValueKind::Text)))
///     .validate()
///     .unwrap();
/// let parser = Parser::new(spec, &ConverterRegistry::new());
///
/// let ParseOutcome::Parsed(result) = parser.parse(["-x", "a", "-x", "b"]) else {
///     panic!("expected a successful parse");
/// };
/// let values = result.value_of("-x").unwrap().as_list();
/// assert_eq!(values, &[Value::Text("a".into()), Value::Text("b".into())]);
/// ```
pub struct Parser {
    spec: ValidSpec,
    plan: ConverterPlan,
    config: ParserConfig,
}

impl Parser {
    pub fn new(spec: ValidSpec, registry: &ConverterRegistry) -> Self {
        let plan = ConverterPlan::build(&spec, registry);
        Self {
            spec,
            plan,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn spec(&self) -> &ValidSpec {
        &self.spec
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Binds `args` (without the program name) against the spec.
    pub fn parse<I, S>(&self, args: I) -> ParseOutcome<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        debug!(args = ?args, command = %self.spec.name, "Parsing arguments");

        let mut binding = Binding::new(self, args);
        binding.run();
        binding.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShortCircuit {
    Help,
    Version,
}

/// State of a single parse invocation.
struct Binding<'p> {
    config: ParserConfig,
    tokens: Tokenizer<std::vec::IntoIter<String>>,
    spec: &'p CommandSpec,
    plan: &'p ConverterPlan,
    active: CommandMatch<'p>,
    closed: Vec<CommandMatch<'p>>,
    path: Vec<&'p str>,
    errors: Vec<ParseError>,
    short_circuit: Option<ShortCircuit>,
}

impl<'p> Binding<'p> {
    fn new(parser: &'p Parser, args: Vec<String>) -> Self {
        let spec: &'p CommandSpec = &parser.spec;
        Self {
            config: parser.config,
            tokens: Tokenizer::new(args.into_iter(), parser.config.clustered_short_options),
            spec,
            plan: &parser.plan,
            active: CommandMatch::new(spec),
            closed: Vec::new(),
            path: vec![spec.name.as_str()],
            errors: Vec::new(),
            short_circuit: None,
        }
    }

    fn run(&mut self) {
        loop {
            let level = self.spec;
            let Some(token) = self.tokens.next_token(level) else {
                break;
            };
            match token {
                Token::EndOfOptions => debug!(command = %level.name, "End of options"),
                Token::Word(word) => self.bind_word(word),
                Token::Option { name, attached } => self.bind_option(name, attached),
            }
        }
    }

    fn finish(mut self) -> ParseOutcome<'p> {
        self.close_level();
        let mut levels = self.closed;
        levels.push(self.active);
        let result = ParseResult {
            levels,
            errors: self.errors,
        };

        match self.short_circuit {
            Some(ShortCircuit::Help) => ParseOutcome::Help(result),
            Some(ShortCircuit::Version) => ParseOutcome::Version(result),
            None if result.errors.is_empty() => ParseOutcome::Parsed(result),
            None => ParseOutcome::Errors(result),
        }
    }

    fn command(&self) -> String {
        self.path.join(" ")
    }

    fn report(&mut self, error: ParseError) {
        if !self.errors.contains(&error) {
            debug!(error = %error, "Parse error");
            self.errors.push(error);
        }
    }

    fn bind_word(&mut self, word: String) {
        let level = self.spec;
        if !self.tokens.options_ended() {
            if let Some((index, sub)) = level.find_subcommand(&word) {
                self.enter_subcommand(index, sub);
                return;
            }
        }

        let position = self.active.words.len();
        let counts = &self.active.positional_counts;
        let slot = level.positionals.iter().enumerate().find(|(index, positional)| {
            positional.range().contains(position)
                && positional.arity().max.is_none_or(|max| counts[*index] < max)
        });
        self.active.words.push(word.clone());

        let Some((index, positional)) = slot else {
            if self.config.allow_unmatched {
                self.active.unmatched.push(word);
            } else {
                let command = self.command();
                self.report(ParseError::UnexpectedArgument { command, arg: word });
            }
            return;
        };

        self.active.positional_counts[index] += 1;
        let target = positional_target(positional);
        let plan = self.plan;
        match convert_raws(
            &plan.positionals[index],
            &target,
            positional.value_type.element(),
            &[word],
        ) {
            Ok(values) => {
                debug!(command = %level.name, positional = %positional.label, position, "Bound positional");
                store(
                    &mut self.active.positional_values[index],
                    &positional.value_type,
                    values,
                );
            }
            Err(errors) => errors.into_iter().for_each(|e| self.report(e)),
        }
    }

    fn enter_subcommand(&mut self, index: usize, sub: &'p CommandSpec) {
        debug!(command = %self.spec.name, subcommand = %sub.name, "Entering subcommand");
        self.close_level();
        let parent = std::mem::replace(&mut self.active, CommandMatch::new(sub));
        self.closed.push(parent);
        let plan = self.plan;
        self.spec = sub;
        self.plan = &plan.subcommands[index];
        self.path.push(sub.name.as_str());
    }

    fn bind_option(&mut self, name: String, attached: Option<String>) {
        let Some((index, option)) = self.resolve_option(&name, attached.as_deref()) else {
            return;
        };

        if option.usage_help && self.short_circuit.is_none() {
            self.short_circuit = Some(ShortCircuit::Help);
        } else if option.version_help && self.short_circuit.is_none() {
            self.short_circuit = Some(ShortCircuit::Version);
        }

        let arity = option.arity();
        let target = option_target(option);
        let mut raws = Vec::new();

        if let Some(value) = attached {
            if arity.is_zero() {
                self.report(ParseError::ArityViolation {
                    target,
                    arity,
                    found: 1,
                });
                return;
            }
            raws.push(value);
        }

        if arity.is_fixed() {
            while raws.len() < arity.min {
                match self.tokens.next_raw() {
                    Some(raw) => raws.push(raw),
                    None => break,
                }
            }
        } else if raws.is_empty() || raws.len() < arity.min {
            let level = self.spec;
            let config = self.config;
            while arity.max.is_none_or(|max| raws.len() < max) {
                let Some(next) = self.tokens.peek_raw() else {
                    break;
                };
                if stops_consumption(level, &config, next) {
                    break;
                }
                match self.tokens.next_raw() {
                    Some(raw) => raws.push(raw),
                    None => break,
                }
            }
        }

        if !arity.allows(raws.len()) {
            self.report(ParseError::ArityViolation {
                target,
                arity,
                found: raws.len(),
            });
            return;
        }

        let elements = expand_values(option, &raws);
        let converted = if elements.is_empty() {
            self.implicit_value(index, option, &target)
        } else {
            convert_raws(
                &self.plan.options[index],
                &target,
                option.value_type.element(),
                &elements,
            )
        };

        let values = match converted {
            Ok(values) => values,
            Err(errors) => {
                errors.into_iter().for_each(|e| self.report(e));
                return;
            }
        };

        debug!(command = %self.spec.name, option = option.canonical_name(), raw = ?raws, "Bound option");
        store(&mut self.active.values[index], &option.value_type, values.clone());
        self.active.occurrences.push(OptionMatch {
            option: index,
            name: name_for(option, &name),
            raw: raws,
            values,
        });
    }

    /// Value bound when an occurrence consumed no values.
    fn implicit_value(
        &self,
        index: usize,
        option: &OptionSpec,
        target: &str,
    ) -> Result<Vec<Value>, Vec<ParseError>> {
        if let Some(fallback) = &option.fallback_value {
            let elements = expand_values(option, std::slice::from_ref(fallback));
            return convert_raws(
                &self.plan.options[index],
                target,
                option.value_type.element(),
                &elements,
            );
        }
        if *option.value_type.element() == ValueKind::Bool {
            return Ok(vec![Value::Bool(true)]);
        }
        Ok(Vec::new())
    }

    /// Resolves an option name at the current level: an exact name always
    /// wins, then a unique prefix when abbreviations are enabled.
    ///
    /// Reports ambiguous names; unknown names are reported or collected as
    /// unmatched.
    fn resolve_option(
        &mut self,
        name: &str,
        attached: Option<&str>,
    ) -> Option<(usize, &'p OptionSpec)> {
        let level = self.spec;
        if let Some(found) = level.find_option(name) {
            return Some(found);
        }

        if self.config.abbreviated_options && name.starts_with("--") {
            let candidates = prefix_candidates(level, name);
            match candidates.as_slice() {
                [(index, _)] => {
                    let index = *index;
                    return Some((index, &level.options[index]));
                }
                [] => {}
                _ => {
                    self.report(ParseError::AmbiguousOption {
                        name: name.to_string(),
                        candidates: candidates.into_iter().map(|(_, n)| n.to_string()).collect(),
                    });
                    return None;
                }
            }
        }

        if self.config.allow_unmatched {
            let raw = match attached {
                Some(value) => format!("{name}={value}"),
                None => name.to_string(),
            };
            self.active.unmatched.push(raw);
        } else {
            let command = self.command();
            self.report(ParseError::UnknownOption {
                command,
                name: name.to_string(),
            });
        }
        None
    }

    /// Settles the active level: converts defaults, then checks required
    /// options and positional minimums.
    fn close_level(&mut self) {
        let level = self.spec;
        let plan = self.plan;

        for (index, option) in level.options.iter().enumerate() {
            if self.active.is_matched(index) || self.active.values[index].is_some() {
                continue;
            }
            let Some(default) = &option.default_value else {
                continue;
            };
            let target = option_target(option);
            let elements = expand_values(option, std::slice::from_ref(default));
            match convert_raws(
                &plan.options[index],
                &target,
                option.value_type.element(),
                &elements,
            ) {
                Ok(values) => store(&mut self.active.values[index], &option.value_type, values),
                Err(errors) => errors.into_iter().for_each(|e| self.report(e)),
            }
        }

        for (index, option) in level.options.iter().enumerate() {
            if option.required && !self.active.is_matched(index) {
                let command = self.command();
                self.report(ParseError::MissingRequiredOption {
                    command,
                    name: option.canonical_name().to_string(),
                });
            }
        }

        for (index, positional) in level.positionals.iter().enumerate() {
            let arity = positional.arity();
            let found = self.active.positional_counts[index];
            if found < arity.min {
                self.report(ParseError::ArityViolation {
                    target: positional_target(positional),
                    arity,
                    found,
                });
            }
        }
    }
}

/// Decides whether a variable-arity option stops before `next`.
fn stops_consumption(level: &CommandSpec, config: &ParserConfig, next: &str) -> bool {
    if next == "--" || level.find_subcommand(next).is_some() {
        return true;
    }
    if !next.starts_with('-') || next == "-" {
        return false;
    }
    let name = next.split_once('=').map_or(next, |(name, _)| name);
    if level.find_option(next).is_some() || level.find_option(name).is_some() {
        return true;
    }
    if config.abbreviated_options
        && name.starts_with("--")
        && !prefix_candidates(level, name).is_empty()
    {
        return true;
    }
    if config.clustered_short_options && !next.starts_with("--") {
        let leading: String = next.chars().take(2).collect();
        return level.find_option(&leading).is_some();
    }
    false
}

/// Long option names of `level` starting with `prefix`, one per option, in
/// declaration order.
fn prefix_candidates<'s>(level: &'s CommandSpec, prefix: &str) -> Vec<(usize, &'s str)> {
    level
        .options
        .iter()
        .enumerate()
        .filter_map(|(index, option)| {
            option
                .names
                .iter()
                .find(|n| n.starts_with("--") && n.starts_with(prefix))
                .map(|n| (index, n.as_str()))
        })
        .collect()
}

/// The declared name the token resolved to.
fn name_for(option: &OptionSpec, given: &str) -> String {
    if option.matches(given) {
        given.to_string()
    } else {
        option
            .names
            .iter()
            .find(|n| n.starts_with(given))
            .cloned()
            .unwrap_or_else(|| option.canonical_name().to_string())
    }
}

fn expand_values(option: &OptionSpec, raws: &[String]) -> Vec<String> {
    match option.split.as_deref() {
        Some(separator) if !separator.is_empty() => raws
            .iter()
            .flat_map(|raw| raw.split(separator).map(String::from))
            .collect(),
        _ => raws.to_vec(),
    }
}

fn convert_raws(
    resolved: &Resolved,
    target: &str,
    kind: &ValueKind,
    raws: &[String],
) -> Result<Vec<Value>, Vec<ParseError>> {
    let converter = match resolved {
        Ok(converter) => converter,
        Err(missing) => {
            return Err(vec![ParseError::UnsupportedType {
                target: target.to_string(),
                type_name: missing.to_string(),
            }]);
        }
    };

    let mut values = Vec::with_capacity(raws.len());
    let mut errors = Vec::new();
    for raw in raws {
        match converter.convert(raw) {
            Ok(value) => values.push(value),
            Err(e) => errors.push(ParseError::ConversionError {
                target: target.to_string(),
                raw: raw.clone(),
                expected: kind.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

/// Writes converted values into a slot: scalars keep the last value,
/// collections append.
fn store(slot: &mut Option<Value>, value_type: &ValueType, values: Vec<Value>) {
    match value_type {
        ValueType::Collection(_) => match slot {
            Some(Value::List(items)) => items.extend(values),
            _ => *slot = Some(Value::List(values)),
        },
        ValueType::Scalar(_) => {
            if let Some(last) = values.into_iter().last() {
                *slot = Some(last);
            }
        }
    }
}

fn option_target(option: &OptionSpec) -> String {
    format!("option '{}'", option.canonical_name())
}

fn positional_target(positional: &PositionalSpec) -> String {
    format!("positional parameter '{}'", positional.display_label())
}

#[cfg(test)]
mod tests {
    use argbind_core::{Arity, IndexRange};

    use super::*;

    fn parser(spec: CommandSpec) -> Parser {
        Parser::new(spec.validate().unwrap(), &ConverterRegistry::new())
    }

    fn tree_spec() -> CommandSpec {
        CommandSpec::new("tool")
            .with_option(OptionSpec::help())
            .with_option(OptionSpec::flag(&["-a", "--all"]))
            .with_option(OptionSpec::new(
                &["-L", "--level"],
                ValueType::Scalar(ValueKind::Integer),
            ))
            .with_option(OptionSpec::new(&["-x"], ValueType::Collection(ValueKind::Text)))
            .with_option(
                OptionSpec::new(&["--pair"], ValueType::Collection(ValueKind::Text))
                    .with_arity(Arity::exactly(2)),
            )
            .with_positional(PositionalSpec::new("dir", ValueType::Collection(ValueKind::Path)))
    }

    fn parsed<'a>(outcome: ParseOutcome<'a>) -> ParseResult<'a> {
        match outcome {
            ParseOutcome::Parsed(result) => result,
            other => panic!("expected success, got {:?}", other.result().errors()),
        }
    }

    #[test]
    fn test_binds_flags_values_and_positionals() {
        let parser = parser(tree_spec());
        let result = parsed(parser.parse(["-a", "-L", "3", "src", "docs"]));

        assert!(result.has_option("--all"));
        assert_eq!(result.value_of("-L"), Some(&Value::Integer(3)));
        assert_eq!(
            result.root().positional("dir").map(Value::as_list),
            Some(&[Value::Path("src".into()), Value::Path("docs".into())][..])
        );
    }

    #[test]
    fn test_scalar_last_occurrence_wins() {
        let parser = parser(tree_spec());
        let result = parsed(parser.parse(["-L", "1", "--level=2"]));

        assert_eq!(result.value_of("--level"), Some(&Value::Integer(2)));
        assert_eq!(result.root().matches("-L").count(), 2);
    }

    #[test]
    fn test_fixed_arity_takes_option_like_values_literally() {
        let parser = parser(tree_spec());
        let result = parsed(parser.parse(["--pair", "-a", "-L"]));

        assert!(!result.has_option("-a"));
        assert_eq!(
            result.value_of("--pair"),
            Some(&Value::List(vec![
                Value::Text("-a".into()),
                Value::Text("-L".into())
            ]))
        );
    }

    #[test]
    fn test_fixed_arity_shortfall_is_reported() {
        let parser = parser(tree_spec());
        let outcome = parser.parse(["--pair", "one"]);

        assert!(matches!(outcome, ParseOutcome::Errors(_)));
        assert_eq!(
            outcome.result().errors(),
            &[ParseError::ArityViolation {
                target: "option '--pair'".into(),
                arity: Arity::exactly(2),
                found: 1,
            }]
        );
    }

    #[test]
    fn test_variable_arity_stops_at_next_option() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-v"]))
            .with_option(
                OptionSpec::new(&["--files"], ValueType::Collection(ValueKind::Path))
                    .with_arity(Arity::at_least(1)),
            )
            .with_positional(PositionalSpec::new("rest", ValueType::Collection(ValueKind::Text)));
        let parser = parser(spec);

        let result = parsed(parser.parse(["--files", "a", "b", "-v", "c"]));
        assert_eq!(result.value_of("--files").map(|v| v.as_list().len()), Some(2));
        assert!(result.has_option("-v"));
        assert_eq!(result.root().words(), &["c".to_string()]);

        let result = parsed(parser.parse(["--files", "a", "--", "b"]));
        assert_eq!(result.value_of("--files").map(|v| v.as_list().len()), Some(1));
        assert_eq!(result.root().words(), &["b".to_string()]);
    }

    #[test]
    fn test_variable_arity_minimum_not_met() {
        let spec = CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-v"]))
            .with_option(
                OptionSpec::new(&["--files"], ValueType::Collection(ValueKind::Path))
                    .with_arity(Arity::range(1, 3)),
            );
        let parser = parser(spec);
        let outcome = parser.parse(["--files", "-v"]);

        assert!(matches!(
            outcome.result().errors(),
            [ParseError::ArityViolation { found: 0, .. }]
        ));
    }

    #[test]
    fn test_attached_value_on_flag_is_rejected() {
        let parser = parser(tree_spec());
        let outcome = parser.parse(["--all=yes"]);
        assert!(matches!(
            outcome.result().errors(),
            [ParseError::ArityViolation { found: 1, .. }]
        ));
    }

    #[test]
    fn test_unknown_option_and_unmatched_collection() {
        let parser = parser(tree_spec());
        let outcome = parser.parse(["--bogus"]);
        assert_eq!(
            outcome.result().errors(),
            &[ParseError::UnknownOption {
                command: "tool".into(),
                name: "--bogus".into(),
            }]
        );

        let parser = parser.with_config(ParserConfig {
            allow_unmatched: true,
            ..ParserConfig::default()
        });
        let result = parsed(parser.parse(["--bogus=1", "-a"]));
        assert_eq!(result.root().unmatched(), &["--bogus=1".to_string()]);
        assert!(result.has_option("-a"));
    }

    #[test]
    fn test_conversion_error_names_raw_token() {
        let parser = parser(tree_spec());
        let outcome = parser.parse(["-L", "deep"]);
        let [ParseError::ConversionError { raw, expected, .. }] = outcome.result().errors() else {
            panic!("expected one conversion error");
        };
        assert_eq!(raw, "deep");
        assert_eq!(expected, "integer");
    }

    #[test]
    fn test_help_wins_over_missing_required() {
        let spec = tree_spec().with_option(
            OptionSpec::new(&["--out"], ValueType::Scalar(ValueKind::Path)).required(),
        );
        let parser = parser(spec);
        let outcome = parser.parse(["--bogus", "-h"]);

        assert!(matches!(outcome, ParseOutcome::Help(_)));
        assert!(!outcome.result().errors().is_empty());
    }

    #[test]
    fn test_missing_required_option() {
        let spec = CommandSpec::new("tool").with_option(
            OptionSpec::new(&["-o", "--out"], ValueType::Scalar(ValueKind::Path)).required(),
        );
        let parser = parser(spec);
        let outcome = parser.parse(Vec::<String>::new());
        assert_eq!(
            outcome.result().errors(),
            &[ParseError::MissingRequiredOption {
                command: "tool".into(),
                name: "--out".into(),
            }]
        );
    }

    #[test]
    fn test_defaults_fill_unmatched_options_but_not_required() {
        let spec = CommandSpec::new("tool")
            .with_option(
                OptionSpec::new(&["--jobs"], ValueType::Scalar(ValueKind::Integer))
                    .with_default("4"),
            )
            .with_option(
                OptionSpec::new(&["--mode"], ValueType::Scalar(ValueKind::Text))
                    .with_default("fast")
                    .required(),
            );
        let parser = parser(spec);
        let outcome = parser.parse(Vec::<String>::new());
        let result = outcome.result();

        assert_eq!(result.value_of("--jobs"), Some(&Value::Integer(4)));
        assert!(result.root().is_defaulted("--jobs"));
        assert!(!result.has_option("--jobs"));
        assert!(matches!(
            result.errors(),
            [ParseError::MissingRequiredOption { .. }]
        ));
    }

    #[test]
    fn test_fallback_value_for_optional_parameter() {
        let spec = CommandSpec::new("tool").with_option(
            OptionSpec::new(
                &["--color"],
                ValueType::Scalar(ValueKind::Choice(vec!["always".into(), "never".into()])),
            )
            .with_arity(Arity::range(0, 1))
            .with_fallback("always"),
        );
        let parser = parser(spec);

        let result = parsed(parser.parse(["--color"]));
        assert_eq!(result.value_of("--color"), Some(&Value::Choice("always".into())));

        let result = parsed(parser.parse(["--color=NEVER"]));
        assert_eq!(result.value_of("--color"), Some(&Value::Choice("never".into())));
    }

    #[test]
    fn test_split_values() {
        let spec = CommandSpec::new("tool").with_option(
            OptionSpec::new(&["--tags"], ValueType::Collection(ValueKind::Text)).split_on(","),
        );
        let parser = parser(spec);
        let result = parsed(parser.parse(["--tags", "a,b", "--tags=c"]));

        assert_eq!(
            result.value_of("--tags"),
            Some(&Value::List(vec![
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Text("c".into()),
            ]))
        );
    }

    #[test]
    fn test_subcommand_switches_level() {
        let spec = CommandSpec::new("git")
            .with_option(OptionSpec::flag(&["-v"]))
            .with_subcommand(
                CommandSpec::new("commit")
                    .with_alias("ci")
                    .with_option(OptionSpec::new(&["-m"], ValueType::Scalar(ValueKind::Text)))
                    .with_option(OptionSpec::flag(&["-v"])),
            );
        let parser = parser(spec);
        let result = parsed(parser.parse(["-v", "ci", "-m", "msg"]));

        assert_eq!(result.command_path(), vec!["git", "commit"]);
        assert!(result.root().has_option("-v"));
        assert!(!result.leaf().has_option("-v"));
        assert!(!result.has_option("-v"));
        assert_eq!(result.value_of("-m"), Some(&Value::Text("msg".into())));
    }

    #[test]
    fn test_parent_options_unknown_in_subcommand() {
        let spec = CommandSpec::new("git")
            .with_option(OptionSpec::flag(&["-v"]))
            .with_subcommand(CommandSpec::new("push"));
        let parser = parser(spec);
        let outcome = parser.parse(["push", "-v"]);
        assert_eq!(
            outcome.result().errors(),
            &[ParseError::UnknownOption {
                command: "git push".into(),
                name: "-v".into(),
            }]
        );
    }

    #[test]
    fn test_positional_indices_and_surplus_words() {
        let spec = CommandSpec::new("cp")
            .with_positional(PositionalSpec::new("source", ValueType::Scalar(ValueKind::Path)))
            .with_positional(PositionalSpec::new("target", ValueType::Scalar(ValueKind::Path)));
        let parser = parser(spec);

        let result = parsed(parser.parse(["a", "b"]));
        assert_eq!(result.root().positional("target"), Some(&Value::Path("b".into())));

        let outcome = parser.parse(["a", "b", "c"]);
        assert_eq!(
            outcome.result().errors(),
            &[ParseError::UnexpectedArgument {
                command: "cp".into(),
                arg: "c".into(),
            }]
        );

        let outcome = parser.parse(["a"]);
        assert!(matches!(
            outcome.result().errors(),
            [ParseError::ArityViolation { found: 0, .. }]
        ));
    }

    #[test]
    fn test_explicit_positional_range_caps_capacity() {
        let spec = CommandSpec::new("tool")
            .with_positional(
                PositionalSpec::new("pair", ValueType::Collection(ValueKind::Integer))
                    .at_index(IndexRange::range(0, 1))
                    .with_arity(Arity::exactly(2)),
            )
            .with_positional(
                PositionalSpec::new("rest", ValueType::Collection(ValueKind::Text))
                    .at_index(IndexRange::tail(2)),
            );
        let parser = parser(spec);
        let result = parsed(parser.parse(["1", "2", "x", "y"]));

        assert_eq!(
            result.root().positional("pair"),
            Some(&Value::List(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_eq!(result.root().positional("rest").map(|v| v.as_list().len()), Some(2));
    }

    #[test]
    fn test_unsupported_type_only_when_reached() {
        let spec = CommandSpec::new("tool").with_option(OptionSpec::new(
            &["--color"],
            ValueType::Scalar(ValueKind::Custom("rgb".into())),
        ));
        let parser = parser(spec);

        assert!(matches!(parser.parse(Vec::<String>::new()), ParseOutcome::Parsed(_)));
        assert!(matches!(
            parser.parse(["--color", "red"]).result().errors(),
            [ParseError::UnsupportedType { .. }]
        ));
    }
}
