//! Execution driver.
//!
//! [`CommandLine`] ties parsing, help/version output and the business
//! callable together:
//!
//! ```text
//! Start -> Parsing -> HelpRequested | VersionRequested | ValidationFailed | Ready
//! Ready -> Executing -> Success | BusinessError
//! every path ends in Done
//! ```
//!
//! Help and version text goes to the output writer. Parse errors go to the
//! error writer followed by usage help. Business errors go to the error
//! writer without usage help.

use std::fmt;
use std::io::{self, Write};

use argbind_core::{CommandSpec, ValidSpec};
use serde::Serialize;
use tracing::{debug, warn};

use crate::binder::Parser;
use crate::config::{ExitCodes, ParserConfig};
use crate::convert::ConverterRegistry;
use crate::error::ExecutionError;
use crate::help::{ColorMode, DEFAULT_WIDTH, HelpRenderer, StyleMode};
use crate::result::{ParseOutcome, ParseResult};

/// States visited by one [`CommandLine::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecState {
    Start,
    Parsing,
    HelpRequested,
    VersionRequested,
    ValidationFailed,
    Ready,
    Executing,
    Success,
    BusinessError,
    Done,
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::Parsing => "PARSING",
            Self::HelpRequested => "HELP_REQUESTED",
            Self::VersionRequested => "VERSION_REQUESTED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Ready => "READY",
            Self::Executing => "EXECUTING",
            Self::Success => "SUCCESS",
            Self::BusinessError => "BUSINESS_ERROR",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Business logic invoked with the bound values of a successful parse.
///
/// Returning `Ok(Some(code))` sets the exit code; `Ok(None)` uses the
/// configured success code.
pub trait Handler {
    fn run(&mut self, result: &ParseResult<'_>) -> anyhow::Result<Option<i32>>;
}

impl<F> Handler for F
where
    F: FnMut(&ParseResult<'_>) -> anyhow::Result<Option<i32>>,
{
    fn run(&mut self, result: &ParseResult<'_>) -> anyhow::Result<Option<i32>> {
        self(result)
    }
}

/// Record of one execution.
#[derive(Debug)]
pub struct Execution {
    pub exit_code: i32,
    /// Visited states, `Start` first and `Done` last.
    pub trail: Vec<ExecState>,
    /// The wrapped business error, if the handler failed.
    pub error: Option<ExecutionError>,
}

impl Execution {
    /// The state reached just before `Done`.
    pub fn outcome(&self) -> ExecState {
        self.trail
            .iter()
            .rev()
            .find(|state| **state != ExecState::Done)
            .copied()
            .unwrap_or(ExecState::Start)
    }

    pub fn visited(&self, state: ExecState) -> bool {
        self.trail.contains(&state)
    }
}

/// Parses a command line and runs business logic against it.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
/// use argbind_engine::{CommandLine, ExecState, ParseResult};
///
/// let spec = CommandSpec::new("greet")
///     .with_option(OptionSpec::help())
///     .with_positional(PositionalSpec::new("name", ValueType::Scalar(ValueKind::Text)))
///     .validate()
///     .unwrap();
/// let cli = CommandLine::new(spec);
///
/// let mut out = Vec::new();
/// let mut err = Vec::new();
/// let execution = cli.execute(
///     ["world"],
///     |result: &ParseResult<'_>| -> anyhow::Result<Option<i32>> {
///         assert_eq!(result.root().positional("name").unwrap().to_string(), "world");
///         Ok(None)
///     },
///     &mut out,
///     &mut err,
/// );
/// assert_eq!(execution.exit_code, 0);
/// assert_eq!(execution.outcome(), ExecState::Success);
/// ```
pub struct CommandLine {
    parser: Parser,
    exit_codes: ExitCodes,
    color: ColorMode,
    width: usize,
    diagnostics: bool,
}

impl CommandLine {
    /// Creates a driver using the built-in converters only.
    pub fn new(spec: ValidSpec) -> Self {
        Self {
            parser: Parser::new(spec, &ConverterRegistry::new()),
            exit_codes: ExitCodes::default(),
            color: ColorMode::default(),
            width: DEFAULT_WIDTH,
            diagnostics: false,
        }
    }

    /// Re-resolves every converter against `registry`.
    pub fn with_registry(mut self, registry: &ConverterRegistry) -> Self {
        let config = *self.parser.config();
        self.parser = Parser::new(self.parser.spec().clone(), registry).with_config(config);
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.parser = self.parser.with_config(config);
        self
    }

    pub fn with_exit_codes(mut self, exit_codes: ExitCodes) -> Self {
        self.exit_codes = exit_codes;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Prints the cause chain of business errors.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn exit_codes(&self) -> ExitCodes {
        self.exit_codes
    }

    pub fn parse<I, S>(&self, args: I) -> ParseOutcome<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parser.parse(args)
    }

    /// Usage help for the subcommand reached by `names` from the root.
    ///
    /// Returns `None` when a name does not resolve.
    pub fn usage(&self, names: &[&str], style: StyleMode) -> Option<String> {
        let mut current: &CommandSpec = self.parser.spec().spec();
        let mut path = vec![current];
        for name in names {
            let (_, sub) = current.find_subcommand(name)?;
            path.push(sub);
            current = sub;
        }
        Some(HelpRenderer::new(self.width, style).render(&path))
    }

    /// Runs the state machine, writing to the given writers.
    ///
    /// Styles are resolved as if neither writer were a terminal.
    pub fn execute<I, S>(
        &self,
        args: I,
        handler: impl Handler,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Execution
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let styles = (self.color.style(false), self.color.style(false));
        self.execute_styled(args, handler, out, err, styles)
    }

    /// Runs the state machine against stdout and stderr and returns the
    /// exit code.
    pub fn run<I, S>(&self, args: I, handler: impl Handler) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let styles = (self.color.for_stdout(), self.color.for_stderr());
        let stdout = io::stdout();
        let stderr = io::stderr();
        let execution = self.execute_styled(args, handler, &mut stdout.lock(), &mut stderr.lock(), styles);
        execution.exit_code
    }

    fn execute_styled<I, S>(
        &self,
        args: I,
        mut handler: impl Handler,
        out: &mut dyn Write,
        err: &mut dyn Write,
        (out_style, err_style): (StyleMode, StyleMode),
    ) -> Execution
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut trail = vec![ExecState::Start];
        enter(&mut trail, ExecState::Parsing);

        let mut execution = match self.parser.parse(args) {
            ParseOutcome::Help(result) => {
                enter(&mut trail, ExecState::HelpRequested);
                let renderer = HelpRenderer::new(self.width, out_style);
                emit(out, &renderer.render(&result.spec_path()));
                self.finished(trail, self.exit_codes.success, None)
            }
            ParseOutcome::Version(result) => {
                enter(&mut trail, ExecState::VersionRequested);
                let renderer = HelpRenderer::new(self.width, out_style);
                emit(out, &renderer.version(version_source(&result)));
                self.finished(trail, self.exit_codes.success, None)
            }
            ParseOutcome::Errors(result) => {
                enter(&mut trail, ExecState::ValidationFailed);
                let renderer = HelpRenderer::new(self.width, err_style);
                let mut text: String = result
                    .errors()
                    .iter()
                    .map(|error| format!("error: {error}\n"))
                    .collect();
                text.push('\n');
                text.push_str(&renderer.render(&result.spec_path()));
                emit(err, &text);
                self.finished(trail, self.exit_codes.usage, None)
            }
            ParseOutcome::Parsed(result) => {
                enter(&mut trail, ExecState::Ready);
                enter(&mut trail, ExecState::Executing);
                match handler.run(&result) {
                    Ok(code) => {
                        enter(&mut trail, ExecState::Success);
                        self.finished(trail, code.unwrap_or(self.exit_codes.success), None)
                    }
                    Err(error) => {
                        enter(&mut trail, ExecState::BusinessError);
                        let failure = ExecutionError {
                            command: result.command_path().join(" "),
                            error,
                        };
                        warn!(command = %failure.command, error = %failure.error, "Command failed");
                        emit(err, &self.describe(&failure));
                        self.finished(trail, self.exit_codes.software, Some(failure))
                    }
                }
            }
        };

        enter(&mut execution.trail, ExecState::Done);
        debug!(exit_code = execution.exit_code, "Execution finished");
        execution
    }

    fn finished(
        &self,
        trail: Vec<ExecState>,
        exit_code: i32,
        error: Option<ExecutionError>,
    ) -> Execution {
        Execution {
            exit_code,
            trail,
            error,
        }
    }

    fn describe(&self, failure: &ExecutionError) -> String {
        let mut text = format!("error: {failure}\n");
        if self.diagnostics {
            for cause in failure.error.chain().skip(1) {
                text.push_str(&format!("  caused by: {cause}\n"));
            }
        }
        text
    }
}

/// The deepest entered level declaring version text, else the root.
fn version_source<'s>(result: &ParseResult<'s>) -> &'s CommandSpec {
    let path = result.spec_path();
    path.iter()
        .rev()
        .find(|spec| !spec.version.is_empty())
        .copied()
        .unwrap_or(path[0])
}

fn enter(trail: &mut Vec<ExecState>, state: ExecState) {
    debug!(state = %state, "Execution state");
    trail.push(state);
}

fn emit(writer: &mut dyn Write, text: &str) {
    if let Err(e) = writer.write_all(text.as_bytes()).and_then(|()| writer.flush()) {
        warn!(error = %e, "Failed to write command output");
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};
    use argbind_core::{OptionSpec, ValueKind, ValueType};

    use super::*;

    fn spec() -> ValidSpec {
        CommandSpec::new("tool")
            .with_version("tool 2.0")
            .with_option(OptionSpec::help())
            .with_option(OptionSpec::version())
            .with_option(
                OptionSpec::new(&["-n", "--count"], ValueType::Scalar(ValueKind::Integer))
                    .required(),
            )
            .with_subcommand(CommandSpec::new("sync").with_option(OptionSpec::help()))
            .validate()
            .unwrap()
    }

    struct Captured {
        execution: Execution,
        out: String,
        err: String,
        invoked: bool,
    }

    fn execute(cli: &CommandLine, args: &[&str], fail: bool) -> Captured {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut invoked = false;
        let execution = cli.execute(
            args.iter().copied(),
            |result: &ParseResult<'_>| -> anyhow::Result<Option<i32>> {
                invoked = true;
                if fail {
                    return Err(anyhow!("disk unavailable")).context("sync failed");
                }
                Ok(result.value_of("--count").and_then(|v| v.as_i64()).map(|n| n as i32))
            },
            &mut out,
            &mut err,
        );
        Captured {
            execution,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
            invoked,
        }
    }

    #[test]
    fn test_success_uses_handler_exit_code() {
        let run = execute(&CommandLine::new(spec()), &["-n", "7"], false);

        assert!(run.invoked);
        assert_eq!(run.execution.exit_code, 7);
        assert_eq!(
            run.execution.trail,
            vec![
                ExecState::Start,
                ExecState::Parsing,
                ExecState::Ready,
                ExecState::Executing,
                ExecState::Success,
                ExecState::Done,
            ]
        );
        assert!(run.out.is_empty() && run.err.is_empty());
    }

    #[test]
    fn test_help_short_circuits_to_stdout() {
        let run = execute(&CommandLine::new(spec()), &["--help"], false);

        assert!(!run.invoked);
        assert_eq!(run.execution.exit_code, 0);
        assert_eq!(run.execution.outcome(), ExecState::HelpRequested);
        assert!(run.out.starts_with("Usage: tool "));
        assert!(run.err.is_empty());
    }

    #[test]
    fn test_help_renders_deepest_subcommand() {
        let run = execute(&CommandLine::new(spec()), &["sync", "-h"], false);
        assert!(run.out.starts_with("Usage: tool sync"));
    }

    #[test]
    fn test_version_prints_declared_lines() {
        let run = execute(&CommandLine::new(spec()), &["-V"], false);

        assert_eq!(run.execution.outcome(), ExecState::VersionRequested);
        assert_eq!(run.out, "tool 2.0\n");
    }

    #[test]
    fn test_parse_errors_print_usage_to_stderr() {
        let run = execute(&CommandLine::new(spec()), &["--bogus"], false);

        assert!(!run.invoked);
        assert_eq!(run.execution.exit_code, 2);
        assert_eq!(run.execution.outcome(), ExecState::ValidationFailed);
        assert!(run.err.contains("error: unknown option: '--bogus'\n"));
        assert!(run.err.contains("error: missing required option: '--count'\n"));
        assert!(run.err.contains("Usage: tool "));
        assert!(run.out.is_empty());
    }

    #[test]
    fn test_business_error_is_wrapped_without_usage() {
        let cli = CommandLine::new(spec()).with_exit_codes(ExitCodes {
            software: 70,
            ..ExitCodes::default()
        });
        let run = execute(&cli, &["-n", "1"], true);

        assert_eq!(run.execution.exit_code, 70);
        assert_eq!(run.execution.outcome(), ExecState::BusinessError);
        assert_eq!(run.err, "error: tool: sync failed\n");
        let failure = run.execution.error.unwrap();
        assert_eq!(failure.command, "tool");
    }

    #[test]
    fn test_diagnostics_print_cause_chain() {
        let cli = CommandLine::new(spec()).with_diagnostics(true);
        let run = execute(&cli, &["-n", "1"], true);

        assert!(run.err.contains("caused by: disk unavailable"));
    }

    #[test]
    fn test_usage_for_subcommand_path() {
        let cli = CommandLine::new(spec());
        let usage = cli.usage(&["sync"], StyleMode::Plain).unwrap();

        assert!(usage.starts_with("Usage: tool sync [-h]"));
        assert!(cli.usage(&["missing"], StyleMode::Plain).is_none());
    }
}
