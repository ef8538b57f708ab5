//! Binding engine for declarative command-line specs.
//!
//! Takes a validated [`CommandSpec`](argbind_core::CommandSpec) and an
//! argument vector and produces typed bindings:
//!
//! 1. [`tokenize`] splits clusters, attached values and the `--` marker.
//! 2. [`Parser`] matches tokens to options, positionals and subcommands and
//!    converts raw values through the [`ConverterRegistry`].
//! 3. [`ParseOutcome`] reports help/version requests, errors or a
//!    successful [`ParseResult`].
//! 4. [`CommandLine`] drives the whole cycle: prints help, version or
//!    errors with usage, or invokes business logic and maps the outcome to
//!    an exit code.
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//! use argbind_engine::{ParseOutcome, Parser, ConverterRegistry, Value};
//!
//! let spec = CommandSpec::new("tree")
//!     .with_option(OptionSpec::help())
//!     .with_option(OptionSpec::new(&["-L", "--level"], ValueType::Scalar(ValueKind::Integer)))
//!     .with_positional(PositionalSpec::new("dir", ValueType::Collection(ValueKind::Path)))
//!     .validate()
//!     .unwrap();
//! let parser = Parser::new(spec, &ConverterRegistry::new());
//!
//! match parser.parse(["-L", "2", "src"]) {
//!     ParseOutcome::Parsed(result) => {
//!         assert_eq!(result.value_of("--level"), Some(&Value::Integer(2)));
//!     }
//!     other => panic!("unexpected outcome: {:?}", other.result().errors()),
//! }
//!
//! assert!(matches!(parser.parse(["--help", "-L"]), ParseOutcome::Help(_)));
//! ```

mod binder;
mod config;
pub mod convert;
mod driver;
mod error;
pub mod help;
pub mod output;
mod result;
pub mod tokenize;
mod value;

pub use binder::Parser;
pub use config::{ExitCodes, ParserConfig};
pub use convert::{BuiltinConverter, ConvertError, Converter, ConverterRegistry, Unresolved};
pub use driver::{CommandLine, ExecState, Execution, Handler};
pub use error::{ExecutionError, ParseError};
pub use help::{ColorMode, HelpRenderer, StyleMode};
pub use output::OutputFormat;
pub use result::{
    BoundOption, BoundPositional, CommandMatch, LevelReport, OptionMatch, ParseOutcome,
    ParseReport, ParseResult,
};
pub use value::Value;
