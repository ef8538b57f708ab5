//! Spec model for declarative command-line argument binding.
//!
//! This crate defines the immutable description a parser binds an argument
//! vector against:
//!
//! - [`CommandSpec`]: one command level with its options, positional parameters,
//!   subcommands, description and version text.
//! - [`OptionSpec`]: a named option with aliases, arity, value type and
//!   help/version markers.
//! - [`PositionalSpec`]: a positional parameter with an index range and
//!   arity.
//! - [`ValueType`] / [`ValueKind`]: the target type descriptor used to pick
//!   a converter.
//!
//! Validation ([`CommandSpec::validate`], [`validate_spec`]) catches
//! duplicate names, malformed arities and overlapping positionals, and
//! freezes the spec into a shareable [`ValidSpec`].
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//!
//! let spec = CommandSpec::new("tree")
//!     .with_description("List directory contents as a tree")
//!     .with_option(OptionSpec::help())
//!     .with_option(
//!         OptionSpec::new(&["-L", "--level"], ValueType::Scalar(ValueKind::Integer))
//!             .with_description("Descend only this many levels"),
//!     )
//!     .with_positional(PositionalSpec::new("dir", ValueType::Collection(ValueKind::Path)))
//!     .validate()
//!     .unwrap();
//!
//! assert_eq!(spec.find_option("-L").map(|(index, _)| index), Some(1));
//! assert_eq!(spec.positionals[0].index, Some(IndexRange::tail(0)));
//! ```

mod types;
mod validate;

pub use types::*;
pub use validate::{SpecError, validate_spec};
