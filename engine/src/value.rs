//! Typed values produced by converters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Serialize, Serializer};
use url::Url;

/// A converted argument value.
///
/// Scalars bind one `Value`; collection-typed targets bind a
/// [`List`](Value::List) preserving encounter order.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Text(String),
    Integer(i64),
    Float(f64),
    Path(PathBuf),
    Pattern(Regex),
    Duration(Duration),
    /// Canonical character-set name, e.g. `UTF-8`.
    Charset(String),
    Uri(Url),
    /// The declared symbolic name a choice matched.
    Choice(String),
    List(Vec<Value>),
}

impl Value {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::Path(_) => "path",
            Self::Pattern(_) => "regular expression",
            Self::Duration(_) => "duration",
            Self::Charset(_) => "charset",
            Self::Uri(_) => "URI",
            Self::Choice(_) => "choice",
            Self::List(_) => "list",
        }
    }

    /// Returns the text of `Text`, `Choice` and `Charset` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) | Self::Charset(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            Self::Pattern(re) => Some(re),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&Url> {
        match self {
            Self::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Returns the elements of a list, or the value itself as a one-element
    /// slice.
    pub fn as_list(&self) -> &[Value] {
        match self {
            Self::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Charset(a), Self::Charset(b)) => a == b,
            (Self::Uri(a), Self::Uri(b)) => a == b,
            (Self::Choice(a), Self::Choice(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) | Self::Charset(s) | Self::Choice(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Pattern(re) => f.write_str(re.as_str()),
            Self::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
            Self::Uri(u) => f.write_str(u.as_str()),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::List(items) => serializer.collect_seq(items),
            other => serializer.collect_str(other),
        }
    }
}
