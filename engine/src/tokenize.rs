//! Argument tokenizer.
//!
//! Splits clustered short options (`-abc`), attached values (`--name=value`,
//! `-cVALUE`) and the `--` end-of-options marker out of an already-split
//! argument vector. The tokenizer is single-pass: it reads each raw argument
//! once and cannot be restarted.
//!
//! Splitting a cluster needs to know which short options take values, so
//! tokens are produced against the command level that is active when they
//! are read.

use std::collections::VecDeque;
use std::iter::Peekable;

use argbind_core::CommandSpec;

/// Lexical token produced from the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An option name with an optional value attached in the same argument.
    Option {
        name: String,
        attached: Option<String>,
    },
    /// The literal `--` marker.
    EndOfOptions,
    /// Any other argument, including everything after `--`.
    Word(String),
}

/// Lazily tokenizes an argument vector.
pub struct Tokenizer<I: Iterator<Item = String>> {
    args: Peekable<I>,
    pending: VecDeque<Token>,
    options_ended: bool,
    clustering: bool,
}

impl<I: Iterator<Item = String>> Tokenizer<I> {
    pub fn new(args: I, clustering: bool) -> Self {
        Self {
            args: args.peekable(),
            pending: VecDeque::new(),
            options_ended: false,
            clustering,
        }
    }

    /// Returns `true` once `--` has been read.
    pub fn options_ended(&self) -> bool {
        self.options_ended
    }

    /// Reads the next token, interpreting option syntax against `level`.
    pub fn next_token(&mut self, level: &CommandSpec) -> Option<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }
        let raw = self.args.next()?;
        Some(self.classify(raw, level))
    }

    /// Reads the next raw argument literally, without any option handling.
    ///
    /// Cluster remainders are never pending when an option consumes
    /// values: a value-taking short option swallows the rest of its cluster.
    pub fn next_raw(&mut self) -> Option<String> {
        self.args.next()
    }

    /// Peeks at the next raw argument.
    pub fn peek_raw(&mut self) -> Option<&str> {
        self.args.peek().map(String::as_str)
    }

    fn classify(&mut self, raw: String, level: &CommandSpec) -> Token {
        if self.options_ended {
            return Token::Word(raw);
        }
        if raw == "--" {
            self.options_ended = true;
            return Token::EndOfOptions;
        }
        if !raw.starts_with('-') || raw == "-" {
            return Token::Word(raw);
        }
        if raw.starts_with("--") {
            return split_attached(&raw);
        }
        if level.find_option(&raw).is_some() {
            return Token::Option {
                name: raw,
                attached: None,
            };
        }
        if let Some((name, value)) = raw.split_once('=') {
            if level.find_option(name).is_some() {
                return Token::Option {
                    name: name.to_string(),
                    attached: Some(value.to_string()),
                };
            }
        }

        let body = &raw[1..];
        let leading_short = body.chars().next().map(|ch| format!("-{ch}"));
        let starts_known_short = leading_short
            .as_deref()
            .is_some_and(|short| level.find_option(short).is_some());

        if !starts_known_short && looks_like_number(body) {
            return Token::Word(raw);
        }
        if self.clustering && starts_known_short {
            self.split_cluster(body, level);
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
        }
        split_attached(&raw)
    }

    /// Expands `-abc` into `-a -b -c`; the first value-taking option
    /// receives the remainder of the cluster as its attached value.
    fn split_cluster(&mut self, body: &str, level: &CommandSpec) {
        let mut rest = body;
        while let Some(ch) = rest.chars().next() {
            let name = format!("-{ch}");
            let after = &rest[ch.len_utf8()..];
            let takes_value = level
                .find_option(&name)
                .is_some_and(|(_, option)| !option.arity().is_zero());

            if takes_value || after.starts_with('=') {
                let value = after.strip_prefix('=').unwrap_or(after);
                let attached = (!value.is_empty() || after.starts_with('='))
                    .then(|| value.to_string());
                self.pending.push_back(Token::Option { name, attached });
                return;
            }

            self.pending.push_back(Token::Option {
                name,
                attached: None,
            });
            rest = after;
        }
    }
}

fn split_attached(raw: &str) -> Token {
    match raw.split_once('=') {
        Some((name, value)) => Token::Option {
            name: name.to_string(),
            attached: Some(value.to_string()),
        },
        None => Token::Option {
            name: raw.to_string(),
            attached: None,
        },
    }
}

fn looks_like_number(body: &str) -> bool {
    !body.is_empty()
        && body.chars().next().is_some_and(|ch| ch.is_ascii_digit())
        && body.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use argbind_core::{OptionSpec, ValueKind, ValueType};

    use super::*;

    fn spec() -> CommandSpec {
        CommandSpec::new("tool")
            .with_option(OptionSpec::flag(&["-a"]))
            .with_option(OptionSpec::flag(&["-b"]))
            .with_option(OptionSpec::new(&["-c"], ValueType::Scalar(ValueKind::Text)))
            .with_option(OptionSpec::new(&["-cp"], ValueType::Scalar(ValueKind::Path)))
            .with_option(OptionSpec::new(&["--long"], ValueType::Scalar(ValueKind::Text)))
    }

    fn tokenize(args: &[&str]) -> Vec<Token> {
        let level = spec();
        let mut tokenizer = Tokenizer::new(args.iter().map(|s| s.to_string()), true);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token(&level) {
            tokens.push(token);
        }
        tokens
    }

    fn opt(name: &str, attached: Option<&str>) -> Token {
        Token::Option {
            name: name.to_string(),
            attached: attached.map(String::from),
        }
    }

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_splits_flag_cluster() {
        assert_eq!(
            tokenize(&["-ab"]),
            vec![opt("-a", None), opt("-b", None)]
        );
    }

    #[test]
    fn test_cluster_value_takes_remainder() {
        assert_eq!(
            tokenize(&["-abcVALUE"]),
            vec![opt("-a", None), opt("-b", None), opt("-c", Some("VALUE"))]
        );
        assert_eq!(tokenize(&["-cVALUE"]), vec![opt("-c", Some("VALUE"))]);
        assert_eq!(tokenize(&["-c=x"]), vec![opt("-c", Some("x"))]);
    }

    #[test]
    fn test_exact_single_dash_name_wins_over_cluster() {
        assert_eq!(tokenize(&["-cp", "dir"]), vec![opt("-cp", None), word("dir")]);
    }

    #[test]
    fn test_splits_attached_long_value() {
        assert_eq!(
            tokenize(&["--long=a=b", "--other"]),
            vec![opt("--long", Some("a=b")), opt("--other", None)]
        );
    }

    #[test]
    fn test_double_dash_ends_options() {
        assert_eq!(
            tokenize(&["-a", "--", "-b", "--long", "--"]),
            vec![
                opt("-a", None),
                Token::EndOfOptions,
                word("-b"),
                word("--long"),
                word("--"),
            ]
        );
    }

    #[test]
    fn test_negative_numbers_and_dash_are_words() {
        assert_eq!(
            tokenize(&["-5", "-2.5", "-", "x"]),
            vec![word("-5"), word("-2.5"), word("-"), word("x")]
        );
    }

    #[test]
    fn test_unknown_short_is_left_whole() {
        assert_eq!(tokenize(&["-xyz"]), vec![opt("-xyz", None)]);
    }

    #[test]
    fn test_flag_with_equals_in_cluster_keeps_value() {
        assert_eq!(
            tokenize(&["-ab=yes"]),
            vec![opt("-a", None), opt("-b", Some("yes"))]
        );
    }

    #[test]
    fn test_raw_reads_bypass_option_syntax() {
        let level = spec();
        let mut tokenizer =
            Tokenizer::new(["--long", "-a", "--"].iter().map(|s| s.to_string()), true);

        assert_eq!(tokenizer.next_token(&level), Some(opt("--long", None)));
        assert_eq!(tokenizer.peek_raw(), Some("-a"));
        assert_eq!(tokenizer.next_raw().as_deref(), Some("-a"));
        assert_eq!(tokenizer.next_raw().as_deref(), Some("--"));
        assert!(!tokenizer.options_ended());
        assert_eq!(tokenizer.next_token(&level), None);
    }

    #[test]
    fn test_clustering_disabled_keeps_token_whole() {
        let level = spec();
        let mut tokenizer = Tokenizer::new(["-ab".to_string()].into_iter(), false);
        assert_eq!(tokenizer.next_token(&level), Some(opt("-ab", None)));
    }
}
