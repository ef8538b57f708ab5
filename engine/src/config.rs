//! Parser and driver configuration.

use serde::{Deserialize, Serialize};

/// Matching behavior switches for a [`Parser`](crate::Parser).
///
/// # Examples
///
/// ```
/// use argbind_engine::ParserConfig;
///
/// let config: ParserConfig = serde_json::from_str(r#"{ "abbreviated_options": true }"#).unwrap();
/// assert!(config.abbreviated_options);
/// assert!(config.clustered_short_options);
/// assert!(!config.allow_unmatched);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Collect unknown options and surplus words instead of failing.
    pub allow_unmatched: bool,
    /// Accept unique prefixes of long option names (`--tr` for `--tree`).
    pub abbreviated_options: bool,
    /// Split `-abc` into `-a -b -c`.
    pub clustered_short_options: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            allow_unmatched: false,
            abbreviated_options: false,
            clustered_short_options: true,
        }
    }
}

/// Process exit codes reported by the execution driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitCodes {
    /// Success, help and version output.
    pub success: i32,
    /// Invalid command-line input.
    pub usage: i32,
    /// Business logic failed.
    pub software: i32,
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            success: 0,
            usage: 2,
            software: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = ExitCodes::default();
        assert_ne!(codes.usage, codes.software);
        assert_ne!(codes.usage, codes.success);
        assert_ne!(codes.software, codes.success);
    }

    #[test]
    fn test_exit_codes_partial_override() {
        let codes: ExitCodes = serde_json::from_str(r#"{ "usage": 64 }"#).unwrap();
        assert_eq!(codes.usage, 64);
        assert_eq!(codes.software, 1);
    }
}
