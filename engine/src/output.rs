//! Output formatting for specs and parse reports.

use argbind_core::CommandSpec;
use serde::Serialize;

use crate::result::ParseReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Formats a spec in the requested output format.
pub fn format_spec(spec: &CommandSpec, format: OutputFormat) -> Result<String, String> {
    serialize(spec, format)
}

/// Formats a parse report in the requested output format.
pub fn format_report(report: &ParseReport, format: OutputFormat) -> Result<String, String> {
    serialize(report, format)
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use argbind_core::{OptionSpec, ValueKind, ValueType};

    use super::*;
    use crate::{ConverterRegistry, Parser};

    #[test]
    fn test_format_spec_json_and_yaml() {
        let spec = CommandSpec::new("tool").with_option(OptionSpec::flag(&["-v"]));

        let json = format_spec(&spec, OutputFormat::Json).unwrap();
        let back: CommandSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.options[0].names, vec!["-v"]);

        let yaml = format_spec(&spec, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: tool"));
    }

    #[test]
    fn test_format_report_lists_bindings_and_errors() {
        let spec = CommandSpec::new("tool")
            .with_option(
                OptionSpec::new(&["-n", "--count"], ValueType::Scalar(ValueKind::Integer))
                    .with_default("3"),
            )
            .validate()
            .unwrap();
        let parser = Parser::new(spec, &ConverterRegistry::new());
        let outcome = parser.parse(["--nope"]);

        let json = format_report(&outcome.result().report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["command_path"], serde_json::json!(["tool"]));
        assert_eq!(value["levels"][0]["options"][0]["name"], "--count");
        assert_eq!(value["levels"][0]["options"][0]["value"], 3);
        assert_eq!(value["levels"][0]["options"][0]["defaulted"], true);
        assert_eq!(value["errors"][0]["kind"], "unknown_option");
        assert_eq!(value["errors"][0]["name"], "--nope");
    }
}
