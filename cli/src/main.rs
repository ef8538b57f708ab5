use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use argbind_core::{CommandSpec, ValidSpec, validate_spec};
use argbind_engine::output::{format_report, format_spec};
use argbind_engine::{
    ColorMode, CommandLine, ExitCodes, OutputFormat, ParseResult, ParserConfig,
};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "argbind")]
#[command(version, about = "Check declarative command-line specs and bind argument vectors against them")]
struct Cli {
    /// Log binding decisions to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a spec file and report every defect.
    Check(CheckArgs),
    /// Render usage help for a spec or one of its subcommands.
    Usage(UsageArgs),
    /// Bind an argument vector against a spec and print the bindings.
    Parse(ParseArgs),
    /// Print the validated spec with derived indices and arities filled in.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Spec file (JSON, or YAML with a .yaml/.yml extension).
    spec: PathBuf,
}

#[derive(Debug, Args)]
struct UsageArgs {
    spec: PathBuf,
    /// Subcommand path to render, one name per flag (e.g. --command remote --command add).
    #[arg(long = "command", value_name = "NAME")]
    commands: Vec<String>,
    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Debug, Args)]
struct DisplayArgs {
    /// Display width for usage help.
    #[arg(long, default_value_t = 80)]
    width: usize,
    /// When to style usage help with ANSI escapes.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

#[derive(Debug, Args)]
struct ParseArgs {
    spec: PathBuf,
    /// Output format for the binding report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Collect unknown options and surplus arguments instead of failing.
    #[arg(long)]
    allow_unmatched: bool,
    /// Accept unique prefixes of long option names.
    #[arg(long)]
    abbreviate: bool,
    /// Do not split clustered short options such as -abc.
    #[arg(long)]
    no_cluster: bool,
    /// Exit code for invalid input.
    #[arg(long, default_value_t = ExitCodes::default().usage)]
    usage_exit_code: i32,
    /// Fail the bound command with this message instead of printing the report.
    #[arg(long, value_name = "MESSAGE")]
    fail_with: Option<String>,
    /// Print the full cause chain of command failures.
    #[arg(long)]
    diagnostics: bool,
    #[command(flatten)]
    display: DisplayArgs,
    /// Arguments to bind, after `--`.
    #[arg(last = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    spec: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args).map(|()| 0),
        Command::Usage(args) => run_usage(args).map(|()| 0),
        Command::Parse(args) => run_parse(args),
        Command::Export(args) => run_export(args).map(|()| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

fn read_spec(path: &Path) -> Result<CommandSpec, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}' as YAML: {err}", path.display()))
    } else {
        serde_json::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}' as JSON: {err}", path.display()))
    }
}

fn load_spec(path: &Path) -> Result<ValidSpec, String> {
    let spec = read_spec(path)?;
    debug!(path = %path.display(), command = %spec.name, "Loaded spec");
    spec.validate()
        .map_err(|err| format!("Invalid spec '{}': {err}", path.display()))
}

fn count_commands(spec: &CommandSpec) -> usize {
    1 + spec.subcommands.iter().map(count_commands).sum::<usize>()
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let spec = read_spec(&args.spec)?;
    let errors = validate_spec(&spec);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  {err}");
        }
        return Err(format!(
            "{} defect(s) in '{}'",
            errors.len(),
            args.spec.display()
        ));
    }

    let spec = spec.validate().map_err(|err| err.to_string())?;
    println!(
        "Validated '{}': {} command(s), {} option(s) and {} positional parameter(s) at the root.",
        spec.name,
        count_commands(&spec),
        spec.options.len(),
        spec.positionals.len()
    );
    Ok(())
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let spec = load_spec(&args.spec)?;
    let cli = CommandLine::new(spec).with_width(args.display.width);
    let names: Vec<&str> = args.commands.iter().map(String::as_str).collect();
    let usage = cli
        .usage(&names, args.display.color.for_stdout())
        .ok_or_else(|| format!("Unknown subcommand path: {}", names.join(" ")))?;
    print!("{usage}");
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<i32, String> {
    let spec = load_spec(&args.spec)?;
    let config = ParserConfig {
        allow_unmatched: args.allow_unmatched,
        abbreviated_options: args.abbreviate,
        clustered_short_options: !args.no_cluster,
    };
    let exit_codes = ExitCodes {
        usage: args.usage_exit_code,
        ..ExitCodes::default()
    };
    let cli = CommandLine::new(spec)
        .with_config(config)
        .with_exit_codes(exit_codes)
        .with_width(args.display.width)
        .with_color(args.display.color)
        .with_diagnostics(args.diagnostics);

    let format = args.format;
    let fail_with = args.fail_with;
    let code = cli.run(args.args, |result: &ParseResult<'_>| -> anyhow::Result<Option<i32>> {
        if let Some(message) = &fail_with {
            return Err(anyhow!("{message}"));
        }
        let rendered = format_report(&result.report(), format).map_err(|e| anyhow!(e))?;
        println!("{rendered}");
        Ok(None)
    });
    Ok(code)
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let spec = load_spec(&args.spec)?;
    let rendered = format_spec(&spec, args.format)?;
    println!("{rendered}");
    Ok(())
}
