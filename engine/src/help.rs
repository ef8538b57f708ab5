//! Usage help rendering.
//!
//! Rendering is a pure function of the command path, the display width and
//! the [`StyleMode`]: the same inputs always produce the same text.
//!
//! Descriptions may embed style markup of the form `@|bold,red text|@`.
//! Under [`StyleMode::Ansi`] the markup becomes ANSI escape sequences; under
//! [`StyleMode::Plain`] it is stripped and only the text is kept. Column
//! alignment and wrapping count visible characters only.

use std::io::IsTerminal;
use std::sync::LazyLock;

use argbind_core::{Arity, CommandSpec, OptionSpec, PositionalSpec};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Default display width.
pub const DEFAULT_WIDTH: usize = 80;

/// Smallest width the renderer lays text out for.
const MIN_WIDTH: usize = 40;

/// Labels wider than this push their description onto the next line.
const MAX_LABEL_WIDTH: usize = 30;

const INDENT: &str = "  ";
const GAP: usize = 2;

/// Column of descriptions moved below their label when the label column
/// leaves too little room beside it.
const DESCRIPTION_INDENT: usize = 8;

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@\|([A-Za-z0-9_,]+)\s(.*?)\|@").expect("static regex must compile")
});
static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile"));

/// How style markup is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleMode {
    /// Strip markup, keep the text.
    #[default]
    Plain,
    /// Emit ANSI escape sequences.
    Ansi,
}

/// When to emit ANSI styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ColorMode {
    /// Style only when the destination is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolves the mode for a destination that is (or is not) a terminal.
    pub fn style(self, is_terminal: bool) -> StyleMode {
        match self {
            Self::Always => StyleMode::Ansi,
            Self::Never => StyleMode::Plain,
            Self::Auto if is_terminal => StyleMode::Ansi,
            Self::Auto => StyleMode::Plain,
        }
    }

    pub fn for_stdout(self) -> StyleMode {
        self.style(std::io::stdout().is_terminal())
    }

    pub fn for_stderr(self) -> StyleMode {
        self.style(std::io::stderr().is_terminal())
    }
}

/// Renders usage help and version text for a spec.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
/// use argbind_engine::{HelpRenderer, StyleMode};
///
/// let spec = CommandSpec::new("tree")
///     .with_option(OptionSpec::help())
///     .with_option(OptionSpec::flag(&["-a", "--all"]).with_description("Show @|bold all|@ files"))
///     .with_positional(PositionalSpec::new("dir", ValueType::Collection(ValueKind::Path)))
///     .validate()
///     .unwrap();
///
/// let help = HelpRenderer::new(60, StyleMode::Plain).render(&[&spec]);
/// assert!(help.starts_with("Usage: tree [-ah] [--] [<dir>...]\n"));
/// assert!(help.contains("Show all files"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HelpRenderer {
    width: usize,
    style: StyleMode,
}

impl Default for HelpRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, StyleMode::Plain)
    }
}

impl HelpRenderer {
    pub fn new(width: usize, style: StyleMode) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            style,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn style(&self) -> StyleMode {
        self.style
    }

    /// Full usage help for the last command of `path` (root first).
    pub fn render(&self, path: &[&CommandSpec]) -> String {
        let Some(spec) = path.last() else {
            return String::new();
        };
        let mut out = self.synopsis(path);

        if let Some(description) = &spec.description {
            out.push('\n');
            for line in wrap(&self.markup(description), self.width) {
                out.push_str(&line);
                out.push('\n');
            }
        }

        let positionals: Vec<Row> = spec
            .positionals
            .iter()
            .filter(|p| !p.hidden)
            .map(|p| self.positional_row(p))
            .collect();
        let options: Vec<Row> = spec
            .options
            .iter()
            .filter(|o| !o.hidden)
            .map(|o| self.option_row(o))
            .collect();
        let commands: Vec<Row> = spec
            .subcommands
            .iter()
            .map(|sub| self.command_row(sub))
            .collect();

        let label_width = positionals
            .iter()
            .chain(&options)
            .chain(&commands)
            .map(|row| visible_width(&row.label))
            .filter(|&w| w <= MAX_LABEL_WIDTH)
            .max()
            .unwrap_or(0);

        for (title, rows) in [
            ("Parameters:", &positionals),
            ("Options:", &options),
            ("Commands:", &commands),
        ] {
            if rows.is_empty() {
                continue;
            }
            out.push('\n');
            out.push_str(title);
            out.push('\n');
            for row in rows {
                self.push_row(&mut out, row, label_width);
            }
        }
        out
    }

    /// The `Usage:` line(s) for the last command of `path`.
    pub fn synopsis(&self, path: &[&CommandSpec]) -> String {
        let Some(spec) = path.last() else {
            return String::new();
        };
        let head = format!(
            "Usage: {}",
            path.iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let visible = || spec.options.iter().filter(|o| !o.hidden);
        let mut parts: Vec<String> = visible()
            .filter(|o| o.required)
            .map(|o| synopsis_option(o))
            .collect();

        let mut cluster: Vec<(&str, &OptionSpec)> = visible()
            .filter(|o| !o.required && o.arity().is_zero())
            .filter_map(|o| o.short_names().next().map(|short| (short, o)))
            .collect();
        cluster.sort_by_key(|(short, _)| (short.to_ascii_lowercase(), short.to_string()));
        if !cluster.is_empty() {
            let letters: String = cluster.iter().map(|(short, _)| &short[1..]).collect();
            parts.push(format!("[-{letters}]"));
        }
        parts.extend(
            visible()
                .filter(|o| !o.required)
                .filter(|o| !cluster.iter().any(|(_, c)| std::ptr::eq(*c, *o)))
                .map(|o| {
                    let repeat = if o.value_type.is_collection() { "..." } else { "" };
                    format!("[{}]{repeat}", synopsis_option(o))
                }),
        );

        let positionals: Vec<&PositionalSpec> =
            spec.positionals.iter().filter(|p| !p.hidden).collect();
        if !positionals.is_empty() {
            parts.push("[--]".to_string());
            parts.extend(positionals.iter().map(|p| synopsis_positional(p)));
        }
        if !spec.subcommands.is_empty() {
            parts.push("[COMMAND]".to_string());
        }

        let indent = " ".repeat(visible_width(&head) + 1);
        let mut out = String::new();
        let mut line = head;
        for part in parts {
            if visible_width(&line) + 1 + visible_width(&part) > self.width
                && line.len() > indent.len()
            {
                out.push_str(line.trim_end());
                out.push('\n');
                line = indent.clone();
            } else {
                line.push(' ');
            }
            line.push_str(&part);
        }
        out.push_str(&line);
        out.push('\n');
        out
    }

    /// Version text of `spec`, one declared line per output line.
    pub fn version(&self, spec: &CommandSpec) -> String {
        if spec.version.is_empty() {
            return format!("{}\n", spec.name);
        }
        spec.version
            .iter()
            .map(|line| format!("{}\n", self.markup(line)))
            .collect()
    }

    /// Renders style markup according to the style mode.
    pub fn markup(&self, text: &str) -> String {
        MARKUP_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let body = &caps[2];
                match self.style {
                    StyleMode::Plain => body.to_string(),
                    StyleMode::Ansi => {
                        let codes: Vec<&str> = caps[1].split(',').filter_map(ansi_code).collect();
                        if codes.is_empty() {
                            body.to_string()
                        } else {
                            format!("\x1b[{}m{body}\x1b[0m", codes.join(";"))
                        }
                    }
                }
            })
            .into_owned()
    }

    fn option_row(&self, option: &OptionSpec) -> Row {
        let shorts: Vec<&str> = option.short_names().collect();
        let others: Vec<&str> = option
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| !shorts.contains(name))
            .collect();
        let mut label = match (shorts.is_empty(), others.is_empty()) {
            (false, false) => format!("{}, {}", shorts.join(", "), others.join(", ")),
            (false, true) => shorts.join(", "),
            (true, _) => format!("    {}", others.join(", ")),
        };
        label.push_str(&option_param(option));

        let mut lines = self.description_lines(option.description.as_deref());
        if let Some(default) = &option.default_value {
            lines.push(format!("Default: {default}"));
        }
        Row { label, lines }
    }

    fn positional_row(&self, positional: &PositionalSpec) -> Row {
        let mut label = positional.display_label();
        if repeats(positional.arity()) {
            label.push_str("...");
        }
        Row {
            label: format!("    {label}"),
            lines: self.description_lines(positional.description.as_deref()),
        }
    }

    fn command_row(&self, sub: &CommandSpec) -> Row {
        let mut names = vec![sub.name.as_str()];
        names.extend(sub.aliases.iter().map(String::as_str));
        let summary = sub
            .description
            .as_deref()
            .and_then(|d| d.lines().next());
        Row {
            label: names.join(", "),
            lines: self.description_lines(summary),
        }
    }

    fn description_lines(&self, description: Option<&str>) -> Vec<String> {
        description
            .map(|d| {
                d.lines()
                    .map(|line| self.markup(line))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    }

    fn push_row(&self, out: &mut String, row: &Row, label_width: usize) {
        let column = INDENT.len() + label_width + GAP;
        let available = self.width.saturating_sub(column);
        let beside = available >= MIN_WIDTH / 2;
        let (column, text_width) = if beside {
            (column, available)
        } else {
            (DESCRIPTION_INDENT, self.width - DESCRIPTION_INDENT)
        };
        let mut wrapped = row.lines.iter().flat_map(|line| wrap(line, text_width));

        out.push_str(INDENT);
        out.push_str(&row.label);
        let label_len = visible_width(&row.label);
        if beside && label_len <= label_width {
            if let Some(first) = wrapped.next() {
                out.push_str(&" ".repeat(label_width - label_len + GAP));
                out.push_str(&first);
            }
        }
        out.push('\n');
        for line in wrapped {
            out.push_str(&" ".repeat(column));
            out.push_str(&line);
            out.push('\n');
        }
    }
}

struct Row {
    label: String,
    lines: Vec<String>,
}

fn ansi_code(name: &str) -> Option<&'static str> {
    let code = match name.trim().to_ascii_lowercase().as_str() {
        "bold" => "1",
        "faint" | "dim" => "2",
        "italic" => "3",
        "underline" => "4",
        "blink" => "5",
        "reverse" => "7",
        "black" => "30",
        "red" => "31",
        "green" => "32",
        "yellow" => "33",
        "blue" => "34",
        "magenta" => "35",
        "cyan" => "36",
        "white" => "37",
        "bg_black" => "40",
        "bg_red" => "41",
        "bg_green" => "42",
        "bg_yellow" => "43",
        "bg_blue" => "44",
        "bg_magenta" => "45",
        "bg_cyan" => "46",
        "bg_white" => "47",
        _ => return None,
    };
    Some(code)
}

fn repeats(arity: Arity) -> bool {
    arity.max.is_none_or(|max| max > 1)
}

fn option_param(option: &OptionSpec) -> String {
    let arity = option.arity();
    if arity.is_zero() {
        return String::new();
    }
    let label = option.param_label();
    let dots = if repeats(arity) { "..." } else { "" };
    if arity.min == 0 {
        format!("[={label}{dots}]")
    } else {
        format!("={label}{dots}")
    }
}

fn synopsis_option(option: &OptionSpec) -> String {
    let name = option
        .short_names()
        .next()
        .unwrap_or_else(|| option.canonical_name());
    format!("{name}{}", option_param(option))
}

fn synopsis_positional(positional: &PositionalSpec) -> String {
    let arity = positional.arity();
    let dots = if repeats(arity) { "..." } else { "" };
    let label = positional.display_label();
    if arity.min == 0 {
        format!("[{label}{dots}]")
    } else {
        format!("{label}{dots}")
    }
}

/// Number of terminal columns `text` occupies, ignoring ANSI escapes.
pub fn visible_width(text: &str) -> usize {
    ANSI_RE.replace_all(text, "").chars().count()
}

/// Greedy word wrap on visible width. Words longer than `width` get a line
/// of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = visible_width(word);
        if line_width > 0 && line_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if line_width > 0 {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(word);
        line_width += word_width;
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
