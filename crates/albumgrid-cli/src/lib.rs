//! Shared CLI definitions for albumgrid.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Verbosity of the log file
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Parse a level name as written in config.toml (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

/// Command-line arguments for albumgrid
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "albumgrid",
    version,
    about = "Filterable album grid with saved filter presets",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Select the preset with this name when starting the application
    #[arg(long = "preset", value_name = "NAME")]
    pub preset: Option<String>,

    /// Make the "contains" operation case-sensitive (default: case-insensitive)
    #[arg(long = "case-sensitive", action)]
    pub case_sensitive: bool,

    /// Display row numbers on the left side of the table
    #[arg(long = "row-numbers", action)]
    pub row_numbers: bool,

    /// Starting index for row numbers (default: 1)
    #[arg(long = "row-start-index")]
    pub row_start_index: Option<usize>,

    /// Read configuration from this file instead of ~/.config/albumgrid/config.toml
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Generate default configuration file at ~/.config/albumgrid/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,

    /// Print the presets available at startup as JSON and exit
    #[arg(long = "list-presets", action)]
    pub list_presets: bool,

    /// Clear all cache data (log files) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write logs to this file (default: albumgrid.log in the cache directory when logging is enabled)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable logging at this level (overridden by RUST_LOG)
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
