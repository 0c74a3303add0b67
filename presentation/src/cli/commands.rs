//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for maestro
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(author, version, about = "Personal AI client that runs tool-assisted prompt recipes")]
#[command(long_about = r#"
Maestro runs declarative prompt recipes against a local model.

A recipe names input variables computed by tools (shell commands, file
reads, globs), a system/user prompt template pair, an output format, and
conditional post-actions fired after the reply is captured.

Recipes are TOML files discovered from (in priority order):
1. ./recipes/<name>.toml           Project-level recipes
2. [recipes].dir from the config   Configured directory
3. ~/.config/maestro/recipes/      User recipes

Example:
  maestro changelog
  maestro summarize --var file=README.md --format md
  maestro review --var branch=main -vv
"#)]
pub struct Cli {
    /// Name of the recipe to run
    pub recipe: Option<String>,

    /// Variable override, KEY=VALUE (can be specified multiple times)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Output format override (markdown, ansi, plain)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Model server endpoint override
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Model name override
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Split a `--var KEY=VALUE` argument.
///
/// The key is trimmed; the value is kept verbatim (it may legitimately
/// start or end with whitespace, or contain `=`).
pub fn parse_var_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid --var '{}': expected KEY=VALUE", raw)),
    }
}
