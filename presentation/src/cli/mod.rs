//! CLI argument definitions

pub mod commands;

pub use commands::{Cli, parse_var_override};
