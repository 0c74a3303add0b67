//! Console output for recipe runs
//!
//! The formatted reply is the run's single product and goes to stdout;
//! decorations go to stderr so the output stays pipeable.

use colored::Colorize;

/// Prints run output and decorations to the terminal
pub struct ConsolePrinter;

impl ConsolePrinter {
    /// Print the run header (stderr).
    pub fn print_header(recipe: &str, model: &str) {
        eprintln!(
            "{} {} {} {}",
            "Recipe:".cyan().bold(),
            recipe,
            "Model:".cyan().bold(),
            model
        );
        eprintln!();
    }

    /// Print the formatted result (stdout).
    pub fn print_result(output: &str) {
        println!("{}", output);
    }

    /// Print a fatal error (stderr).
    pub fn print_error(message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
}
