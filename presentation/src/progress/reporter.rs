//! Progress reporting for recipe execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use maestro_application::ports::progress::RunProgressNotifier;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress on stderr: a spinner while variables resolve, raw
/// token streaming during the model exchange, and warnings on retries.
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap()
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self.spinner.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgressNotifier for ConsoleProgress {
    fn on_recipe_start(&self, name: &str, total_vars: usize) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(name.to_string());
        pb.set_message(if total_vars > 0 {
            format!("Resolving {} variables...", total_vars)
        } else {
            "Preparing prompt...".to_string()
        });
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap() = Some(pb);
    }

    fn on_var_resolved(&self, name: &str, preview: &str) {
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            pb.set_message(format!("{} = {}", name, preview));
        }
    }

    fn on_stream_start(&self) {
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            pb.set_message("Waiting for model...".to_string());
        }
    }

    fn on_token(&self, chunk: &str) {
        // First token: drop the spinner so raw streaming stays readable.
        self.clear_spinner();
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{}", chunk);
        let _ = stderr.flush();
    }

    fn on_stream_end(&self) {
        self.clear_spinner();
        eprintln!();
    }

    fn on_retry(&self, stage: &str, attempt: u32, max_attempts: u32, error: &str) {
        self.clear_spinner();
        eprintln!(
            "{} {} failed (attempt {}/{}): {}",
            "retry:".yellow().bold(),
            stage,
            attempt,
            max_attempts,
            error
        );
    }

    fn on_post_action(&self, tool: &str, fired: bool) {
        if fired {
            eprintln!("{} {}", "post-action:".green().bold(), tool);
        }
    }
}
