//! CLI entrypoint for maestro
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use maestro_application::ports::chat_gateway::ChatGateway;
use maestro_application::{NoProgress, RunRecipeInput, RunRecipeUseCase};
use maestro_infrastructure::{ConfigLoader, FileRecipeStore, JsonlRunLogger, LocalToolExecutor};
use maestro_presentation::{Cli, ConsoleProgress, ConsolePrinter, parse_var_override};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // Load layered configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let recipe_name = match cli.recipe {
        Some(name) => name,
        None => bail!("Recipe name is required. Try `maestro --help`."),
    };

    // Build the run input: --var overrides plus the --format shorthand
    let mut input = RunRecipeInput::new(&recipe_name);
    for raw in &cli.vars {
        let (key, value) = parse_var_override(raw).map_err(anyhow::Error::msg)?;
        input = input.with_override(key, value);
    }
    if let Some(format) = &cli.format {
        input = input.with_override("format", format);
    }

    // === Dependency Injection ===
    let mut store = FileRecipeStore::new();
    if let Some(dir) = &config.recipes.dir {
        store = store.with_configured_dir(dir);
    }

    let endpoint = cli.endpoint.unwrap_or(config.gateway.endpoint);
    let model = cli.model.unwrap_or(config.gateway.model);
    let gateway = build_gateway(endpoint, model.clone())?;

    let executor = Arc::new(LocalToolExecutor::new());

    let mut use_case = RunRecipeUseCase::new(Arc::new(store), gateway, executor);

    if let Some(dir) = &config.transcript.dir
        && let Some(logger) = JsonlRunLogger::for_run(dir, &recipe_name)
    {
        info!("Writing run transcript to {}", logger.path().display());
        use_case = use_case.with_run_logger(Arc::new(logger));
    }

    if !cli.quiet {
        ConsolePrinter::print_header(&recipe_name, &model);
    }

    let result = if cli.quiet {
        use_case.execute(input, &NoProgress).await
    } else {
        let progress = ConsoleProgress::new();
        use_case.execute(input, &progress).await
    };

    match result {
        Ok(output) => {
            ConsolePrinter::print_result(&output);
            Ok(())
        }
        Err(e) => {
            ConsolePrinter::print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "ollama")]
fn build_gateway(endpoint: String, model: String) -> Result<Arc<dyn ChatGateway>> {
    use maestro_infrastructure::{OllamaGateway, StartupNotice};

    // The setup hint is scoped to this gateway instance: once per process.
    let notice = Arc::new(StartupNotice::new());
    Ok(Arc::new(OllamaGateway::new(endpoint, model, notice)))
}

#[cfg(not(feature = "ollama"))]
fn build_gateway(_endpoint: String, _model: String) -> Result<Arc<dyn ChatGateway>> {
    bail!("This build has no model gateway; rebuild with `--features ollama`.")
}
