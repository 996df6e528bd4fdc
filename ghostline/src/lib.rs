use crate::collaborator::LocalCollaborator;
use crate::config::GhostConfig;
use crate::errors::display_user_error;
use crate::repl::Repl;
use crate::router::SourceMode;
use crate::terminal::PaintStrategy;
use anyhow::{Context as _, Result};
use clap::Parser;
use ghostline_openai::{PredictorClient, PredictorConfig};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub mod collaborator;
pub mod config;
pub mod context;
pub mod errors;
pub mod generative;
pub mod repl;
pub mod router;
pub mod sources;
pub mod suggestion;
pub mod terminal;

#[cfg(test)]
mod testing;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Prompt printed before each line
    #[arg(short, long, default_value = "> ")]
    pub prompt: String,

    /// Suggestion sources: history, model or hybrid
    #[arg(short, long)]
    pub mode: Option<SourceMode>,

    /// Quiet time in milliseconds before the model is asked
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Ghost text drawing: save_restore or overwrite
    #[arg(long)]
    pub paint: Option<PaintStrategy>,

    /// Exit after the first submitted line
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Overlay command-line flags on the loaded configuration.
    pub fn apply(&self, mut config: GhostConfig) -> GhostConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(paint) = self.paint {
            config.paint_strategy = paint;
        }
        config
    }
}

pub fn lib_main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing() {
        eprintln!("Failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }

    setup_panic_handler();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            display_user_error(&anyhow::Error::new(err).context("failed to start runtime"));
            return ExitCode::FAILURE;
        }
    };
    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display_user_error(&err);
            ExitCode::FAILURE
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply(GhostConfig::load()?);
    debug!(?config, "starting ghostline");

    let predictor_config = PredictorConfig::from_env();
    if !predictor_config.is_configured() {
        warn!("no API key for the predictor; model suggestions are disabled");
    }
    let predictor = PredictorClient::new(predictor_config)?;
    let collaborator = Arc::new(LocalCollaborator::new(predictor));

    let mut repl = Repl::new(cli.prompt, cli.once, config, collaborator);
    repl.run().await
}

fn init_tracing() -> Result<()> {
    let log_path = config::get_state_file("debug.log")?;
    let log_file = Arc::new(
        std::fs::File::create(&log_path)
            .with_context(|| format!("failed to create {}", log_path.display()))?,
    );
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ghostline=debug,ghostline_openai=debug"));
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .init();
    Ok(())
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        // leave the user with a usable terminal
        let _ = crossterm::terminal::disable_raw_mode();

        let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };
        let location = panic_info
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        tracing::error!("PANIC OCCURRED: {} at {}", payload, location);
        eprintln!("\nghostline panicked: {payload}");
        eprintln!("Location: {location}");
    }));
}
