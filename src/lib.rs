// ABOUTME: Core library for the unified orchestrator.
// ABOUTME: Exposes the orchestrator module and the command-line run function.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

pub mod orchestrator;

use orchestrator::{Orchestrator, OrchestratorConfig, RequestContext};

/// Environment variable naming a configuration file when `--config` is absent.
const CONFIG_ENV: &str = "ORCHESTRATOR_CONFIG";

/// Route requests to the best capability providers and print the results as JSON.
#[derive(Parser, Debug)]
#[command(name = "unified-orchestrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify requests and orchestrate answers across capability providers", long_about = None)]
pub struct Cli {
    /// JSON configuration file (falls back to $ORCHESTRATOR_CONFIG, then built-in defaults)
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Always cross-validate the answer
    #[arg(long = "critical")]
    pub critical: bool,

    /// Ignore cached answers
    #[arg(long = "force-refresh")]
    pub force_refresh: bool,

    /// Use the reasoning strategy regardless of classification
    #[arg(long = "force-reasoning")]
    pub force_reasoning: bool,

    /// Language hint passed to providers (e.g. "tr", "en")
    #[arg(long = "language", short = 'l')]
    pub language: Option<String>,

    /// Print a provider health report
    #[arg(long = "health")]
    pub health: bool,

    /// Print orchestrator statistics after processing queries
    #[arg(long = "stats")]
    pub stats: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Requests to submit, one per argument
    #[arg(value_name = "QUERY")]
    pub queries: Vec<String>,
}

impl Cli {
    fn context(&self) -> RequestContext {
        RequestContext {
            language: self.language.clone(),
            critical: self.critical,
            force_refresh: self.force_refresh,
            force_reasoning: self.force_reasoning,
            ..Default::default()
        }
    }

    async fn execute(self) -> anyhow::Result<()> {
        if self.queries.is_empty() && !self.health && !self.stats {
            anyhow::bail!("nothing to do: pass at least one QUERY, --health or --stats");
        }

        let config_path = self
            .config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let config = load_config(config_path)?;
        let orchestrator = Orchestrator::builder(config)
            .build()
            .context("Failed to build orchestrator")?;

        let context = self.context();
        for query in &self.queries {
            let result = orchestrator.submit(query, context.clone()).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        if self.health {
            let report = orchestrator.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        if self.stats {
            println!("{}", serde_json::to_string_pretty(&orchestrator.stats())?);
        }

        orchestrator.shutdown().await;
        Ok(())
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<OrchestratorConfig> {
    match path {
        Some(path) => {
            info!("[Config] Loading {}", path.display());
            OrchestratorConfig::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => {
            info!("[Config] Using built-in capability table");
            Ok(OrchestratorConfig::default())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // The fmt subscriber also installs the `log` bridge, so `log::` records
    // from the library show up here.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(cli.execute())
}
