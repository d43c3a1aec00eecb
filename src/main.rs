use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use webprint::{
    backend::{Backend, FileBackend, MemoryBackend},
    config::Config,
    convergence::{ConvergenceLoop, IndexSettings},
    definition::build_definitions,
    fingerprint::FingerprintExtractor,
    logging::{init_tracing, LogFormat},
    output::{print_definitions, print_fingerprint, print_report, DefinitionSummary, FingerprintResult, OutputFormat},
    resource::{HttpFetcher, Resource},
};

/// Exit codes
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "webprint")]
#[command(
    author,
    version,
    about = "Fingerprint web-hosted software and index known package versions"
)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log format (overrides config)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Log level filter (overrides config, overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index versions and static files until nothing new is found
    Index {
        /// Number of definitions indexed in parallel
        #[arg(short, long)]
        workers: Option<usize>,

        /// Maximum versions processed per definition per pass
        #[arg(long)]
        step_limit: Option<usize>,

        /// Store file (overrides config)
        #[arg(long, conflicts_with = "memory")]
        store: Option<PathBuf>,

        /// Keep the store in memory only
        #[arg(long)]
        memory: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Guess the software version behind a URL from its generator tag
    Fingerprint {
        /// Page to fetch
        url: String,

        /// Store file (overrides config)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List tracked software definitions
    Definitions {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config_path = config_file(&cli);

    if let Commands::Config { init, path } = cli.command {
        println!("{}", config_report(&config_path, init, path)?);
        return Ok(exit_codes::SUCCESS);
    }

    let mut config = Config::load_from(&config_path)?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Index {
            workers,
            step_limit,
            store,
            memory,
            format,
        } => {
            if let Some(workers) = workers {
                config.max_workers = workers;
            }
            if let Some(step_limit) = step_limit {
                config.step_limit = step_limit;
            }
            if let Some(store) = store {
                config.store_path = store;
            }
            config.validate()?;

            run_index(&config, &config_path, memory, &format).await
        }
        Commands::Fingerprint { url, store, format } => {
            if let Some(store) = store {
                config.store_path = store;
            }
            run_fingerprint(&config, &url, &format).await
        }
        Commands::Definitions { format } => {
            list_definitions(&config, &format)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { .. } => unreachable!("handled before loading config"),
    }
}

/// The config file named by `--config`, or the default location.
fn config_file(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::config_path)
}

fn http_fetcher(config: &Config) -> Result<Arc<HttpFetcher>> {
    let fetcher = HttpFetcher::with_options(
        Duration::from_secs(config.request_timeout_secs),
        &config.user_agent,
    )?;
    Ok(Arc::new(fetcher))
}

async fn run_index(config: &Config, config_path: &Path, memory: bool, format: &str) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;

    let backend: Arc<dyn Backend> = if memory {
        Arc::new(MemoryBackend::new())
    } else {
        let backend = FileBackend::open(&config.store_path)
            .await
            .with_context(|| format!("failed to open store {}", config.store_path.display()))?;
        Arc::new(backend)
    };

    let fetcher = http_fetcher(config)?;
    let definitions = build_definitions(&config.definitions, fetcher.client(), fetcher.clone())?;
    if definitions.is_empty() {
        tracing::warn!(
            "no definitions configured; add [[definitions]] to {}",
            config_path.display()
        );
    }

    let driver = ConvergenceLoop::new(backend, definitions, IndexSettings::from(config));
    let report = driver.run().await?;

    print_report(&report, format)?;
    Ok(exit_codes::SUCCESS)
}

async fn run_fingerprint(config: &Config, url: &str, format: &str) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;

    let backend = FileBackend::open(&config.store_path)
        .await
        .with_context(|| format!("failed to open store {}", config.store_path.display()))?;
    let extractor = FingerprintExtractor::new(Arc::new(backend));

    let resource = Resource::new(url, http_fetcher(config)?);
    let candidates = extractor.extract_resource(&resource).await?;

    print_fingerprint(&FingerprintResult::new(url, candidates), format)?;
    Ok(exit_codes::SUCCESS)
}

fn list_definitions(config: &Config, format: &str) -> Result<()> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;

    // Builds the definitions so invalid entries are reported here too
    let fetcher = http_fetcher(config)?;
    let definitions = build_definitions(&config.definitions, fetcher.client(), fetcher.clone())?;

    let summaries: Vec<DefinitionSummary> = definitions
        .iter()
        .map(|d| DefinitionSummary {
            name: d.software_package.name.clone(),
            provider: d.provider.name().to_string(),
            collector: d.collector.name().to_string(),
        })
        .collect();

    print_definitions(&summaries, format)
}

/// Renders the `config` command's output for the config file at `path`,
/// creating the file first when `init` is set.
fn config_report(path: &Path, init: bool, show_path: bool) -> Result<String> {
    if show_path {
        return Ok(path.display().to_string());
    }

    if init {
        if path.exists() {
            return Ok(format!("Config file already exists at: {}", path.display()));
        }
        Config::default()
            .save_to(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        return Ok(format!(
            "Created config file at: {}\n\nDefault configuration:\n{}",
            path.display(),
            Config::generate_default_config()
        ));
    }

    if !path.exists() {
        return Ok(format!(
            "No config file at {}.\nRun 'webprint config --init' to create one.",
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("Config file: {}\n\n{}", path.display(), content))
}
