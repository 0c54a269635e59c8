//! Twinalysis CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use twinalysis::{
    analysis::AnalyzerRegistry,
    config::{load_config, read_secret},
    error::{AppError, Result},
    models::validate_username,
    pipeline,
    storage::{LocalCache, PostCache},
};

/// Twinalysis - Timeline collection and analysis
#[derive(Parser, Debug)]
#[command(
    name = "twinalysis",
    version,
    about = "Collect user timelines into a local cache and analyze them"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "twinalysis.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect timelines and run an analysis module over them
    Analyze {
        /// Analysis module to run (see `modules`)
        module: String,

        /// Users whose timelines to analyze
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// List available analysis modules
    Modules,

    /// Validate configuration and credential files
    Validate,

    /// Show what is cached for a user
    Cache {
        /// User to inspect
        username: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = AnalyzerRegistry::with_defaults();

    match cli.command {
        Command::Analyze { module, usernames } => {
            // Reject unknown modules before reading any configuration.
            registry.get(&module)?;
            let config = load_config(&cli.config)?;

            let summary = pipeline::run_module(&config, &registry, &module, &usernames).await?;
            for user in &summary.users {
                log::debug!(
                    "{}: {} cached, {} new (watermark {})",
                    user.username,
                    user.cached,
                    user.fetched,
                    user.watermark
                );
            }
        }

        Command::Modules => {
            for analyzer in registry.iter() {
                println!("{:<12} {}", analyzer.name(), analyzer.description());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = match load_config(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Config validation failed: {}", e);
                    return Err(e);
                }
            };
            log::info!("✓ Config OK");

            let credentials = &config.credentials;
            if read_secret(&credentials.bearer_token_file)?.is_some() {
                log::info!(
                    "✓ Bearer token found at {}",
                    credentials.bearer_token_file.display()
                );
            } else {
                for path in [&credentials.api_key_file, &credentials.api_secret_file] {
                    if read_secret(path)?.is_none() {
                        return Err(AppError::credentials(format!(
                            "{} is missing or empty",
                            path.display()
                        )));
                    }
                }
                log::info!("✓ API key and secret found");
            }

            log::info!("All validations passed!");
        }

        Command::Cache { username } => {
            validate_username(&username)?;
            let config = load_config(&cli.config)?;
            let cache = LocalCache::from_config(&config.cache);

            let cached = cache.list_cached(&username).await?;
            log::info!("Cache directory: {}", cache.user_dir(&username).display());
            log::info!("Cached posts: {}", cached.len());
            if let Some(newest) = cached.posts.iter().find(|p| p.id == cached.watermark) {
                log::info!("Newest cached post: {}", newest.id);
                if let Some(created) = newest.created_at() {
                    log::info!("  Posted: {}", created.format("%Y-%m-%d %H:%M UTC"));
                }
                if let Some(text) = newest.text() {
                    log::info!("  Text: {}", text);
                }
            }
        }
    }

    Ok(())
}
