//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Asset Cache - Resolve script and stylesheet includes with on-disk caching
#[derive(Parser, Debug)]
#[command(name = "asset-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve assets and print or write their content
    Build(commands::build::BuildArgs),

    /// Show dependencies, timestamps and ETag of an asset
    Info(commands::info::InfoArgs),

    /// Display the include tree of an asset
    Tree(commands::tree::TreeArgs),

    /// Manage the asset cache directory
    Cache(commands::cache::CacheArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Build(args) => commands::build::execute(args),
            Commands::Info(args) => commands::info::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Cache(args) => commands::cache::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Route `log` output to stderr. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    use env_logger::{Builder, Env};

    // Ignore the error from a logger that is already installed
    let _ = Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}
