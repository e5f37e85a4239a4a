//! docpage CLI - inspect a built documentation site.
//!
//! Provides commands for:
//! - `toc`: Print a page's table of contents
//! - `sitemap`: List every page, or emit sitemap XML
//! - `render`: Mount a page into an in-memory document and print its HTML

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docpage_config::{CliSettings, Config};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, SitemapArgs, TocArgs};
use error::CliError;
use output::Output;

/// docpage - Static documentation pages.
#[derive(Parser)]
#[command(name = "docpage", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover docpage.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Build output directory (overrides config).
    #[arg(short, long, global = true, env = "DOCPAGE_DIST_DIR")]
    dist_dir: Option<PathBuf>,

    /// URL base path the site is served under (overrides config).
    #[arg(long, global = true)]
    base: Option<String>,

    /// Enable verbose output (show load and reload logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the table of contents of a page.
    Toc(TocArgs),
    /// List every page in the build.
    Sitemap(SitemapArgs),
    /// Render a page to HTML.
    Render(RenderArgs),
}

impl Cli {
    fn load_config(&self, hostname: Option<String>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            dist_dir: self.dist_dir.clone(),
            base: self.base.clone(),
            clean_urls: None,
            hostname,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    async fn execute(self) -> Result<(), CliError> {
        match &self.command {
            Commands::Toc(args) => args.execute(&self.load_config(None)?).await,
            Commands::Sitemap(args) => {
                let config = self.load_config(args.hostname.clone())?;
                args.execute(&config).await
            }
            Commands::Render(args) => args.execute(&self.load_config(None)?).await,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.execute()));

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
