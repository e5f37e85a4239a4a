//! `docpage toc` command implementation.

use clap::Args;
use docpage_config::Config;
use docpage_meta::PageMetadata;

use super::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Page URL (e.g. `/en-US/` or `/guide.html#install`).
    url: String,

    /// Deepest heading level to include.
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(1..=6))]
    max_level: u8,
}

impl TocArgs {
    /// Execute the toc command.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not resolve or the page fails to load.
    pub(crate) async fn execute(&self, config: &Config) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(config)?;
        let nav = site.navigate(&self.url, &output).await?;

        let metadata = nav.module.metadata();
        output.highlight(metadata.title());
        for line in toc_lines(metadata, self.max_level) {
            output.line(&line);
        }
        Ok(())
    }
}

/// Indented TOC lines, shallowest included level flush left.
fn toc_lines(metadata: &PageMetadata, max_level: u8) -> Vec<String> {
    let headers: Vec<_> = metadata
        .toc_entries()
        .filter(|h| h.level <= max_level)
        .collect();
    let top = headers.iter().map(|h| h.level).min().unwrap_or(1);

    headers
        .into_iter()
        .map(|h| {
            let indent = "  ".repeat(usize::from(h.level - top));
            format!("{indent}- {} ({})", h.title, h.anchor())
        })
        .collect()
}
