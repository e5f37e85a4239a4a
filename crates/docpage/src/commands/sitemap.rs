//! `docpage sitemap` command implementation.

use clap::Args;
use docpage_config::Config;
use docpage_router::SiteIndex;

use super::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sitemap command.
#[derive(Args)]
pub(crate) struct SitemapArgs {
    /// Emit sitemap XML instead of a page list.
    #[arg(long)]
    xml: bool,

    /// Site origin for XML output (overrides config).
    #[arg(long, env = "DOCPAGE_HOSTNAME")]
    pub hostname: Option<String>,
}

impl SitemapArgs {
    /// Execute the sitemap command.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read, or `--xml` is given
    /// without a hostname.
    pub(crate) async fn execute(&self, config: &Config) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(config)?;
        let index = scan(&site).await?;

        for collision in index.collisions() {
            output.warning(&format!(
                "Pages share chunk key {}: {}",
                collision.key,
                collision.relative_paths.join(", ")
            ));
        }

        if self.xml {
            let hostname = config.site.hostname.as_deref().ok_or_else(|| {
                CliError::Validation(
                    "sitemap --xml requires site.hostname or --hostname".to_owned(),
                )
            })?;
            output.line(index.sitemap_xml(hostname)?.trim_end());
        } else {
            for entry in index.entries() {
                output.line_with_note(&entry.url, &entry.title);
            }
        }
        Ok(())
    }
}

/// Index every page except the not-found page.
async fn scan(site: &Site) -> Result<SiteIndex, CliError> {
    let router = site.router();
    let index = SiteIndex::scan(router.registry(), router.resolver()).await?;
    Ok(index.without_page(site.not_found()))
}
