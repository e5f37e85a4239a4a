//! `docpage render` command implementation.

use clap::Args;
use docpage_config::Config;
use docpage_page::{Document, PageModule};

use super::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Page URL (e.g. `/en-US/`).
    url: String,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not resolve, the page fails to load,
    /// or mounting fails.
    pub(crate) async fn execute(&self, config: &Config) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(config)?;
        let nav = site.navigate(&self.url, &output).await?;

        output.line(&render_html(&nav.module)?);
        Ok(())
    }
}

/// Mount `module` into a fresh document and read back the container HTML.
fn render_html(module: &PageModule) -> Result<String, CliError> {
    let mut document = Document::new();
    let app = document.create_container();
    document.mount(app, module)?;
    tracing::debug!(
        relative_path = module.relative_path(),
        anchors = document.anchor_bindings(app).len(),
        "Rendered page"
    );
    Ok(document.inner_html(app).unwrap_or_default())
}
