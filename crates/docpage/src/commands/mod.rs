//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod sitemap;
pub(crate) mod toc;

use std::sync::Arc;

use docpage_config::Config;
use docpage_router::{ModuleRegistry, Navigation, RouteResolver, Router};
use docpage_source::{FsModuleSource, ModuleSource};

use crate::error::CliError;
use crate::output::Output;

pub(crate) use render::RenderArgs;
pub(crate) use sitemap::SitemapArgs;
pub(crate) use toc::TocArgs;

/// Router over the built site described by a [`Config`].
pub(crate) struct Site {
    router: Router,
    not_found: String,
}

impl Site {
    pub(crate) fn open(config: &Config) -> Result<Self, CliError> {
        let build = &config.build_resolved;
        let source = FsModuleSource::new(build.dist_dir.clone())
            .with_assets_dir(&build.assets_dir)
            .with_manifest(&build.manifest);
        tracing::info!(
            dist_dir = %build.dist_dir.display(),
            base = %config.site.base,
            "Opening site"
        );
        Self::with_source(
            Arc::new(source),
            &config.site.base,
            config.site.clean_urls,
            &config.site.not_found,
        )
    }

    pub(crate) fn with_source(
        source: Arc<dyn ModuleSource>,
        base: &str,
        clean_urls: bool,
        not_found: &str,
    ) -> Result<Self, CliError> {
        let resolver = RouteResolver::new(base)?.with_clean_urls(clean_urls);
        let registry = Arc::new(ModuleRegistry::new(source));
        Ok(Self {
            router: Router::new(resolver, registry).with_not_found(not_found),
            not_found: not_found.to_owned(),
        })
    }

    pub(crate) fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn not_found(&self) -> &str {
        &self.not_found
    }

    /// Navigate to `url`, warning when the not-found page stands in.
    pub(crate) async fn navigate(&self, url: &str, output: &Output) -> Result<Navigation, CliError> {
        let nav = self.router.navigate(url).await?;
        if nav.fallback {
            output.warning(&format!(
                "No page at {url} ({}), showing {}",
                nav.relative_path, self.not_found
            ));
        }
        Ok(nav)
    }
}
