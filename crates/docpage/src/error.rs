//! CLI error types.

use docpage_config::ConfigError;
use docpage_page::MountError;
use docpage_router::{LoadError, NavigateError, RouteError, SitemapError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Route(#[from] RouteError),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Navigate(#[from] NavigateError),

    #[error("{0}")]
    Mount(#[from] MountError),

    #[error("{0}")]
    Sitemap(#[from] SitemapError),

    #[error("{0}")]
    Validation(String),
}
