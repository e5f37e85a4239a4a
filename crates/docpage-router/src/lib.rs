//! Routing for built docpage sites.
//!
//! Turns browser URLs into mounted pages:
//!
//! - [`RouteResolver`]: URL to relative path and back
//! - [`ModuleRegistry`]: lazy, memoized loading of page modules with hot reload
//! - [`Router`]: navigation with supersession and not-found fallback
//! - [`SiteIndex`]: sitemap, TOC lookup and collision report from metadata
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use docpage_router::{ModuleRegistry, RouteResolver, Router};
//! use docpage_source::FsModuleSource;
//!
//! # async fn run() -> Result<(), docpage_router::NavigateError> {
//! let source = Arc::new(FsModuleSource::new(PathBuf::from("dist")));
//! let registry = Arc::new(ModuleRegistry::new(source));
//! let router = Router::new(RouteResolver::default(), registry).with_not_found("404.md");
//!
//! let nav = router.navigate("/en-US/#warning").await?;
//! for header in nav.module.metadata().toc_entries() {
//!     println!("{} {}", header.anchor(), header.title);
//! }
//! # Ok(())
//! # }
//! ```

mod index;
mod navigate;
mod registry;
mod resolve;

pub use index::{Collision, SiteIndex, SitemapEntry, SitemapError};
pub use navigate::{NavigateError, Navigation, Router};
pub use registry::{LoadError, ModuleRegistry, ReloadEvent};
pub use resolve::{RouteError, RouteResolver};
