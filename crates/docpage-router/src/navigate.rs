//! Client-side navigation.
//!
//! [`Router::navigate`] resolves a URL, loads the page module and hands it
//! back for mounting. Only the most recent navigation may complete: starting
//! a new one cancels the token of the one in flight, which then returns
//! [`NavigateError::Superseded`] instead of a module.

use std::sync::{Arc, Mutex};

use docpage_page::PageModule;
use tokio_util::sync::CancellationToken;

use crate::registry::{LoadError, ModuleRegistry};
use crate::resolve::{RouteError, RouteResolver};

/// Error navigating to a URL.
#[derive(Debug, thiserror::Error)]
pub enum NavigateError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A later navigation started before this one finished.
    #[error("Navigation to '{0}' was superseded")]
    Superseded(String),
}

/// Completed navigation, ready to mount.
#[derive(Clone, Debug)]
pub struct Navigation {
    /// URL as requested.
    pub url: String,
    /// Relative path the URL resolved to.
    pub relative_path: String,
    pub module: Arc<PageModule>,
    /// `module` is the not-found page standing in for a missing one.
    pub fallback: bool,
}

/// Resolves URLs and loads their page modules.
pub struct Router {
    resolver: RouteResolver,
    registry: Arc<ModuleRegistry>,
    not_found: Option<String>,
    current: Mutex<CancellationToken>,
}

impl Router {
    #[must_use]
    pub fn new(resolver: RouteResolver, registry: Arc<ModuleRegistry>) -> Self {
        Self {
            resolver,
            registry,
            not_found: None,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// Page shown in place of pages missing from the build.
    #[must_use]
    pub fn with_not_found(mut self, relative_path: impl Into<String>) -> Self {
        self.not_found = Some(relative_path.into());
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Navigate to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigateError::Route`] if the URL does not resolve,
    /// [`NavigateError::Load`] if the page (and the not-found page, when it
    /// applies) fails to load, and [`NavigateError::Superseded`] if another
    /// navigation started in the meantime.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn navigate(&self, url: &str) -> Result<Navigation, NavigateError> {
        let token = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap();
            current.cancel();
            *current = token.clone();
        }

        let relative_path = self.resolver.resolve(url)?;

        let result = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = self.load_with_fallback(&relative_path) => Some(result),
        };

        let Some(result) = result.filter(|_| !token.is_cancelled()) else {
            tracing::debug!(url, "Navigation superseded");
            return Err(NavigateError::Superseded(url.to_owned()));
        };

        let (module, fallback) = result?;
        tracing::debug!(url, relative_path = %relative_path, fallback, "Navigation complete");
        Ok(Navigation {
            url: url.to_owned(),
            relative_path,
            module,
            fallback,
        })
    }

    async fn load_with_fallback(
        &self,
        relative_path: &str,
    ) -> Result<(Arc<PageModule>, bool), LoadError> {
        match self.registry.load(relative_path).await {
            Ok(module) => Ok((module, false)),
            Err(e) if e.is_not_found() => match &self.not_found {
                Some(not_found) if not_found != relative_path => {
                    tracing::debug!(relative_path, not_found = %not_found, "Page missing, using fallback");
                    let module = self.registry.load(not_found).await?;
                    Ok((module, true))
                }
                _ => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use docpage_page::{Document, Render};
    use docpage_source::{ErrorStatus, MockModuleSource, ModuleSource, SourceErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;

    fn bundle(relative_path: &str, title: &str) -> String {
        let page_data = serde_json::json!({
            "title": title,
            "relativePath": relative_path,
        })
        .to_string();
        serde_json::json!({
            "pageData": page_data,
            "static": {"html": format!("<p>{title}</p>"), "nodes": 1},
        })
        .to_string()
    }

    fn site() -> Arc<MockModuleSource> {
        Arc::new(
            MockModuleSource::new()
                .with_page("index.md", "1", bundle("index.md", "Home"))
                .with_page("en-US/index.md", "1", bundle("en-US/index.md", "Hetu Script"))
                .with_page("404.md", "1", bundle("404.md", "Not Found")),
        )
    }

    fn router(source: &Arc<MockModuleSource>) -> Router {
        let registry = Arc::new(ModuleRegistry::new(
            Arc::clone(source) as Arc<dyn ModuleSource>
        ));
        Router::new(RouteResolver::default(), registry).with_not_found("404.md")
    }

    #[tokio::test]
    async fn test_navigate_loads_page() {
        let router = router(&site());

        let nav = router.navigate("/en-US/#warning").await.unwrap();
        assert_eq!(nav.relative_path, "en-US/index.md");
        assert_eq!(nav.url, "/en-US/#warning");
        assert!(!nav.fallback);
        assert_eq!(nav.module.metadata().title(), "Hetu Script");
    }

    #[tokio::test]
    async fn test_navigate_same_page_same_identity() {
        let router = router(&site());

        let a = router.navigate("/").await.unwrap();
        let b = router.navigate("/index.html").await.unwrap();
        assert!(Arc::ptr_eq(&a.module, &b.module));
    }

    #[tokio::test]
    async fn test_navigate_missing_page_falls_back() {
        let router = router(&site());

        let nav = router.navigate("/nope.html").await.unwrap();
        assert!(nav.fallback);
        assert_eq!(nav.relative_path, "nope.md");
        assert_eq!(nav.module.relative_path(), "404.md");
    }

    #[tokio::test]
    async fn test_navigate_missing_page_without_fallback() {
        let source = site();
        let registry = Arc::new(ModuleRegistry::new(source as Arc<dyn ModuleSource>));
        let router = Router::new(RouteResolver::default(), registry);

        let err = router.navigate("/nope.html").await.unwrap_err();
        assert!(matches!(err, NavigateError::Load(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_rendered_as_fallback() {
        let source = site();
        source.fail("index.md", SourceErrorKind::Unavailable, ErrorStatus::Persistent);
        let router = router(&source);

        let err = router.navigate("/").await.unwrap_err();
        assert!(matches!(err, NavigateError::Load(LoadError::Source { .. })));
    }

    #[tokio::test]
    async fn test_navigate_rejects_escape() {
        let router = router(&site());

        let err = router.navigate("/../etc/passwd").await.unwrap_err();
        assert!(matches!(err, NavigateError::Route(RouteError::Escapes(_))));
    }

    #[tokio::test]
    async fn test_later_navigation_supersedes_earlier() {
        let source = site();
        let router = Arc::new(router(&source));
        router.navigate("/").await.unwrap();

        source.set_delay(Some(Duration::from_millis(200)));
        let slow = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.navigate("/en-US/").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Home is already loaded, so this completes without touching the source.
        let fast = router.navigate("/").await.unwrap();
        assert_eq!(fast.relative_path, "index.md");

        let err = slow.await.unwrap().unwrap_err();
        assert!(matches!(err, NavigateError::Superseded(ref url) if url == "/en-US/"));
    }

    #[tokio::test]
    async fn test_navigation_mounts_into_document() {
        let router = router(&site());
        let mut document = Document::new();
        let app = document.create_container();

        let nav = router.navigate("/en-US/").await.unwrap();
        document.mount(app, nav.module.as_ref()).unwrap();
        assert_eq!(document.inner_html(app).unwrap(), "<div><p>Hetu Script</p></div>");

        let again = router.navigate("/en-US/").await.unwrap();
        assert!(document.mount(app, again.module.as_ref()).unwrap().reused);

        let tree = nav.module.render(&docpage_page::MountContext::new(app));
        assert_eq!(document.mounted(app), Some(&tree));
    }
}
