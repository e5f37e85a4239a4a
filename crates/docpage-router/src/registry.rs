//! Lazy, memoized page module loading.
//!
//! [`ModuleRegistry`] resolves a page's relative path to its compiled
//! [`PageModule`] the first time it is requested and hands out the same
//! `Arc` on every later request.
//!
//! # Concurrency
//!
//! Each relative path owns a `tokio::sync::OnceCell`. Concurrent loads of one
//! page wait on a single fetch. A failed fetch leaves the cell empty, so the
//! next request retries instead of replaying the error.
//!
//! # Hot reload
//!
//! A rebuilt page never mutates a loaded module. [`replace`](ModuleRegistry::replace)
//! swaps in a whole new module, [`invalidate`](ModuleRegistry::invalidate)
//! drops one so the next load fetches it again, and
//! [`sync_manifest`](ModuleRegistry::sync_manifest) invalidates every loaded
//! page whose hash changed in the build manifest. Each change is broadcast as
//! a [`ReloadEvent`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use docpage_page::{BundleError, PageModule};
use docpage_source::{ModuleSource, SourceError, SourceErrorKind, module_key};
use tokio::sync::{OnceCell, broadcast};

/// Capacity of the reload event channel.
const RELOAD_CHANNEL_CAPACITY: usize = 100;

/// Error loading a page module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Page is not listed in the build manifest.
    #[error("Page '{0}' is not in the build manifest")]
    NotFound(String),
    /// Manifest or chunk could not be read.
    #[error("Failed to read page '{path}': {source}")]
    Source {
        /// Requested relative path.
        path: String,
        #[source]
        source: SourceError,
    },
    /// Chunk is not a valid page bundle.
    #[error("Invalid bundle for page '{path}': {source}")]
    Bundle {
        /// Requested relative path.
        path: String,
        #[source]
        source: BundleError,
    },
    /// Chunk holds a different page than the one requested.
    #[error("Bundle for '{requested}' declares relative path '{found}'")]
    PathMismatch {
        /// Requested relative path.
        requested: String,
        /// Relative path declared by the bundle.
        found: String,
    },
    /// Blocking read task panicked or was aborted.
    #[error("Load task for '{0}' did not complete")]
    Join(String),
}

impl LoadError {
    /// Whether the page does not exist, as opposed to failing to load.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Source { source, .. } => source.kind == SourceErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Change to the set of loaded modules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A new module was swapped in for the page.
    Replaced {
        /// Page relative path.
        relative_path: String,
    },
    /// The page was dropped and will be fetched again on next load.
    Invalidated {
        /// Page relative path.
        relative_path: String,
    },
}

impl ReloadEvent {
    #[must_use]
    pub fn relative_path(&self) -> &str {
        match self {
            Self::Replaced { relative_path } | Self::Invalidated { relative_path } => relative_path,
        }
    }
}

/// Module together with the manifest hash it was read at.
struct Loaded {
    module: Arc<PageModule>,
    /// `None` for modules installed with [`ModuleRegistry::replace`].
    hash: Option<String>,
}

type Slot = Arc<OnceCell<Loaded>>;

/// Lazily loads and memoizes page modules from a [`ModuleSource`].
///
/// # Thread Safety
///
/// The slot map sits behind a `Mutex` held only to look up or swap a slot;
/// fetching happens outside it.
pub struct ModuleRegistry {
    source: Arc<dyn ModuleSource>,
    slots: Mutex<HashMap<String, Slot>>,
    events: broadcast::Sender<ReloadEvent>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        let (events, _rx) = broadcast::channel(RELOAD_CHANNEL_CAPACITY);
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to reload events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.events.subscribe()
    }

    /// Load the module for `relative_path`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the page is missing from the manifest, its
    /// chunk cannot be read or decoded, or the chunk declares another path.
    /// Errors are not memoized.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn load(&self, relative_path: &str) -> Result<Arc<PageModule>, LoadError> {
        let slot = self.slot(relative_path);
        match slot
            .get_or_try_init(|| self.fetch(relative_path.to_owned()))
            .await
        {
            Ok(loaded) => Ok(Arc::clone(&loaded.module)),
            Err(e) => {
                self.release_slot(relative_path, &slot);
                Err(e)
            }
        }
    }

    /// Module for `relative_path` if it is already loaded.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<Arc<PageModule>> {
        let slots = self.slots.lock().unwrap();
        let loaded = slots.get(relative_path)?.get()?;
        Some(Arc::clone(&loaded.module))
    }

    /// Relative paths of loaded modules, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn loaded_paths(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap();
        let mut paths: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Swap in a new module for its page.
    ///
    /// Holders of the previous `Arc` keep the old module; later loads see the
    /// new one.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn replace(&self, module: PageModule) -> Arc<PageModule> {
        let module = Arc::new(module);
        let relative_path = module.relative_path().to_owned();
        let slot = Arc::new(OnceCell::new_with(Some(Loaded {
            module: Arc::clone(&module),
            hash: None,
        })));
        self.slots
            .lock()
            .unwrap()
            .insert(relative_path.clone(), slot);

        tracing::info!(relative_path = %relative_path, "Page module replaced");
        let _ = self.events.send(ReloadEvent::Replaced { relative_path });
        module
    }

    /// Drop a loaded module so the next load fetches it again.
    ///
    /// Returns `false` if the page was not loaded.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn invalidate(&self, relative_path: &str) -> bool {
        let removed = self.slots.lock().unwrap().remove(relative_path);
        let was_loaded = removed.is_some_and(|slot| slot.initialized());
        if was_loaded {
            tracing::info!(relative_path, "Page module invalidated");
            let _ = self.events.send(ReloadEvent::Invalidated {
                relative_path: relative_path.to_owned(),
            });
        }
        was_loaded
    }

    /// Invalidate loaded pages whose manifest hash changed or disappeared.
    ///
    /// Modules installed with [`replace`](Self::replace) are left alone.
    /// Returns the invalidated relative paths, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] if the manifest cannot be read.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn sync_manifest(&self) -> Result<Vec<String>, LoadError> {
        let source = Arc::clone(&self.source);
        let manifest = tokio::task::spawn_blocking(move || source.manifest())
            .await
            .map_err(|_| LoadError::Join("manifest".to_owned()))?
            .map_err(|source| LoadError::Source {
                path: "manifest".to_owned(),
                source,
            })?;

        let stale: Vec<String> = {
            let slots = self.slots.lock().unwrap();
            slots
                .iter()
                .filter_map(|(path, slot)| {
                    let hash = slot.get()?.hash.as_deref()?;
                    let current = manifest.hash(&module_key(path));
                    (current != Some(hash)).then(|| path.clone())
                })
                .collect()
        };

        let mut invalidated: Vec<String> = stale
            .into_iter()
            .filter(|path| self.invalidate(path))
            .collect();
        invalidated.sort();

        if !invalidated.is_empty() {
            tracing::info!(count = invalidated.len(), "Stale page modules invalidated");
        }
        Ok(invalidated)
    }

    /// Load every page listed in the manifest.
    ///
    /// Pages that fail to load are logged and skipped. Pages already loaded
    /// keep their identity.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] if the manifest cannot be read.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn scan(&self) -> Result<Vec<Arc<PageModule>>, LoadError> {
        let source = Arc::clone(&self.source);
        let chunks = tokio::task::spawn_blocking(move || {
            let manifest = source.manifest()?;
            let chunks: Vec<_> = manifest
                .iter()
                .map(|(key, hash)| {
                    let bytes = source.read_chunk(key, hash);
                    (key.to_owned(), hash.to_owned(), bytes)
                })
                .collect();
            Ok::<_, SourceError>(chunks)
        })
        .await
        .map_err(|_| LoadError::Join("manifest".to_owned()))?
        .map_err(|source| LoadError::Source {
            path: "manifest".to_owned(),
            source,
        })?;

        let mut modules = Vec::with_capacity(chunks.len());
        for (key, hash, bytes) in chunks {
            let module = match bytes.map(|bytes| PageModule::from_json(&bytes)) {
                Ok(Ok(module)) => module,
                Ok(Err(e)) => {
                    tracing::warn!(key = %key, error = %e, "Skipping invalid page bundle");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable page chunk");
                    continue;
                }
            };
            if module_key(module.relative_path()) != key {
                tracing::warn!(
                    key = %key,
                    relative_path = module.relative_path(),
                    "Skipping page stored under a foreign module key"
                );
                continue;
            }

            let slot = self.slot(module.relative_path());
            let loaded = slot
                .get_or_init(|| async move {
                    Loaded {
                        module: Arc::new(module),
                        hash: Some(hash),
                    }
                })
                .await;
            modules.push(Arc::clone(&loaded.module));
        }

        tracing::debug!(page_count = modules.len(), "Scanned page modules");
        Ok(modules)
    }

    fn slot(&self, relative_path: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap();
        Arc::clone(slots.entry(relative_path.to_owned()).or_default())
    }

    /// Drop an empty slot left by a failed load, unless it was swapped out.
    fn release_slot(&self, relative_path: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap();
        if slots
            .get(relative_path)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized())
        {
            slots.remove(relative_path);
        }
    }

    async fn fetch(&self, relative_path: String) -> Result<Loaded, LoadError> {
        let source = Arc::clone(&self.source);
        let path = relative_path.clone();
        let (hash, bytes) = tokio::task::spawn_blocking(move || {
            let key = module_key(&path);
            let manifest = source
                .manifest()
                .map_err(|source| LoadError::Source {
                    path: path.clone(),
                    source,
                })?;
            let hash = manifest
                .hash(&key)
                .ok_or_else(|| LoadError::NotFound(path.clone()))?
                .to_owned();
            let bytes = source
                .read_chunk(&key, &hash)
                .map_err(|source| LoadError::Source {
                    path: path.clone(),
                    source,
                })?;
            Ok::<_, LoadError>((hash, bytes))
        })
        .await
        .map_err(|_| LoadError::Join(relative_path.clone()))??;

        let module = PageModule::from_json(&bytes).map_err(|source| LoadError::Bundle {
            path: relative_path.clone(),
            source,
        })?;
        if module.relative_path() != relative_path {
            return Err(LoadError::PathMismatch {
                requested: relative_path,
                found: module.relative_path().to_owned(),
            });
        }

        tracing::debug!(relative_path = %relative_path, hash = %hash, "Loaded page module");
        Ok(Loaded {
            module: Arc::new(module),
            hash: Some(hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use docpage_source::{ErrorStatus, MockModuleSource};
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(ModuleRegistry: Send, Sync);
    assert_impl_all!(ReloadEvent: Send, Sync, Clone);

    fn bundle(relative_path: &str, title: &str) -> String {
        let page_data = serde_json::json!({
            "title": title,
            "description": "",
            "frontmatter": {},
            "headers": [],
            "relativePath": relative_path,
        })
        .to_string();
        serde_json::json!({
            "pageData": page_data,
            "static": {"html": format!("<h1>{title}</h1>"), "nodes": 1},
        })
        .to_string()
    }

    fn module(relative_path: &str, title: &str) -> PageModule {
        PageModule::from_json(bundle(relative_path, title).as_bytes()).unwrap()
    }

    fn registry(source: MockModuleSource) -> (Arc<MockModuleSource>, ModuleRegistry) {
        let source = Arc::new(source);
        let registry = ModuleRegistry::new(Arc::clone(&source) as Arc<dyn ModuleSource>);
        (source, registry)
    }

    #[tokio::test]
    async fn test_load_returns_same_identity() {
        let (source, registry) = registry(
            MockModuleSource::new().with_page(
                "en-US/index.md",
                "bfed7f59",
                bundle("en-US/index.md", "Hetu Script"),
            ),
        );

        let first = registry.load("en-US/index.md").await.unwrap();
        let second = registry.load("en-US/index.md").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.metadata().title(), "Hetu Script");
        assert_eq!(source.read_count("en-us_index.md"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let (source, registry) = registry(
            MockModuleSource::new()
                .with_page("guide.md", "1", bundle("guide.md", "Guide"))
                .with_delay(Duration::from_millis(20)),
        );

        let (a, b, c) = tokio::join!(
            registry.load("guide.md"),
            registry.load("guide.md"),
            registry.load("guide.md"),
        );

        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(source.read_count("guide.md"), 1);
    }

    #[tokio::test]
    async fn test_get_only_returns_loaded() {
        let (_source, registry) =
            registry(MockModuleSource::new().with_page("guide.md", "1", bundle("guide.md", "Guide")));

        assert!(registry.get("guide.md").is_none());
        let loaded = registry.load("guide.md").await.unwrap();
        assert!(Arc::ptr_eq(&registry.get("guide.md").unwrap(), &loaded));
        assert_eq!(registry.loaded_paths(), vec!["guide.md"]);
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let (_source, registry) = registry(MockModuleSource::new());

        let err = registry.load("missing.md").await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound(ref path) if path == "missing.md"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_load_is_not_memoized() {
        let (source, registry) = registry(
            MockModuleSource::new()
                .with_page("guide.md", "1", bundle("guide.md", "Guide"))
                .with_failure("guide.md", SourceErrorKind::Unavailable, ErrorStatus::Persistent),
        );

        let err = registry.load("guide.md").await.unwrap_err();
        assert!(matches!(err, LoadError::Source { .. }));
        assert!(!err.is_not_found());
        assert!(registry.get("guide.md").is_none());

        source.recover("guide.md");
        let module = registry.load("guide.md").await.unwrap();
        assert_eq!(module.metadata().title(), "Guide");
        assert_eq!(source.read_count("guide.md"), 2);
    }

    #[tokio::test]
    async fn test_failed_loads_leave_no_slots() {
        let (_source, registry) = registry(
            MockModuleSource::new()
                .with_page("guide.md", "1", bundle("guide.md", "Guide"))
                .with_page("broken.md", "1", "not json"),
        );

        for i in 0..100 {
            let err = registry.load(&format!("missing-{i}.md")).await.unwrap_err();
            assert!(err.is_not_found());
        }
        assert!(registry.load("broken.md").await.is_err());
        registry.load("guide.md").await.unwrap();

        assert_eq!(registry.slots.lock().unwrap().len(), 1);
        assert_eq!(registry.loaded_paths(), ["guide.md"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_concurrent_replacement() {
        let (source, registry) = registry(
            MockModuleSource::new()
                .with_page("guide.md", "1", bundle("guide.md", "Guide"))
                .with_failure("guide.md", SourceErrorKind::Unavailable, ErrorStatus::Temporary)
                .with_delay(Duration::from_millis(50)),
        );

        let (result, ()) = tokio::join!(registry.load("guide.md"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.replace(module("guide.md", "Rebuilt Guide"));
        });

        assert!(matches!(result, Err(LoadError::Source { .. })));
        assert_eq!(
            registry.get("guide.md").unwrap().metadata().title(),
            "Rebuilt Guide"
        );
        assert_eq!(source.read_count("guide.md"), 1);
    }

    #[tokio::test]
    async fn test_invalid_bundle() {
        let (_source, registry) =
            registry(MockModuleSource::new().with_page("guide.md", "1", "{\"pageData\": 1}"));

        let err = registry.load("guide.md").await.unwrap_err();
        assert!(matches!(err, LoadError::Bundle { .. }));
    }

    #[tokio::test]
    async fn test_path_mismatch() {
        let (_source, registry) =
            registry(MockModuleSource::new().with_page("guide.md", "1", bundle("other.md", "Other")));

        let err = registry.load("guide.md").await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::PathMismatch { ref requested, ref found }
                if requested == "guide.md" && found == "other.md"
        ));
    }

    #[tokio::test]
    async fn test_replace_swaps_module_and_broadcasts() {
        let (_source, registry) =
            registry(MockModuleSource::new().with_page("guide.md", "1", bundle("guide.md", "Guide")));
        let mut events = registry.subscribe();

        let old = registry.load("guide.md").await.unwrap();
        let new = registry.replace(module("guide.md", "Guide v2"));

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(old.metadata().title(), "Guide");
        let loaded = registry.load("guide.md").await.unwrap();
        assert!(Arc::ptr_eq(&loaded, &new));
        assert_eq!(
            events.recv().await.unwrap(),
            ReloadEvent::Replaced {
                relative_path: "guide.md".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let (source, registry) =
            registry(MockModuleSource::new().with_page("guide.md", "1", bundle("guide.md", "Guide")));
        let mut events = registry.subscribe();

        let old = registry.load("guide.md").await.unwrap();
        assert!(registry.invalidate("guide.md"));
        assert!(!registry.invalidate("guide.md"));

        let new = registry.load("guide.md").await.unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(source.read_count("guide.md"), 2);
        assert_eq!(events.recv().await.unwrap().relative_path(), "guide.md");
    }

    #[tokio::test]
    async fn test_sync_manifest_invalidates_changed_pages() {
        let (source, registry) = registry(
            MockModuleSource::new()
                .with_page("a.md", "1", bundle("a.md", "A"))
                .with_page("b.md", "1", bundle("b.md", "B"))
                .with_page("c.md", "1", bundle("c.md", "C")),
        );
        registry.load("a.md").await.unwrap();
        let b = registry.load("b.md").await.unwrap();
        registry.load("c.md").await.unwrap();

        source.publish("a.md", "2", bundle("a.md", "A v2"));
        source.unpublish("c.md");

        let invalidated = registry.sync_manifest().await.unwrap();
        assert_eq!(invalidated, vec!["a.md", "c.md"]);
        assert!(Arc::ptr_eq(&registry.get("b.md").unwrap(), &b));

        let a = registry.load("a.md").await.unwrap();
        assert_eq!(a.metadata().title(), "A v2");
        assert!(registry.load("c.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sync_manifest_keeps_replaced_modules() {
        let (source, registry) =
            registry(MockModuleSource::new().with_page("a.md", "1", bundle("a.md", "A")));
        let replaced = registry.replace(module("a.md", "Local"));

        source.publish("a.md", "2", bundle("a.md", "A v2"));
        assert!(registry.sync_manifest().await.unwrap().is_empty());
        assert!(Arc::ptr_eq(&registry.get("a.md").unwrap(), &replaced));
    }

    #[tokio::test]
    async fn test_scan_loads_all_and_preserves_identity() {
        let (_source, registry) = registry(
            MockModuleSource::new()
                .with_page("en-US/index.md", "1", bundle("en-US/index.md", "Hetu Script"))
                .with_page("guide.md", "1", bundle("guide.md", "Guide"))
                .with_page("broken.md", "1", "not json")
                .with_chunk("misfiled.md", "1", bundle("elsewhere.md", "Elsewhere")),
        );
        let guide = registry.load("guide.md").await.unwrap();

        let modules = registry.scan().await.unwrap();
        let paths: Vec<&str> = modules.iter().map(|m| m.relative_path()).collect();
        assert_eq!(paths, vec!["en-US/index.md", "guide.md"]);
        assert!(Arc::ptr_eq(&modules[1], &guide));
        assert!(registry.get("en-US/index.md").is_some());
    }
}
