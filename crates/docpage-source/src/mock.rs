//! Mock module source for testing.
//!
//! Provides [`MockModuleSource`] for exercising loaders without a build
//! directory on disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::source::{
    ErrorStatus, Manifest, ModuleSource, SourceError, SourceErrorKind, chunk_file_name, module_key,
};

const BACKEND: &str = "Mock";

/// Mock module source for testing.
///
/// Holds chunks in memory. Use the builder methods to configure the mock
/// with test data, and [`publish`](Self::publish) to simulate a rebuild
/// while the source is shared.
///
/// # Example
///
/// ```ignore
/// use docpage_source::{MockModuleSource, ModuleSource};
///
/// let source = MockModuleSource::new()
///     .with_page("guide.md", "1a2b", r#"{"pageData":"...","static":{...}}"#);
///
/// let manifest = source.manifest().unwrap();
/// let bytes = source.read_chunk("guide.md", "1a2b").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockModuleSource {
    manifest: RwLock<Manifest>,
    chunks: RwLock<HashMap<(String, String), Vec<u8>>>,
    failures: RwLock<HashMap<String, (SourceErrorKind, ErrorStatus)>>,
    delay: RwLock<Option<Duration>>,
    reads: RwLock<HashMap<String, usize>>,
    manifest_reads: AtomicUsize,
}

impl MockModuleSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk under an explicit module key and list it in the manifest.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_chunk(self, key: &str, hash: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.publish(key, hash, bytes);
        self
    }

    /// Add a chunk for a page, deriving the module key from its path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, relative_path: &str, hash: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.publish(&module_key(relative_path), hash, bytes);
        self
    }

    /// Make every read of `key` fail with the given kind and status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, key: &str, kind: SourceErrorKind, status: ErrorStatus) -> Self {
        self.fail(key, kind, status);
        self
    }

    /// Sleep for `delay` on every chunk read.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    /// Change the per-read delay while the source is shared.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().unwrap() = delay;
    }

    /// Store a chunk and point the manifest at it, replacing any earlier hash.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn publish(&self, key: &str, hash: &str, bytes: impl Into<Vec<u8>>) {
        self.chunks
            .write()
            .unwrap()
            .insert((key.to_owned(), hash.to_owned()), bytes.into());
        self.manifest.write().unwrap().insert(key, hash);
    }

    /// Drop a module from the manifest. Its chunks stay readable.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn unpublish(&self, key: &str) {
        self.manifest.write().unwrap().remove(key);
    }

    /// Inject a failure for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail(&self, key: &str, kind: SourceErrorKind, status: ErrorStatus) {
        self.failures
            .write()
            .unwrap()
            .insert(key.to_owned(), (kind, status));
    }

    /// Remove an injected failure.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn recover(&self, key: &str) {
        self.failures.write().unwrap().remove(key);
    }

    /// Number of chunk reads attempted for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn read_count(&self, key: &str) -> usize {
        self.reads.read().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Number of manifest reads.
    #[must_use]
    pub fn manifest_reads(&self) -> usize {
        self.manifest_reads.load(Ordering::SeqCst)
    }
}

impl ModuleSource for MockModuleSource {
    fn manifest(&self) -> Result<Arc<Manifest>, SourceError> {
        self.manifest_reads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.manifest.read().unwrap().clone()))
    }

    fn read_chunk(&self, key: &str, hash: &str) -> Result<Vec<u8>, SourceError> {
        *self
            .reads
            .write()
            .unwrap()
            .entry(key.to_owned())
            .or_default() += 1;

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if let Some(&(kind, status)) = self.failures.read().unwrap().get(key) {
            return Err(SourceError::new(kind)
                .with_status(status)
                .with_path(chunk_file_name(key, hash))
                .with_backend(BACKEND));
        }

        self.chunks
            .read()
            .unwrap()
            .get(&(key.to_owned(), hash.to_owned()))
            .cloned()
            .ok_or_else(|| SourceError::not_found(chunk_file_name(key, hash)).with_backend(BACKEND))
    }
}
