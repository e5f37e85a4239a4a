//! Filesystem module source.
//!
//! Provides [`FsModuleSource`] for reading build output from a `dist/`
//! directory, with the manifest cached until its file changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::source::{Manifest, ModuleSource, SourceError, SourceErrorKind, chunk_file_name};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Default assets directory, relative to the dist directory.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Default manifest file name, relative to the dist directory.
pub const DEFAULT_MANIFEST: &str = "hashmap.json";

/// Manifest parsed at a known file state.
struct CachedManifest {
    mtime: SystemTime,
    len: u64,
    manifest: Arc<Manifest>,
}

/// Filesystem module source.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use docpage_source::{FsModuleSource, ModuleSource};
///
/// let source = FsModuleSource::new(PathBuf::from("dist")).with_assets_dir("chunks");
/// let manifest = source.manifest()?;
/// ```
pub struct FsModuleSource {
    dist_dir: PathBuf,
    assets_dir: PathBuf,
    manifest_path: PathBuf,
    cached: Mutex<Option<CachedManifest>>,
}

impl FsModuleSource {
    /// Create a source with the default layout under `dist_dir`.
    #[must_use]
    pub fn new(dist_dir: PathBuf) -> Self {
        Self {
            assets_dir: dist_dir.join(DEFAULT_ASSETS_DIR),
            manifest_path: dist_dir.join(DEFAULT_MANIFEST),
            dist_dir,
            cached: Mutex::new(None),
        }
    }

    /// Override the assets directory (relative to the dist directory).
    #[must_use]
    pub fn with_assets_dir(mut self, assets_dir: impl AsRef<Path>) -> Self {
        self.assets_dir = self.dist_dir.join(assets_dir);
        self
    }

    /// Override the manifest file (relative to the dist directory).
    #[must_use]
    pub fn with_manifest(mut self, manifest: impl AsRef<Path>) -> Self {
        self.manifest_path = self.dist_dir.join(manifest);
        self
    }

    #[must_use]
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    #[must_use]
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Path of the chunk file for `(key, hash)`.
    #[must_use]
    pub fn chunk_path(&self, key: &str, hash: &str) -> PathBuf {
        self.assets_dir.join(chunk_file_name(key, hash))
    }

    /// Validate that a key or hash is a single plain file name segment.
    fn validate_segment(segment: &str) -> Result<(), SourceError> {
        let invalid = segment.is_empty()
            || segment.contains(['/', '\\'])
            || segment.contains("..");
        if invalid {
            return Err(SourceError::new(SourceErrorKind::InvalidPath)
                .with_path(segment)
                .with_backend(BACKEND));
        }
        Ok(())
    }
}

impl ModuleSource for FsModuleSource {
    /// # Panics
    ///
    /// Panics if the internal cache lock is poisoned.
    fn manifest(&self) -> Result<Arc<Manifest>, SourceError> {
        let meta = fs::metadata(&self.manifest_path).map_err(|e| {
            SourceError::io(e, Some(self.manifest_path.clone())).with_backend(BACKEND)
        })?;
        let mtime = meta
            .modified()
            .map_err(|e| {
                SourceError::io(e, Some(self.manifest_path.clone())).with_backend(BACKEND)
            })?;
        let len = meta.len();

        {
            let cached = self.cached.lock().unwrap();
            if let Some(cached) = cached.as_ref()
                && cached.mtime == mtime
                && cached.len == len
            {
                return Ok(Arc::clone(&cached.manifest));
            }
        }

        let bytes = fs::read(&self.manifest_path).map_err(|e| {
            SourceError::io(e, Some(self.manifest_path.clone())).with_backend(BACKEND)
        })?;
        let manifest = Arc::new(Manifest::from_json(&bytes).map_err(|e| {
            e.with_path(self.manifest_path.clone()).with_backend(BACKEND)
        })?);
        tracing::debug!(
            path = %self.manifest_path.display(),
            modules = manifest.len(),
            "Loaded build manifest"
        );

        *self.cached.lock().unwrap() = Some(CachedManifest {
            mtime,
            len,
            manifest: Arc::clone(&manifest),
        });
        Ok(manifest)
    }

    fn read_chunk(&self, key: &str, hash: &str) -> Result<Vec<u8>, SourceError> {
        Self::validate_segment(key)?;
        Self::validate_segment(hash)?;

        let path = self.chunk_path(key, hash);
        fs::read(&path).map_err(|e| SourceError::io(e, Some(path)).with_backend(BACKEND))
    }
}
