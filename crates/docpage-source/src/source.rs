//! Module source trait, manifest and error types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceErrorKind {
    /// Manifest or chunk does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Key or hash would escape the assets directory.
    InvalidPath,
    /// Manifest or chunk content is malformed.
    InvalidData,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid path, malformed data).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
    /// Retry with backoff (service unavailable).
    Persistent,
}

/// Source error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct SourceError {
    /// Semantic error category.
    pub kind: SourceErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    #[must_use]
    pub fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(SourceErrorKind::NotFound).with_path(path)
    }

    /// Whether retrying the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status != ErrorStatus::Permanent
    }

    /// Create a source error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => SourceErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => SourceErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => SourceErrorKind::Timeout,
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                SourceErrorKind::InvalidData
            }
            _ => SourceErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: assets/a.md.1234.json)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            SourceErrorKind::NotFound => "Not found",
            SourceErrorKind::PermissionDenied => "Permission denied",
            SourceErrorKind::InvalidPath => "Invalid path",
            SourceErrorKind::InvalidData => "Invalid data",
            SourceErrorKind::Unavailable => "Unavailable",
            SourceErrorKind::Timeout => "Timeout",
            SourceErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Module key for a page's relative path.
///
/// Path separators become underscores and the result is lowercased:
/// `en-US/index.md` is stored under `en-us_index.md`.
#[must_use]
pub fn module_key(relative_path: &str) -> String {
    relative_path.replace('/', "_").to_lowercase()
}

/// File name of a chunk within the assets directory.
#[must_use]
pub fn chunk_file_name(key: &str, hash: &str) -> String {
    format!("{key}.{hash}.json")
}

/// Build manifest mapping module keys to content hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceErrorKind::InvalidData`] if the bytes are not a JSON
    /// object of strings.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SourceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SourceError::new(SourceErrorKind::InvalidData).with_source(e))
    }

    /// Content hash for a module key.
    #[must_use]
    pub fn hash(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, hash: impl Into<String>) {
        self.0.insert(key.into(), hash.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Module keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(key, hash)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys whose hash differs from `previous` or that `previous` lacks.
    #[must_use]
    pub fn changed_since(&self, previous: &Manifest) -> Vec<String> {
        self.iter()
            .filter(|(key, hash)| previous.hash(key) != Some(*hash))
            .map(|(key, _)| key.to_owned())
            .collect()
    }

    /// Keys present in `previous` but no longer here.
    #[must_use]
    pub fn removed_since(&self, previous: &Manifest) -> Vec<String> {
        previous
            .keys()
            .filter(|key| !self.0.contains_key(*key))
            .map(str::to_owned)
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Source of compiled page modules.
///
/// Implementations perform blocking I/O; async callers should wrap calls in
/// `spawn_blocking`.
pub trait ModuleSource: Send + Sync {
    /// Current build manifest.
    ///
    /// Implementations may cache the manifest but must return a fresh one
    /// once the underlying build output changes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the manifest cannot be read or parsed.
    fn manifest(&self) -> Result<Arc<Manifest>, SourceError>;

    /// Raw bundle bytes of one module.
    ///
    /// # Errors
    ///
    /// Returns [`SourceErrorKind::NotFound`] if no chunk exists for
    /// `(key, hash)` and [`SourceErrorKind::InvalidPath`] if either would
    /// escape the assets directory.
    fn read_chunk(&self, key: &str, hash: &str) -> Result<Vec<u8>, SourceError>;
}
