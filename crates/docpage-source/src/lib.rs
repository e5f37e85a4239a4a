//! Sources of compiled page modules.
//!
//! The build emits one bundle file per page plus a manifest mapping each
//! page's module key to the content hash in its file name. This crate provides
//! a [`ModuleSource`] trait for reading those artifacts so that the router does
//! not care where they live:
//!
//! - [`FsModuleSource`]: reads a `dist/` directory on disk
//! - [`MockModuleSource`]: in-memory source for tests (behind `mock` feature)
//!
//! # Layout
//!
//! ```text
//! dist/
//! +-- hashmap.json                        # {"en-us_index.md": "bfed7f59", ...}
//! +-- assets/
//!     +-- en-us_index.md.bfed7f59.json    # page bundle
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use docpage_source::{FsModuleSource, ModuleSource, module_key};
//!
//! # fn main() -> Result<(), docpage_source::SourceError> {
//! let source = FsModuleSource::new(PathBuf::from("dist"));
//! let manifest = source.manifest()?;
//! let key = module_key("en-US/index.md");
//! if let Some(hash) = manifest.hash(&key) {
//!     let bytes = source.read_chunk(&key, hash)?;
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod source;

pub use fs::{DEFAULT_ASSETS_DIR, DEFAULT_MANIFEST, FsModuleSource};
#[cfg(feature = "mock")]
pub use mock::MockModuleSource;
pub use source::{
    ErrorStatus, Manifest, ModuleSource, SourceError, SourceErrorKind, chunk_file_name, module_key,
};
