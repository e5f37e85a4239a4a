//! Page module render contract for docpage.
//!
//! A [`PageModule`] pairs immutable [`PageMetadata`] with a static content
//! fragment precomputed by the build. Metadata can be read without rendering;
//! rendering turns a host-supplied [`MountContext`] into a [`ContentTree`]
//! with exactly one root element wrapping the shared static subtree.
//!
//! # Architecture
//!
//! - [`ContentTree`]: content tree handed to the host
//! - [`MountContext`]: host-supplied handle describing where output goes
//! - [`Render`]: the render seam implemented by [`PageModule`]
//! - [`PageBundle`]: persisted JSON form of a compiled page module
//! - [`Document`]: minimal in-memory host that mounts rendered trees
//!
//! # Example
//!
//! ```
//! use docpage_meta::PageMetadataBuilder;
//! use docpage_page::{Document, PageModule, StaticFragment};
//!
//! let meta = PageMetadataBuilder::new("guide.md", "Guide")
//!     .with_heading(2, "Install")
//!     .build()
//!     .unwrap();
//! let module = PageModule::new(meta, StaticFragment::new("<h2 id=\"install\">Install</h2>", 1));
//!
//! let mut document = Document::new();
//! let app = document.create_container();
//! document.mount(app, &module).unwrap();
//! assert_eq!(
//!     document.inner_html(app).as_deref(),
//!     Some("<div><h2 id=\"install\">Install</h2></div>")
//! );
//! ```

mod bundle;
mod content;
mod document;
mod module;
mod mount;

pub use bundle::{BundleError, PageBundle, StaticContent};
pub use content::{ContentNode, ContentTree, Element, StaticFragment};
pub use document::{Document, MountError, MountHandle, MountOutcome};
pub use module::{PageModule, Render};
pub use mount::{Key, MountContext, NodeId};

// Re-export metadata types for convenience
pub use docpage_meta::{Header, PageMetadata};
