//! Page metadata for docpage.
//!
//! This crate provides the build-time description of a single documentation
//! page:
//! - [`PageMetadata`]: Immutable title, description, frontmatter, headers,
//!   relative path and last-updated timestamp
//! - [`PageMetadataBuilder`]: Assembles metadata during a build, deriving
//!   unique heading slugs
//! - [`Frontmatter`]: Schema-less author key/value pairs with typed accessors
//! - [`TocNode`]: Nested table of contents view over the flat header list
//!
//! # Example
//!
//! ```
//! use docpage_meta::PageMetadata;
//!
//! let literal = r#"{"title":"Hetu Script","description":"","frontmatter":{},
//!     "headers":[{"level":2,"title":"Warning","slug":"warning"}],
//!     "relativePath":"en-US/index.md","lastUpdated":1625730398918}"#;
//!
//! let meta = PageMetadata::from_literal(literal).unwrap();
//! assert_eq!(meta.title(), "Hetu Script");
//! assert_eq!(meta.headers()[0].slug, "warning");
//! ```

mod builder;
mod frontmatter;
mod metadata;
mod slug;
mod toc;

pub use builder::PageMetadataBuilder;
pub use frontmatter::Frontmatter;
pub use metadata::{Header, MetadataError, PageMetadata};
pub use slug::{SlugAllocator, is_url_safe, slugify};
pub use toc::TocNode;
