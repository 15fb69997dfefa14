//! Folio Core Library
//!
//! Core types, frontmatter parsing, slug derivation and site configuration for
//! the folio static site generator.

pub mod build_result;
pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod slug;

pub use build_result::BuildResult;
pub use config::{IncludeFormat, SiteConfig, StandalonePage};
pub use content::{AlternateLanguages, ContentRecord, ContentType, Metadata, RecordId};
pub use error::{CoreError, Result};
pub use frontmatter::{FieldValue, Frontmatter};
pub use slug::{Slugs, generate_slugs, slugify_segment};
