//! Folio Generator Library
//!
//! Content graph construction and static site generation for folio.
//!
//! # Modules
//!
//! - [`loader`] - Content discovery and frontmatter loading
//! - [`validate`] - Duplicate slug and title detection
//! - [`languages`] - Cross-language linking
//! - [`topics`] - Topic index
//! - [`navigation`] - Previous/next navigation and related content
//! - [`tags`] - Custom inline tag resolution
//! - [`template`] - HTML template system with variable interpolation
//! - [`html`] - Article and standalone page rendering
//! - [`index`] - Content index document
//! - [`output`] - Output writing and static file copying
//! - [`build`] - Build orchestration

pub mod build;
pub mod html;
pub mod index;
pub mod languages;
pub mod loader;
pub mod navigation;
pub mod output;
pub mod site;
pub mod tags;
pub mod template;
pub mod topics;
pub mod validate;

pub use build::{BuildError, BuildOptions, Builder};
pub use html::PageRenderer;
pub use index::{IndexEntry, build_index};
pub use languages::{collect_languages, link_alternate_languages};
pub use loader::{ContentLoader, LoaderOptions};
pub use navigation::{Direction, compute_navigation, compute_related, find_navigation_target};
pub use output::OutputWriter;
pub use site::SiteContext;
pub use tags::TagResolver;
pub use template::{Template, TemplateContext, TemplateError, TemplateRegistry};
pub use topics::TopicIndex;
pub use validate::validate_content;
