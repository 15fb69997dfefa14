//! Per-build site state shared by the rendering stages.

use folio_core::{ContentRecord, RecordId, SiteConfig};

use crate::{languages::collect_languages, topics::TopicIndex};

/// Configuration plus the content graph derived during a build.
///
/// Built once the record set is loaded, linked and related; read-only while
/// pages are rendered.
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
    pub config: SiteConfig,
    /// Records in canonical order, indexed by [`RecordId`].
    pub records: Vec<ContentRecord>,
    pub topics: TopicIndex,
    /// Sorted set of languages used by the records.
    pub languages: Vec<String>,
}

impl SiteContext {
    /// Assemble the context, deriving the language set from `records`.
    pub fn new(config: SiteConfig, records: Vec<ContentRecord>, topics: TopicIndex) -> Self {
        let languages = collect_languages(&records);
        Self {
            config,
            records,
            topics,
            languages,
        }
    }

    pub fn record(&self, id: RecordId) -> Option<&ContentRecord> {
        self.records.get(id.index())
    }

    /// Site default language.
    pub fn default_language(&self) -> &str {
        &self.config.language
    }

    /// Absolute URL of a record, joined onto the base URL.
    pub fn record_url(&self, record: &ContentRecord) -> String {
        self.config.url_for(&record.url)
    }
}
