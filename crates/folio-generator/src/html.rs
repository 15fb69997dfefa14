//! HTML page generation.
//!
//! Builds template contexts for article and standalone pages and renders them
//! through the [`TemplateRegistry`]. Custom tags in article bodies are resolved
//! before the body is placed into its page.

use std::fmt::Write;

use chrono::NaiveDate;
use folio_core::{
    BuildResult, ContentRecord, RecordId, StandalonePage, frontmatter::ISO_DATE_FORMAT,
};
use tracing::debug;

use crate::{
    site::SiteContext,
    tags::TagResolver,
    template::{Result, TemplateContext, TemplateError, TemplateRegistry},
};

/// Template used for every content record.
pub const ARTICLE_TEMPLATE: &str = "article.html";

/// Number of related records shown on an article page.
pub const RELATED_LIMIT: usize = 5;

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Format `date` with a strftime pattern, falling back to ISO on a bad pattern.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return date.format(ISO_DATE_FORMAT).to_string();
    }
    out
}

/// Page renderer bound to one build's site state.
pub struct PageRenderer<'a> {
    site: &'a SiteContext,
    templates: &'a TemplateRegistry,
    tags: TagResolver<'a>,
}

impl<'a> PageRenderer<'a> {
    pub fn new(site: &'a SiteContext, templates: &'a TemplateRegistry) -> Self {
        Self {
            site,
            templates,
            tags: TagResolver::new(site, templates),
        }
    }

    /// Render the article page for `id`.
    ///
    /// Tag diagnostics are added to `result`; a template failure is returned
    /// and leaves `result` to the caller.
    pub fn render_article(&self, id: RecordId, result: &mut BuildResult) -> Result<String> {
        let record = self
            .site
            .record(id)
            .ok_or_else(|| TemplateError::NotFound(format!("record #{}", id.index())))?;
        debug!(slug = %record.slug, "rendering article");

        let content = self
            .tags
            .resolve(&record.body_html, Some(record.language()), result);
        let ctx = self.article_context(record, &content);
        self.templates.render(ARTICLE_TEMPLATE, &ctx)
    }

    /// Render a standalone page with the site-wide listings.
    pub fn render_standalone(&self, page: &StandalonePage, article_index: &str) -> Result<String> {
        debug!(template = %page.template, "rendering standalone page");

        let mut ctx = self.site_context();
        ctx.insert("articles", self.articles_html());
        ctx.insert("topics", self.topics_html());
        ctx.insert("article_index", article_index);
        ctx.insert("languages", self.site.languages.join(","));
        self.templates.render(&page.template, &ctx)
    }

    /// Variables shared by every page: `site.*` and `base_url`.
    fn site_context(&self) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.extend(self.site.config.template_vars());
        ctx.insert("base_url", self.site.config.base_url.as_str());
        ctx
    }

    fn article_context(&self, record: &ContentRecord, content: &str) -> TemplateContext {
        let meta = &record.metadata;
        let mut ctx = self.site_context();

        ctx.insert("title", escape_html(&meta.title));
        ctx.insert_opt("description", meta.description.as_deref().map(escape_html));
        ctx.insert_opt("image", meta.image.as_deref().map(escape_html));
        ctx.insert("written", meta.written.format(ISO_DATE_FORMAT).to_string());
        ctx.insert(
            "written_formatted",
            format_date(meta.written, &self.site.config.date_format),
        );
        ctx.insert("lang", escape_html(record.language()));
        ctx.insert("slug", record.slug.as_str());
        ctx.insert("url", record.url.as_str());
        ctx.insert("page_url", self.site.record_url(record));
        ctx.insert("category", record.category());
        ctx.insert("content_id", record.content_id.as_str());
        ctx.insert("content", content);
        ctx.insert("topics_html", topics_list_html(&meta.topics));

        let previous = record.previous.and_then(|id| self.site.record(id));
        ctx.insert_opt(
            "previous_html",
            previous.map(|r| self.nav_link_html(r, "prev", "Previous")),
        );
        let next = record.next.and_then(|id| self.site.record(id));
        ctx.insert_opt("next_html", next.map(|r| self.nav_link_html(r, "next", "Next")));
        ctx.insert_opt("related_html", self.related_html(record));
        ctx.insert_opt("alternates_html", self.alternates_html(record));
        ctx.insert_opt("alternate_links", self.alternate_links(record));

        for (key, value) in &meta.extra {
            if let Some(text) = value.as_text() {
                ctx.insert(format!("extra.{key}"), escape_html(&text));
            }
        }

        ctx
    }

    fn record_link_html(&self, record: &ContentRecord) -> String {
        format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(&self.site.record_url(record)),
            escape_html(&record.metadata.title)
        )
    }

    fn nav_link_html(&self, record: &ContentRecord, rel: &str, label: &str) -> String {
        format!(
            r#"<a href="{}" rel="{rel}" class="nav-{rel}"><span>{label}</span> {}</a>"#,
            escape_html(&self.site.record_url(record)),
            escape_html(&record.metadata.title)
        )
    }

    fn related_html(&self, record: &ContentRecord) -> Option<String> {
        if record.related.is_empty() {
            return None;
        }
        let items: String = record
            .related
            .iter()
            .take(RELATED_LIMIT)
            .filter_map(|&id| self.site.record(id))
            .map(|r| format!("<li>{}</li>", self.record_link_html(r)))
            .collect();
        Some(format!(
            r#"<section class="related"><h2>Related</h2><ul>{items}</ul></section>"#
        ))
    }

    fn alternates_html(&self, record: &ContentRecord) -> Option<String> {
        if record.alternate_languages.is_empty() {
            return None;
        }
        let items: String = record
            .alternate_languages
            .iter()
            .filter_map(|(lang, id)| self.site.record(id).map(|r| (lang, r)))
            .map(|(lang, r)| {
                let lang = escape_html(lang);
                format!(
                    r#"<li><a href="{}" hreflang="{lang}" lang="{lang}">{}</a></li>"#,
                    escape_html(&self.site.record_url(r)),
                    escape_html(&r.metadata.title)
                )
            })
            .collect();
        Some(format!(r#"<ul class="alternate-languages">{items}</ul>"#))
    }

    /// `<link rel="alternate">` tags for the page head.
    fn alternate_links(&self, record: &ContentRecord) -> Option<String> {
        if record.alternate_languages.is_empty() {
            return None;
        }
        let links: Vec<String> = record
            .alternate_languages
            .iter()
            .filter_map(|(lang, id)| self.site.record(id).map(|r| (lang, r)))
            .map(|(lang, r)| {
                format!(
                    r#"<link rel="alternate" hreflang="{}" href="{}">"#,
                    escape_html(lang),
                    escape_html(&self.site.record_url(r))
                )
            })
            .collect();
        Some(links.join("\n    "))
    }

    /// Every article, newest first.
    fn articles_html(&self) -> String {
        let items: String = self
            .site
            .records
            .iter()
            .map(|r| {
                format!(
                    r#"<li lang="{}"><time datetime="{}">{}</time> {}</li>"#,
                    escape_html(r.language()),
                    r.metadata.written.format(ISO_DATE_FORMAT),
                    format_date(r.metadata.written, &self.site.config.date_format),
                    self.record_link_html(r)
                )
            })
            .collect();
        format!(r#"<ul class="articles">{items}</ul>"#)
    }

    /// Every topic with the articles tagged with it.
    fn topics_html(&self) -> String {
        let sections: String = self
            .site
            .topics
            .iter()
            .map(|(topic, ids)| {
                let items: String = ids
                    .iter()
                    .filter_map(|&id| self.site.record(id))
                    .map(|r| format!("<li>{}</li>", self.record_link_html(r)))
                    .collect();
                format!(
                    r#"<li><span class="topic">{}</span> ({})<ul>{items}</ul></li>"#,
                    escape_html(topic),
                    ids.len()
                )
            })
            .collect();
        format!(r#"<ul class="topics">{sections}</ul>"#)
    }
}

fn topics_list_html(topics: &[String]) -> String {
    if topics.is_empty() {
        return String::new();
    }
    let items: String = topics
        .iter()
        .map(|t| format!(r#"<li class="topic">{}</li>"#, escape_html(t)))
        .collect();
    format!(r#"<ul class="topics">{items}</ul>"#)
}
