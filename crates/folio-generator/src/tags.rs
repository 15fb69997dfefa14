//! Custom inline tags in rendered content.
//!
//! Bodies may contain directives such as `{% link article="guides/setup" %}`
//! or `{% site_meta key="social.github" %}`. The resolver replaces each one
//! with rendered HTML. Every failure leaves the directive text in place and is
//! recorded in the [`BuildResult`]; resolution never fails outright.

use std::{
    collections::HashMap,
    sync::LazyLock,
};

use folio_core::{BuildResult, ContentRecord, RecordId};
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    html::escape_html,
    site::SiteContext,
    template::{TemplateContext, TemplateError, TemplateRegistry},
};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%\s*(\w+)\s*(.*?)\s*%\}").expect("valid tag pattern")
});

static ARG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s%"']+))"#).expect("valid argument pattern")
});

/// Tags handled without a `custom_tags` entry.
pub const BUILTIN_TAGS: [&str; 2] = ["link", "site_meta"];

/// Tag resolution errors.
#[derive(Debug, Error)]
pub enum TagError {
    /// The argument list could not be parsed.
    #[error("unexpected text '{0}'")]
    InvalidArguments(String),
}

/// Result type for tag operations.
pub type Result<T> = std::result::Result<T, TagError>;

/// Parsed `key=value` arguments, in source order.
pub type TagArgs = Vec<(String, String)>;

/// Parse a directive's argument list.
///
/// Values may be double-quoted, single-quoted or bare. Anything other than
/// whitespace between arguments is an error. A repeated key keeps its last
/// value.
pub fn parse_args(input: &str) -> Result<TagArgs> {
    let mut args: TagArgs = Vec::new();
    let mut pos = 0;

    for caps in ARG_PATTERN.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        check_gap(&input[pos..whole.start()])?;
        pos = whole.end();

        let key = caps[1].to_string();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        match args.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => args.push((key, value)),
        }
    }
    check_gap(&input[pos..])?;

    Ok(args)
}

fn check_gap(gap: &str) -> Result<()> {
    let gap = gap.trim();
    if gap.is_empty() {
        Ok(())
    } else {
        Err(TagError::InvalidArguments(gap.to_string()))
    }
}

fn arg<'a>(args: &'a TagArgs, key: &str) -> Option<&'a str> {
    args.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Resolves custom tags against the site's content graph and configuration.
pub struct TagResolver<'a> {
    site: &'a SiteContext,
    templates: &'a TemplateRegistry,
    /// Reference slug to records carrying it, in canonical order.
    references: HashMap<&'a str, Vec<RecordId>>,
}

impl<'a> TagResolver<'a> {
    pub fn new(site: &'a SiteContext, templates: &'a TemplateRegistry) -> Self {
        let mut references: HashMap<&str, Vec<RecordId>> = HashMap::new();
        for (i, record) in site.records.iter().enumerate() {
            references
                .entry(record.reference_slug.as_str())
                .or_default()
                .push(RecordId(i));
        }

        Self {
            site,
            templates,
            references,
        }
    }

    /// Whether `name` is a built-in or configured tag.
    pub fn is_known(&self, name: &str) -> bool {
        BUILTIN_TAGS.contains(&name) || self.site.config.custom_tags.contains_key(name)
    }

    /// Template used to render tag `name`.
    pub fn template_for(&self, name: &str) -> String {
        self.site
            .config
            .custom_tags
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("tags/{name}.html"))
    }

    /// Find the record a `{% link %}` reference points at.
    ///
    /// When several records share the reference slug, the one in `lang` wins;
    /// otherwise the first in canonical order.
    pub fn find_reference(&self, reference: &str, lang: Option<&str>) -> Option<&'a ContentRecord> {
        let ids = self.references.get(reference)?;
        let preferred = lang.and_then(|lang| {
            ids.iter()
                .copied()
                .find(|&id| self.site.records[id.index()].language() == lang)
        });
        let id = preferred.or_else(|| ids.first().copied())?;
        self.site.record(id)
    }

    /// Replace every directive in `html`.
    ///
    /// `lang` is the language of the page being rendered. Diagnostics go to
    /// `result`; text without directives is returned unchanged.
    pub fn resolve(&self, html: &str, lang: Option<&str>, result: &mut BuildResult) -> String {
        TAG_PATTERN
            .replace_all(html, |caps: &Captures<'_>| {
                let original = &caps[0];
                let name = &caps[1];
                self.resolve_tag(name, &caps[2], lang, result)
                    .unwrap_or_else(|| original.to_string())
            })
            .into_owned()
    }

    /// Resolve one directive; `None` keeps the original text.
    fn resolve_tag(
        &self,
        name: &str,
        raw_args: &str,
        lang: Option<&str>,
        result: &mut BuildResult,
    ) -> Option<String> {
        if !self.is_known(name) {
            warn!(tag = name, "unknown custom tag");
            result.add_warning(format!(
                "Custom tag error: Unknown tag '{{% {name} ... %}}'. Ensure it's defined in site.yaml's 'custom_tags'."
            ));
            return None;
        }

        let args = match parse_args(raw_args) {
            Ok(args) => args,
            Err(e) => {
                result.add_error(format!(
                    "Custom tag error: Failed to parse arguments for tag '{name}': {e}"
                ));
                return None;
            }
        };

        debug!(tag = name, args = args.len(), "resolving custom tag");
        match name {
            "link" => self.resolve_link(&args, lang, result),
            "site_meta" => self.resolve_site_meta(&args, result),
            _ => {
                let ctx = self.base_context(&args);
                self.render_tag(name, &ctx, result)
            }
        }
    }

    fn resolve_link(
        &self,
        args: &TagArgs,
        lang: Option<&str>,
        result: &mut BuildResult,
    ) -> Option<String> {
        let Some(reference) = arg(args, "article") else {
            result.add_warning("Custom tag 'link' error: Missing 'article' argument");
            return Some("<!-- Link tag error: Missing 'article' argument -->".to_string());
        };

        let Some(record) = self.find_reference(reference, lang) else {
            warn!(article = reference, "link target not found");
            result.add_warning(format!(
                "Custom tag 'link' error: Article '{reference}' not found"
            ));
            return Some(format!(
                r##"<a href="#">Article '{}' not found</a>"##,
                escape_html(reference)
            ));
        };

        let mut ctx = self.base_context(args);
        ctx.insert("url", self.site.record_url(record));
        ctx.insert("title", escape_html(&record.metadata.title));
        ctx.insert("slug", record.slug.as_str());
        ctx.insert("lang", record.language());
        self.render_tag("link", &ctx, result)
    }

    fn resolve_site_meta(&self, args: &TagArgs, result: &mut BuildResult) -> Option<String> {
        let Some(key) = arg(args, "key") else {
            result.add_error("Custom tag 'site_meta' error: Missing 'key' argument");
            return None;
        };

        let Some(value) = self.site.config.lookup(key) else {
            result.add_warning(format!(
                "Custom tag 'site_meta' error: Key '{key}' not found in site context or config."
            ));
            return Some(format!("[site_meta: {} not found]", escape_html(key)));
        };

        let mut ctx = self.base_context(args);
        ctx.insert("key", key);
        ctx.insert("value", escape_html(&value));
        self.render_tag("site_meta", &ctx, result)
    }

    /// Context shared by every tag: `args.*`, `site.*` and `base_url`.
    fn base_context(&self, args: &TagArgs) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.extend(self.site.config.template_vars());
        ctx.insert("base_url", self.site.config.base_url.as_str());
        ctx.extend(
            args.iter()
                .map(|(k, v)| (format!("args.{k}"), escape_html(v))),
        );
        ctx
    }

    fn render_tag(
        &self,
        name: &str,
        ctx: &TemplateContext,
        result: &mut BuildResult,
    ) -> Option<String> {
        let template = self.template_for(name);
        match self.templates.render(&template, ctx) {
            Ok(html) => Some(html),
            Err(TemplateError::NotFound(_)) => {
                result.add_error(format!(
                    "Custom tag error: Template '{template}' not found for tag '{name}'."
                ));
                None
            }
            Err(e) => {
                result.add_error(format!(
                    "Custom tag error: Failed to render template '{template}' for tag '{name}': {e}"
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use folio_core::SiteConfig;

    use super::*;
    use crate::{
        template::Template,
        testing::{localized, record},
        topics::TopicIndex,
    };

    fn site(records: Vec<ContentRecord>) -> SiteContext {
        let mut config = SiteConfig {
            title: "Folio".to_string(),
            author: "Ada".to_string(),
            ..SiteConfig::default()
        };
        config
            .social
            .insert("github".to_string(), serde_json::json!("ada"));
        config
            .custom_tags
            .insert("note".to_string(), "tags/note.html".to_string());
        let topics = TopicIndex::build(&records);
        SiteContext::new(config, records, topics)
    }

    fn templates() -> TemplateRegistry {
        let mut templates = TemplateRegistry::new();
        templates.register(Template::new(
            "tags/note.html",
            r#"<aside class="{{ args.kind }}">{{ site.title }}</aside>"#,
        ));
        templates
    }

    #[test]
    fn test_parse_args_quoting() {
        let args = parse_args(r#"a="one two" b='three' c=four"#).expect("parse");
        assert_eq!(
            args,
            vec![
                ("a".to_string(), "one two".to_string()),
                ("b".to_string(), "three".to_string()),
                ("c".to_string(), "four".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_args_empty_and_repeated() {
        assert!(parse_args("").expect("parse").is_empty());

        let args = parse_args(r#"a="" a=x"#).expect("parse");
        assert_eq!(args, vec![("a".to_string(), "x".to_string())]);
    }

    #[test]
    fn test_parse_args_rejects_stray_text() {
        assert!(matches!(
            parse_args(r#"article="x" oops"#),
            Err(TagError::InvalidArguments(text)) if text == "oops"
        ));
        assert!(parse_args(r#"article="unterminated"#).is_err());
    }

    #[test]
    fn test_link_resolves_reference_slug() {
        let site = site(vec![record("x/y.md", "Y & Z", "2024-01-01", &[])]);
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve(
            r#"<p>See {% link article="x/y" %}.</p>"#,
            Some("en"),
            &mut result,
        );

        assert_eq!(
            html,
            r#"<p>See <a href="/content/en/x/y.html">Y &amp; Z</a>.</p>"#
        );
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_link_prefers_page_language() {
        let site = site(vec![
            localized("guide.md", "Guide", "2024-01-02", &[], "en", None),
            localized("guide.md", "Anleitung", "2024-01-01", &[], "de", None),
        ]);
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);

        let found = resolver.find_reference("guide", Some("de")).map(|r| r.slug.as_str());
        assert_eq!(found, Some("de/guide"));
        let found = resolver.find_reference("guide", Some("fr")).map(|r| r.slug.as_str());
        assert_eq!(found, Some("en/guide"));
    }

    #[test]
    fn test_link_not_found_placeholder() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve(r#"{% link article="nope" %}"#, None, &mut result);

        assert_eq!(html, r##"<a href="#">Article 'nope' not found</a>"##);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.success);
    }

    #[test]
    fn test_link_missing_article() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve("{% link %}", None, &mut result);

        assert_eq!(html, "<!-- Link tag error: Missing 'article' argument -->");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_site_meta() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve(
            r#"{% site_meta key="author" %} / {% site_meta key='social.github' %}"#,
            None,
            &mut result,
        );
        assert_eq!(html, "Ada / ada");

        let html = resolver.resolve(r#"{% site_meta key="missing" %}"#, None, &mut result);
        assert_eq!(html, "[site_meta: missing not found]");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.success);
    }

    #[test]
    fn test_site_meta_without_key_keeps_text() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve("{% site_meta %}", None, &mut result);

        assert_eq!(html, "{% site_meta %}");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_unknown_tag_is_left_alone() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let input = r#"<p>{% youtube id="abc" %}</p>"#;
        let html = resolver.resolve(input, None, &mut result);

        assert_eq!(html, input);
        assert_eq!(
            result.warnings,
            vec![
                "Custom tag error: Unknown tag '{% youtube ... %}'. Ensure it's defined in site.yaml's 'custom_tags'."
            ]
        );
        assert!(result.success);
    }

    #[test]
    fn test_bad_arguments_keep_text() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let input = r#"{% note kind="tip" ??? %}"#;
        let html = resolver.resolve(input, None, &mut result);

        assert_eq!(html, input);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Failed to parse arguments for tag 'note'"));
    }

    #[test]
    fn test_configured_tag_renders_template() {
        let site = site(Vec::new());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve(r#"{% note kind=tip %}"#, None, &mut result);

        assert_eq!(html, r#"<aside class="tip">Folio</aside>"#);
    }

    #[test]
    fn test_missing_template_keeps_text() {
        let mut site = site(Vec::new());
        site.config
            .custom_tags
            .insert("gallery".to_string(), "tags/gallery.html".to_string());
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve("{% gallery %}", None, &mut result);

        assert_eq!(html, "{% gallery %}");
        assert_eq!(
            result.errors,
            vec!["Custom tag error: Template 'tags/gallery.html' not found for tag 'gallery'."]
        );
    }

    #[test]
    fn test_render_failure_keeps_text() {
        let site = site(Vec::new());
        let mut templates = templates();
        templates.register(Template::new("tags/note.html", "{{ args.missing }}"));
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let html = resolver.resolve("{% note %}", None, &mut result);

        assert_eq!(html, "{% note %}");
        assert!(result.errors[0].starts_with(
            "Custom tag error: Failed to render template 'tags/note.html' for tag 'note'"
        ));
    }

    #[test]
    fn test_directive_free_text_is_unchanged() {
        let site = site(vec![record("a.md", "A", "2024-01-01", &[])]);
        let templates = templates();
        let resolver = TagResolver::new(&site, &templates);
        let mut result = BuildResult::new();

        let input = "<p>Plain {{ braces }} and % signs</p>\n";
        let once = resolver.resolve(input, None, &mut result);
        let twice = resolver.resolve(&once, None, &mut result);

        assert_eq!(once, input);
        assert_eq!(twice, input);
        assert!(result.warnings.is_empty() && result.errors.is_empty());
    }
}
