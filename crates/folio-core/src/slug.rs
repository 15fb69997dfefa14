//! Slug derivation for content records.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9/-]").expect("valid slug regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// URL slug and reference slug derived for one content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slugs {
    /// Language-prefixed, URL-safe slug (e.g. `en/guides/initial-setup`).
    pub slug: String,
    /// Path-shaped identifier with case and underscores preserved
    /// (e.g. `guides/Initial_Setup`), used by `{% link %}` tags.
    pub reference_slug: String,
}

/// Normalize one path segment into URL-safe form.
///
/// Lowercases, turns spaces and underscores into hyphens, strips anything
/// outside `[a-z0-9/-]`, collapses hyphen runs and trims edge hyphens.
pub fn slugify_segment(text: &str) -> String {
    let lowered = text.to_lowercase().replace([' ', '_'], "-");
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = HYPHEN_RUNS.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Derive both slugs for a file.
///
/// `relative_path` is relative to the content root it was found under. An
/// explicit `id` replaces the filename component; otherwise the file stem is
/// used. The URL slug is prefixed with `lang`.
pub fn generate_slugs(relative_path: &Path, id: Option<&str>, lang: &str) -> Slugs {
    let mut parts: Vec<String> = relative_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let last = match id.filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    match parts.last_mut() {
        Some(tail) => *tail = last,
        None => parts.push(last),
    }

    let reference_slug = parts.join("/");
    let url_slug = parts
        .iter()
        .map(|part| slugify_segment(part))
        .collect::<Vec<_>>()
        .join("/");

    Slugs {
        slug: format!("{lang}/{url_slug}"),
        reference_slug,
    }
}

/// Output-relative URL of a record page.
pub fn url_for_slug(slug: &str) -> String {
    format!("content/{slug}.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_segment() {
        assert_eq!(slugify_segment("Hello World"), "hello-world");
        assert_eq!(slugify_segment("snake_case_name"), "snake-case-name");
        assert_eq!(slugify_segment("C++ & Rust!"), "c-rust");
        assert_eq!(slugify_segment("--a  --  b--"), "a-b");
        assert_eq!(slugify_segment("Ünïcödé"), "ncd");
    }

    #[test]
    fn test_generate_slugs_nested() {
        let slugs = generate_slugs(Path::new("guides/Initial_Setup.md"), None, "en");
        assert_eq!(slugs.slug, "en/guides/initial-setup");
        assert_eq!(slugs.reference_slug, "guides/Initial_Setup");
    }

    #[test]
    fn test_generate_slugs_with_id() {
        let slugs = generate_slugs(Path::new("posts/hallo-welt.md"), Some("hello"), "de");
        assert_eq!(slugs.slug, "de/posts/hello");
        assert_eq!(slugs.reference_slug, "posts/hello");
    }

    #[test]
    fn test_generate_slugs_top_level() {
        let slugs = generate_slugs(Path::new("about.md"), None, "en");
        assert_eq!(slugs.slug, "en/about");
        assert_eq!(slugs.reference_slug, "about");
    }

    #[test]
    fn test_empty_id_falls_back_to_stem() {
        let slugs = generate_slugs(Path::new("note.md"), Some(""), "en");
        assert_eq!(slugs.reference_slug, "note");
    }

    #[test]
    fn test_url_for_slug() {
        assert_eq!(url_for_slug("en/guides/setup"), "content/en/guides/setup.html");
    }
}
