//! Build orchestration.
//!
//! Runs the pipeline in order: load, validate, link languages, index topics,
//! compute navigation, render pages, then write the content index, static
//! files and standalone pages. Per-item failures are collected in the
//! [`BuildResult`]; only an unusable environment aborts the build.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::{BuildResult, RecordId, SiteConfig, StandalonePage};
use folio_parser::{HtmlRenderer, MarkdownParser};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    html::{ARTICLE_TEMPLATE, PageRenderer},
    index::build_index,
    languages::link_alternate_languages,
    loader::{ContentLoader, LoaderOptions},
    navigation::compute_navigation,
    output::OutputWriter,
    site::SiteContext,
    template::{TemplateError, TemplateRegistry},
    topics::TopicIndex,
    validate::validate_content,
};

/// Build errors that stop the build before any content is processed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The templates directory does not exist.
    #[error("templates directory not found: {}", .0.display())]
    TemplatesNotFound(PathBuf),

    /// Templates could not be loaded.
    #[error("failed to load templates: {0}")]
    Template(#[from] TemplateError),

    /// The output directory could not be prepared.
    #[error("failed to prepare output directory {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Output path of the content index, relative to the output directory.
pub const CONTENT_INDEX_PATH: &str = "content/index.json";

/// Filesystem locations and switches for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directories scanned for content, in order.
    pub content_dirs: Vec<PathBuf>,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Remove the output directory before building.
    pub clean: bool,
}

impl BuildOptions {
    /// Options for a content root laid out as `publish/` and `drafts/`.
    pub fn new(
        content_root: &Path,
        templates_dir: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content_dirs: content_dirs(content_root, false),
            templates_dir: templates_dir.into(),
            static_dir: static_dir.into(),
            output_dir: output_dir.into(),
            clean: false,
        }
    }

    /// Also load `<content_root>/drafts`.
    #[must_use]
    pub fn with_drafts(mut self, content_root: &Path, drafts: bool) -> Self {
        self.content_dirs = content_dirs(content_root, drafts);
        self
    }

    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }
}

/// Content directories below `root`: `publish`, plus `drafts` if requested.
pub fn content_dirs(root: &Path, drafts: bool) -> Vec<PathBuf> {
    let mut dirs = vec![root.join("publish")];
    if drafts {
        dirs.push(root.join("drafts"));
    }
    dirs
}

/// Site builder that orchestrates the build process.
pub struct Builder {
    config: SiteConfig,
    options: BuildOptions,
    renderer: Box<dyn HtmlRenderer>,
    loader_options: LoaderOptions,
}

impl Builder {
    /// Create a builder rendering markdown with the configured highlight theme.
    ///
    /// An unknown theme falls back to the default one.
    pub fn new(config: SiteConfig, options: BuildOptions) -> Self {
        let renderer = match MarkdownParser::with_theme(&config.highlight_theme) {
            Ok(parser) => parser,
            Err(e) => {
                warn!(error = %e, "falling back to default highlight theme");
                MarkdownParser::new()
            }
        };
        let loader_options = LoaderOptions::with_language(config.language.clone());

        Self {
            config,
            options,
            renderer: Box::new(renderer),
            loader_options,
        }
    }

    /// Replace the markdown renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn HtmlRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the frontmatter field rules.
    #[must_use]
    pub fn with_loader_options(mut self, options: LoaderOptions) -> Self {
        self.loader_options = options;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildResult> {
        let start = Instant::now();
        let mut result = BuildResult::new();

        info!(
            output = %self.options.output_dir.display(),
            templates = %self.options.templates_dir.display(),
            "starting build"
        );

        if !self.options.templates_dir.is_dir() {
            return Err(BuildError::TemplatesNotFound(
                self.options.templates_dir.clone(),
            ));
        }
        let templates = TemplateRegistry::from_dir(&self.options.templates_dir)?;
        debug!(count = templates.len(), "templates loaded");

        self.prepare_output()?;

        let site = self.load_site(&mut result);
        let writer = OutputWriter::new(&self.options.output_dir);
        let renderer = PageRenderer::new(&site, &templates);

        self.render_articles(&site, &renderer, &writer, &mut result);
        let index_json = self.write_content_index(&site, &writer, &mut result);
        self.copy_static(&writer, &mut result);
        self.render_standalone_pages(&site, &renderer, &writer, &index_json, &mut result);

        result.finish(start.elapsed());
        if result.success {
            info!(
                processed = result.files_processed,
                skipped = result.files_skipped,
                "build complete"
            );
        } else {
            error!(errors = result.errors.len(), "build failed");
        }
        Ok(result)
    }

    /// Run every stage up to navigation without writing output.
    pub fn check(&self) -> BuildResult {
        let start = Instant::now();
        let mut result = BuildResult::new();

        let site = self.load_site(&mut result);
        info!(
            records = site.records.len(),
            topics = site.topics.len(),
            languages = site.languages.len(),
            "content checked"
        );

        result.finish(start.elapsed());
        result
    }

    /// Load, validate and link all content into a site context.
    pub fn load_site(&self, result: &mut BuildResult) -> SiteContext {
        let loader = ContentLoader::new(self.loader_options.clone(), self.renderer.as_ref());
        let mut records = loader.load_all(&self.options.content_dirs, result);

        if !validate_content(&records, result) {
            warn!("content validation failed");
            result.fail();
        }

        info!("processing multi-language content");
        link_alternate_languages(&mut records);

        let topics = TopicIndex::build(&records);
        debug!(count = topics.len(), "built topic index");

        info!("computing related content");
        compute_navigation(&mut records, &topics, &self.config.language);

        SiteContext::new(self.config.clone(), records, topics)
    }

    fn prepare_output(&self) -> Result<()> {
        let dir = &self.options.output_dir;
        let output_error = |source: std::io::Error| BuildError::Output {
            path: dir.clone(),
            source,
        };

        if self.options.clean && dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(dir).map_err(output_error)?;
        }
        fs::create_dir_all(dir).map_err(output_error)?;
        Ok(())
    }

    /// Render every article page and write it below `content/`.
    ///
    /// Pages render in parallel, each collecting its own diagnostics. Writes
    /// and merges then happen in canonical order, so records sharing a slug
    /// always resolve to the same page on disk.
    fn render_articles(
        &self,
        site: &SiteContext,
        renderer: &PageRenderer<'_>,
        writer: &OutputWriter,
        result: &mut BuildResult,
    ) {
        info!(count = site.records.len(), "rendering content files");

        let rendered: Vec<(BuildResult, Option<String>)> = (0..site.records.len())
            .into_par_iter()
            .map(|i| {
                let mut page = BuildResult::new();
                match renderer.render_article(RecordId(i), &mut page) {
                    Ok(html) => (page, Some(html)),
                    Err(e) => {
                        let message = article_error_message(&site.records[i].path, &e);
                        error!("{message}");
                        page.add_error(message);
                        (page, None)
                    }
                }
            })
            .collect();

        for (record, (mut page, html)) in site.records.iter().zip(rendered) {
            if let Some(html) = html
                && let Err(e) = writer.write_page(Path::new(&record.url), &html)
            {
                page.add_error(format!("Error writing file {e}"));
            }
            result.merge(page);
        }
    }

    /// Write `content/index.json` and return its JSON text.
    fn write_content_index(
        &self,
        site: &SiteContext,
        writer: &OutputWriter,
        result: &mut BuildResult,
    ) -> String {
        info!("generating article index JSON");
        let index = build_index(&site.records);

        if let Err(e) = writer.write_json(Path::new(CONTENT_INDEX_PATH), &index) {
            error!(error = %e, "failed to write article index JSON file");
            result.add_error(format!("Error writing JSON file {e}"));
        }

        serde_json::to_string(&index).unwrap_or_else(|_| "[]".to_string())
    }

    fn copy_static(&self, writer: &OutputWriter, result: &mut BuildResult) {
        let source = &self.options.static_dir;
        if !source.is_dir() {
            debug!(dir = %source.display(), "static directory not found");
            result.add_warning(format!(
                "Static directory not found, skipping copy: {}",
                source.display()
            ));
            return;
        }

        if let Err(e) = writer.copy_static(source) {
            error!(error = %e, "failed to copy static assets");
            result.add_error(format!(
                "Error copying static files from {} to {}: {e}",
                source.display(),
                writer.static_dir().display()
            ));
        }
    }

    fn render_standalone_pages(
        &self,
        site: &SiteContext,
        renderer: &PageRenderer<'_>,
        writer: &OutputWriter,
        index_json: &str,
        result: &mut BuildResult,
    ) {
        for page in &site.config.standalone_pages {
            info!(
                template = %page.template,
                output = %page.output.display(),
                "rendering standalone page"
            );

            match renderer.render_standalone(page, index_json) {
                Ok(html) => {
                    if let Err(e) = writer.write_page(&page.output, &html) {
                        result.add_error(format!("Error writing file {e}"));
                    }
                }
                Err(e) => {
                    let message = standalone_error_message(page, &e);
                    error!("{message}");
                    result.add_error(message);
                }
            }
        }
    }
}

fn article_error_message(path: &Path, e: &TemplateError) -> String {
    let path = path.display();
    match e {
        TemplateError::NotFound(name) => {
            format!("Template not found for content file {path}: {name}")
        }
        TemplateError::InvalidSyntax { message, line, .. } => format!(
            "Template syntax error in {ARTICLE_TEMPLATE} at line {line} (processing {path}): {message}"
        ),
        TemplateError::MissingVariable { .. } => {
            format!("Template runtime error in {ARTICLE_TEMPLATE} (processing {path}): {e}")
        }
        TemplateError::Io { .. } => format!("Error rendering template for {path}: {e}"),
    }
}

fn standalone_error_message(page: &StandalonePage, e: &TemplateError) -> String {
    let template = &page.template;
    match e {
        TemplateError::NotFound(name) => format!("Template not found for standalone page: {name}"),
        TemplateError::InvalidSyntax { message, line, .. } => {
            format!("Template syntax error in {template} at line {line}: {message}")
        }
        TemplateError::MissingVariable { .. } => {
            format!("Template runtime error in {template}: {e}")
        }
        TemplateError::Io { .. } => format!("Failed to render standalone page {template}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        root: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let root = TempDir::new().expect("tempdir");
            for dir in ["content/publish", "content/drafts", "templates", "static"] {
                fs::create_dir_all(root.path().join(dir)).expect("mkdir");
            }
            Self { root }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.root.path().join(relative)
        }

        fn write(&self, relative: &str, content: &str) {
            let path = self.path(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(path, content).expect("write");
        }

        fn options(&self) -> BuildOptions {
            BuildOptions::new(
                &self.path("content"),
                self.path("templates"),
                self.path("static"),
                self.path("public"),
            )
        }
    }

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Test Site".to_string(),
            ..SiteConfig::default()
        }
    }

    fn post(title: &str, written: &str, topics: &str) -> String {
        format!("---\ntitle: {title}\nwritten: {written}\ntopics: {topics}\n---\n\nHello from {title}.\n")
    }

    #[test]
    fn test_content_dirs() {
        let root = Path::new("site");
        assert_eq!(content_dirs(root, false), vec![root.join("publish")]);
        assert_eq!(
            content_dirs(root, true),
            vec![root.join("publish"), root.join("drafts")]
        );
    }

    #[test]
    fn test_build_empty_site() {
        let fx = Fixture::new();

        let result = Builder::new(config(), fx.options()).build().expect("build");

        assert!(result.success, "{}", result.summary());
        assert_eq!(result.files_processed, 0);
        assert_eq!(
            fs::read_to_string(fx.path("public/content/index.json")).expect("read"),
            "[]"
        );
    }

    #[test]
    fn test_build_with_content() {
        let fx = Fixture::new();
        fx.write("content/publish/first.md", &post("First", "2024-01-01", "rust"));
        fx.write("content/publish/second.md", &post("Second", "2024-02-01", "rust"));

        let result = Builder::new(config(), fx.options()).build().expect("build");

        assert!(result.success, "{}", result.summary());
        assert_eq!(result.files_processed, 2);
        let html = fs::read_to_string(fx.path("public/content/en/first.html")).expect("read");
        assert!(html.contains("<p>Hello from First.</p>"));
        assert!(html.contains(r#"href="/content/en/second.html" rel="prev""#));
        assert!(fx.path("public/content/en/second.html").exists());
        assert!(result.elapsed.is_some());
    }

    #[test]
    fn test_drafts_are_opt_in() {
        let fx = Fixture::new();
        fx.write("content/publish/a.md", &post("A", "2024-01-01", "x"));
        fx.write("content/drafts/b.md", &post("B", "2024-01-02", "x"));

        let without = Builder::new(config(), fx.options()).check();
        assert_eq!(without.files_processed, 1);

        let options = fx.options().with_drafts(&fx.path("content"), true);
        let with = Builder::new(config(), options).check();
        assert_eq!(with.files_processed, 2);
    }

    #[test]
    fn test_missing_templates_dir_aborts() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.templates_dir = fx.path("nope");

        let err = Builder::new(config(), options).build().unwrap_err();
        assert!(matches!(err, BuildError::TemplatesNotFound(_)));
    }

    #[test]
    fn test_render_error_is_recorded() {
        let fx = Fixture::new();
        fx.write("content/publish/a.md", &post("A", "2024-01-01", "x"));
        fx.write("templates/article.html", "<h1>{{ title }}</h1>\n{{ missing }}");

        let result = Builder::new(config(), fx.options()).build().expect("build");

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Template runtime error in article.html (processing"));
        assert!(!fx.path("public/content/en/a.html").exists());
        assert!(fx.path("public/content/index.json").exists());
    }

    #[test]
    fn test_standalone_pages() {
        let fx = Fixture::new();
        fx.write("content/publish/a.md", &post("A", "2024-01-01", "x"));
        fx.write("templates/index.html", "<h1>{{ site.title }}</h1>{{ articles }}");
        let mut config = config();
        config.standalone_pages = vec![
            StandalonePage {
                template: "index.html".to_string(),
                output: "index.html".into(),
            },
            StandalonePage {
                template: "missing.html".to_string(),
                output: "missing.html".into(),
            },
        ];

        let result = Builder::new(config, fx.options()).build().expect("build");

        let html = fs::read_to_string(fx.path("public/index.html")).expect("read");
        assert!(html.starts_with("<h1>Test Site</h1>"));
        assert!(html.contains("/content/en/a.html"));
        assert_eq!(
            result.errors,
            vec!["Template not found for standalone page: missing.html"]
        );
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let fx = Fixture::new();
        fx.write("public/stale.html", "old");

        Builder::new(config(), fx.options()).build().expect("build");
        assert!(fx.path("public/stale.html").exists());

        Builder::new(config(), fx.options().with_clean(true))
            .build()
            .expect("build");
        assert!(!fx.path("public/stale.html").exists());
    }

    #[test]
    fn test_missing_static_dir_warns() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.static_dir = fx.path("no-static");

        let result = Builder::new(config(), options).build().expect("build");

        assert!(result.success);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.starts_with("Static directory not found"))
        );
    }

    #[test]
    fn test_check_writes_nothing() {
        let fx = Fixture::new();
        fx.write("content/publish/a.md", &post("A", "2024-01-01", "x"));
        fx.write("content/publish/b.md", "no frontmatter here");

        let result = Builder::new(config(), fx.options()).check();

        assert!(!result.success);
        assert_eq!(result.files_processed, 1);
        assert_eq!(result.files_skipped, 1);
        assert!(!fx.path("public").exists());
    }
}
