//! Content loading.
//!
//! Walks content directories, parses every markdown file into a
//! [`ContentRecord`] and returns the records in canonical order (newest first).
//! Per-file failures are recorded in the [`BuildResult`] and never abort the
//! load.

use std::{
    fs,
    path::{Path, PathBuf},
};

use folio_core::{
    BuildResult, ContentRecord, ContentType, Metadata,
    content::{OPTIONAL_FIELDS, REQUIRED_FIELDS},
    error::Result,
    frontmatter::parse_frontmatter,
};
use folio_parser::HtmlRenderer;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Options controlling how content files are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Language given to records without a `lang` field.
    pub default_language: String,
    /// Fields that must be present when `enforce_required` is set.
    pub required_fields: Vec<String>,
    /// Optional fields read when present.
    pub optional_fields: Vec<String>,
    /// Whether missing required fields fail the file.
    pub enforce_required: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            required_fields: REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
            optional_fields: OPTIONAL_FIELDS.iter().map(|s| s.to_string()).collect(),
            enforce_required: true,
        }
    }
}

impl LoaderOptions {
    /// Default options with the given site language.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            default_language: language.into(),
            ..Self::default()
        }
    }
}

/// Outcome of loading a single file.
enum FileOutcome {
    Loaded(Box<ContentRecord>),
    Disabled,
    Failed(String),
}

/// Loads markdown content files into records.
pub struct ContentLoader<'a> {
    options: LoaderOptions,
    renderer: &'a dyn HtmlRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new loader rendering bodies with `renderer`.
    pub fn new(options: LoaderOptions, renderer: &'a dyn HtmlRenderer) -> Self {
        Self { options, renderer }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load every directory and sort the combined set newest first.
    ///
    /// The sort is stable: records written on the same day keep the order in
    /// which they were found.
    pub fn load_all(&self, dirs: &[PathBuf], result: &mut BuildResult) -> Vec<ContentRecord> {
        let mut records: Vec<ContentRecord> = dirs
            .iter()
            .flat_map(|dir| self.load_directory(dir, result))
            .collect();

        records.sort_by(|a, b| b.metadata.written.cmp(&a.metadata.written));

        info!(count = records.len(), "content loaded");
        records
    }

    /// Load every markdown file below `root`.
    pub fn load_directory(&self, root: &Path, result: &mut BuildResult) -> Vec<ContentRecord> {
        if !root.is_dir() {
            warn!(dir = %root.display(), "content directory not found");
            result.add_warning(format!("Content directory not found: {}", root.display()));
            return Vec::new();
        }

        let files = find_content_files(root, result);
        info!(dir = %root.display(), count = files.len(), "found content files");

        let outcomes: Vec<(PathBuf, FileOutcome)> = files
            .into_par_iter()
            .map(|path| {
                let outcome = match self.load_file(&path, root) {
                    Ok(record) if record.metadata.disabled => FileOutcome::Disabled,
                    Ok(record) => FileOutcome::Loaded(Box::new(record)),
                    Err(e) => FileOutcome::Failed(format!(
                        "Error processing {} ({}): {e}",
                        path.display(),
                        e.kind()
                    )),
                };
                (path, outcome)
            })
            .collect();

        let mut records = Vec::with_capacity(outcomes.len());
        for (path, outcome) in outcomes {
            match outcome {
                FileOutcome::Loaded(record) => {
                    result.files_processed += 1;
                    records.push(*record);
                }
                FileOutcome::Disabled => {
                    debug!(path = %path.display(), "skipping disabled file");
                    result.files_skipped += 1;
                    result.add_warning(format!("Skipped disabled file: {}", path.display()));
                }
                FileOutcome::Failed(message) => {
                    warn!(path = %path.display(), "failed to load content file");
                    result.files_skipped += 1;
                    result.add_error(message);
                }
            }
        }

        records
    }

    /// Parse one file found under `root` into a record.
    pub fn load_file(&self, path: &Path, root: &Path) -> Result<ContentRecord> {
        debug!(path = %path.display(), "parsing file");

        let content = fs::read_to_string(path)?;
        let (frontmatter, body) = parse_frontmatter(&content, path)?;

        let metadata = Metadata::from_frontmatter(
            &frontmatter,
            &self.options.required_fields,
            &self.options.optional_fields,
            self.options.enforce_required,
            &self.options.default_language,
            path,
        )?;

        let relative_path = path.strip_prefix(root).unwrap_or(path);
        let body_html = self.renderer.render(&body);

        Ok(ContentRecord::new(
            path.to_path_buf(),
            relative_path,
            metadata,
            body_html,
        ))
    }
}

/// Find markdown files below `root` in a stable order, skipping hidden entries.
fn find_content_files(root: &Path, result: &mut BuildResult) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && ContentType::from_path(entry.path()).is_some() {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                result.add_error(format!("Error processing {path} (IOError): {e}"));
            }
        }
    }

    files
}
