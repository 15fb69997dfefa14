//! Output writing.
//!
//! Writes rendered pages and JSON documents below the output directory and
//! copies the static directory to `<output>/static`.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error on a specific path.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Walking the static directory failed.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Output path is absolute or leaves the output directory.
    #[error("invalid output path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes build artifacts below one output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Absolute location of an output-relative path.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(OutputError::InvalidPath(relative.to_path_buf()));
        }
        Ok(self.output_dir.join(relative))
    }

    /// Write an HTML page, creating parent directories as needed.
    pub fn write_page(&self, relative: &Path, content: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        ensure_parent(&path)?;
        fs::write(&path, content).map_err(io_error(&path))?;

        debug!(path = %path.display(), "wrote page");
        Ok(path)
    }

    /// Write `data` as pretty-printed UTF-8 JSON.
    pub fn write_json<T: Serialize + ?Sized>(&self, relative: &Path, data: &T) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        let json = serde_json::to_string_pretty(data).map_err(|source| OutputError::Json {
            path: path.clone(),
            source,
        })?;
        ensure_parent(&path)?;
        fs::write(&path, json).map_err(io_error(&path))?;

        debug!(path = %path.display(), "wrote JSON");
        Ok(path)
    }

    /// Target of [`copy_static`](Self::copy_static).
    pub fn static_dir(&self) -> PathBuf {
        self.output_dir.join("static")
    }

    /// Replace `<output>/static` with a copy of `source`.
    ///
    /// Returns the number of files copied.
    pub fn copy_static(&self, source: &Path) -> Result<usize> {
        let dest = self.static_dir();
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(io_error(&dest))?;
        }

        let mut count = 0;
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|_| OutputError::InvalidPath(entry.path().to_path_buf()))?;
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(io_error(&target))?;
            } else {
                ensure_parent(&target)?;
                fs::copy(entry.path(), &target).map_err(io_error(&target))?;
                count += 1;
            }
        }

        info!(
            source = %source.display(),
            dest = %dest.display(),
            count,
            "copied static files"
        );
        Ok(count)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    Ok(())
}
