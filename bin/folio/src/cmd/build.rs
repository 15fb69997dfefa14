//! Build command - generates the static site

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use folio_generator::{BuildOptions, Builder, build::content_dirs};

use crate::{load_config, print_summary};

/// Inputs of one `folio build` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    pub content_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    pub site_config: PathBuf,
    pub drafts: bool,
    pub clean: bool,
    pub base_url: Option<String>,
}

impl BuildArgs {
    /// Conventional layout below a site root.
    pub fn new(root: &Path) -> Self {
        Self {
            content_dir: root.join("content"),
            templates_dir: root.join("templates"),
            static_dir: root.join("static"),
            output_dir: root.join("public"),
            site_config: root.join("site.yaml"),
            drafts: false,
            clean: false,
            base_url: None,
        }
    }

    fn options(&self) -> BuildOptions {
        BuildOptions {
            content_dirs: content_dirs(&self.content_dir, self.drafts),
            templates_dir: self.templates_dir.clone(),
            static_dir: self.static_dir.clone(),
            output_dir: self.output_dir.clone(),
            clean: self.clean,
        }
    }
}

/// Run the build command.
///
/// Prints the build summary and fails when the build recorded any error.
pub fn run(args: &BuildArgs) -> Result<()> {
    tracing::info!(
        content = %args.content_dir.display(),
        output = %args.output_dir.display(),
        drafts = args.drafts,
        clean = args.clean,
        "Starting build"
    );

    let config = load_config(&args.site_config, args.base_url.as_deref())?;
    let result = Builder::new(config, args.options())
        .build()
        .wrap_err("Build failed")?;

    print_summary(&result);

    if !result.success {
        bail!("Build failed with {} error(s)", result.errors.len());
    }
    println!("  Output: {}", args.output_dir.display());
    Ok(())
}
