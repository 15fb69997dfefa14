//! Check command - validate configuration and content without writing output

use std::path::PathBuf;

use color_eyre::eyre::{Result, bail};
use folio_generator::{BuildOptions, Builder, build::content_dirs};

use crate::{load_config, print_summary};

/// Inputs of one `folio check` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    pub content_dir: PathBuf,
    pub site_config: PathBuf,
    pub drafts: bool,
    /// Treat warnings as errors.
    pub strict: bool,
}

/// Run the check command.
///
/// Loads, validates and links all content, then reports the diagnostics.
pub fn run(args: &CheckArgs) -> Result<()> {
    tracing::info!(
        content = %args.content_dir.display(),
        strict = args.strict,
        "Checking configuration and content"
    );

    let config = load_config(&args.site_config, None)?;
    println!("  ✓ Configuration valid");

    let options = BuildOptions {
        content_dirs: content_dirs(&args.content_dir, args.drafts),
        templates_dir: PathBuf::new(),
        static_dir: PathBuf::new(),
        output_dir: PathBuf::new(),
        clean: false,
    };
    let result = Builder::new(config, options).check();

    print_summary(&result);

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }
    if args.strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!("  ✓ All checks passed");
    Ok(())
}
