//! Folio CLI Library
//!
//! Command implementations for the folio static site generator, shared by the
//! binary entry point and its tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use folio::cmd::build::{self, BuildArgs};
//!
//! let args = BuildArgs::new(Path::new("site"));
//! build::run(&args).unwrap();
//! ```

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};

pub mod cmd;

pub use folio_core::{BuildResult, SiteConfig};
pub use folio_generator::{BuildOptions, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// `RUST_LOG` directives are applied on top of the level.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Load the site configuration, applying a `--base-url` override.
pub fn load_config(path: &Path, base_url: Option<&str>) -> Result<SiteConfig> {
    tracing::info!(path = %path.display(), "loading site config");
    let mut config = SiteConfig::load(path)
        .wrap_err_with(|| format!("Error loading site configuration {}", path.display()))?;

    if let Some(base_url) = base_url {
        tracing::info!(base_url, "overriding base_url from command line");
        config.set_base_url(base_url);
    }
    Ok(config)
}

/// Print a build summary to stdout.
pub fn print_summary(result: &BuildResult) {
    println!();
    for line in result.summary().lines() {
        println!("  {line}");
    }
    println!();
}
