//! Folio CLI
//!
//! Static site generator for multilingual Markdown content.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use folio::cmd::{build::BuildArgs, check::CheckArgs};

/// Command-line interface for folio.
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "A static site generator for multilingual Markdown content"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Locations shared by every command.
#[derive(clap::Args)]
struct SiteArgs {
    /// Root content directory (holds publish/ and drafts/)
    #[arg(long, default_value = "content")]
    content_dir: PathBuf,
    /// Site configuration YAML file
    #[arg(long, default_value = "site.yaml")]
    site_config: PathBuf,
    /// Include draft articles
    #[arg(long)]
    drafts: bool,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        #[command(flatten)]
        site: SiteArgs,
        /// Templates directory
        #[arg(long, default_value = "templates")]
        templates_dir: PathBuf,
        /// Static files directory
        #[arg(long, default_value = "static")]
        static_dir: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "public")]
        output_dir: PathBuf,
        /// Clean output directory before building
        #[arg(long)]
        clean: bool,
        /// Override the base_url from the site config ('/' for root)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Validate configuration and content without writing output
    Check {
        #[command(flatten)]
        site: SiteArgs,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

/// A parsed command with its arguments resolved.
enum Invocation {
    Build(BuildArgs),
    Check(CheckArgs),
}

impl From<Commands> for Invocation {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Build {
                site,
                templates_dir,
                static_dir,
                output_dir,
                clean,
                base_url,
            } => Self::Build(BuildArgs {
                content_dir: site.content_dir,
                templates_dir,
                static_dir,
                output_dir,
                site_config: site.site_config,
                drafts: site.drafts,
                clean,
                base_url,
            }),
            Commands::Check { site, strict } => Self::Check(CheckArgs {
                content_dir: site.content_dir,
                site_config: site.site_config,
                drafts: site.drafts,
                strict,
            }),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match Invocation::from(cli.command) {
        Invocation::Build(args) => folio::cmd::build::run(&args)?,
        Invocation::Check(args) => folio::cmd::check::run(&args)?,
    }

    Ok(())
}
