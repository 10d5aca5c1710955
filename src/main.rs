//! waterfall - Entry Point

use clap::Parser;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use waterfall::config::CliOverrides;
use waterfall::integration::{run_headless, HeadlessOptions};
use waterfall::model::{AppError, PageNumber};
use waterfall::session::SessionConfig;
use waterfall::source::{ManifestAssetLoader, ManifestSource};

/// waterfall - ordered masonry layout of a paginated feed
#[derive(Parser, Debug)]
#[command(name = "waterfall")]
#[command(version)]
#[command(about = "Lay out a paginated feed of items into balanced columns")]
pub struct Args {
    /// Path to a JSONL manifest (reads from stdin if not provided)
    pub manifest: Option<PathBuf>,

    /// Number of columns
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub columns: Option<u32>,

    /// Container width in layout units
    #[arg(short, long)]
    pub width: Option<f64>,

    /// Items per page
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Print the placement log instead of opening the viewer
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many page requests (headless only)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            columns: self.columns.map(|c| c as usize),
            container_width: self.width,
            page_size: self.page_size.map(|p| p as usize),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let (session_config, source) = setup(&args)?;
    let loader = Arc::new(ManifestAssetLoader::from_entries(source.entries()));

    if args.headless {
        let options = HeadlessOptions {
            max_pages: args.max_pages,
            ..HeadlessOptions::default()
        };
        let mut source = source;
        let report = run_headless(session_config, &mut source, loader, options);
        let mut out = io::stdout().lock();
        for line in report.lines() {
            writeln!(out, "{line}")?;
        }
        return Ok(());
    }

    waterfall::view::run(session_config, Box::new(source), loader)?;

    Ok(())
}

/// Resolve configuration, start logging and load the manifest.
fn setup(args: &Args) -> Result<(SessionConfig, ManifestSource), AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = waterfall::config::load_config_with_precedence(args.config.clone())?;
        let merged = waterfall::config::merge_config(config_file);
        let with_env = waterfall::config::apply_env_overrides(merged);
        waterfall::config::apply_cli_overrides(with_env, args.overrides())
    };

    waterfall::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let session_config = SessionConfig::from_resolved(&config)?;
    let first_page = PageNumber::new(config.first_page);
    let source = match &args.manifest {
        Some(path) => ManifestSource::open(path, config.page_size, first_page)?,
        None => ManifestSource::from_reader(
            BufReader::new(io::stdin().lock()),
            config.page_size,
            first_page,
        )?,
    };
    Ok((session_config, source))
}
