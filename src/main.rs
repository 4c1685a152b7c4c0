use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;
use yearbook::build::build_site;
use yearbook::config::Config;

/// Builds a year-bucketed markdown blog into a static site.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The project file (default: the nearest `site.yaml` in the current
    /// directory or its ancestors)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory, overriding the project file's `output_dir`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log every copied file
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_project_file(path)
            .with_context(|| format!("Loading configuration from `{}`", path.display()))?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    let config = match cli.output {
        Some(output) => config.with_output_directory(output),
        None => config,
    };

    let build_time = build_time()?;
    build_site(&config, build_time)?;
    log::info!("site written to {}", config.output_directory.display());
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = match verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
        .context("Initializing the logger")
}

// Honors `SOURCE_DATE_EPOCH` so that builds can be reproduced exactly.
fn build_time() -> Result<NaiveDateTime> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => {
            let secs: i64 = epoch
                .trim()
                .parse()
                .with_context(|| format!("Parsing SOURCE_DATE_EPOCH `{}`", epoch))?;
            DateTime::from_timestamp(secs, 0)
                .map(|t| t.naive_utc())
                .with_context(|| format!("SOURCE_DATE_EPOCH `{}` out of range", epoch))
        }
        Err(_) => Ok(Local::now().naive_local()),
    }
}
