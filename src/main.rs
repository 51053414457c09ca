mod app;
mod config;
mod file_ops;
mod file_utils;
mod navigation;
mod opener;
mod types;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Main duopane entry point
#[derive(Parser)]
#[command(name = "duopane")]
#[command(about = "Dual-pane terminal file browser")]
#[command(version)]
#[command(long_about = None)]
struct Cli {
  /// Directory to browse (defaults to main_dir from the config)
  #[arg(value_name = "DIRECTORY")]
  directory: Option<PathBuf>,

  /// Read configuration from this file instead of the default location
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Enable verbose output and debug logging
  #[arg(short, long)]
  verbose: bool,
}

/// Log file next to other cached app data.
fn log_file_path() -> Option<PathBuf> {
  dirs::cache_dir().map(|dir| dir.join("duopane").join("duopane.log"))
}

/// Sends log records to a file, the terminal belongs to the UI.
/// `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) -> Result<PathBuf> {
  let path = log_file_path().context("No cache directory to write logs to")?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  let file = OpenOptions::new().create(true).append(true).open(&path).with_context(|| format!("Failed to open {}", path.display()))?;

  let default_level = if verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
    .target(env_logger::Target::Pipe(Box::new(file)))
    .init();

  Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
  // parse command line arguments
  let cli = Cli::parse();

  // logging is best effort, the browser works without it
  let log_path = init_logging(cli.verbose);

  let config = config::Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

  // determine the directory to browse
  let target_directory = cli.directory.clone().unwrap_or_else(|| config.root_dir());

  // validate that the dir exists
  if !target_directory.exists() {
    anyhow::bail!("Directory does not exist: {}", target_directory.display());
  }

  if !target_directory.is_dir() {
    anyhow::bail!("Path is not a directory: {}", target_directory.display());
  }

  // print startup info if verbose
  if cli.verbose {
    println!("Starting duopane...");
    println!("Target directory: {}", target_directory.display());
    match &log_path {
      Ok(path) => println!("Logging to {}", path.display()),
      Err(e) => println!("Logging disabled: {:#}", e),
    }
  }

  log::info!("browsing {}", target_directory.display());

  // run the app
  if let Err(e) = app::run_app(&target_directory, config).await {
    log::error!("{:#}", e);
    eprintln!("Error: {}", e);

    // print the error chain for debugging
    let mut source = e.source();
    while let Some(err) = source {
      eprintln!("  Caused by: {}", err);
      source = err.source();
    }

    std::process::exit(1);
  }

  Ok(())
}
