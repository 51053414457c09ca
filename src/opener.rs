use crate::config::Config;
use crate::file_utils::extension_of;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How a file gets opened when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenStrategy {
  /// Convert markdown to HTML and show it in the default viewer
  #[serde(rename = "preview")]
  InternalPreview,
  /// Edit in the configured text editor
  #[serde(rename = "editor")]
  ExternalEditor,
  /// Hand the file to the configured `open_with` program
  #[serde(rename = "opener")]
  ExternalOpener,
}

impl OpenStrategy {
  pub fn display_name(&self) -> &'static str {
    match self {
      OpenStrategy::InternalPreview => "preview",
      OpenStrategy::ExternalEditor => "editor",
      OpenStrategy::ExternalOpener => "opener",
    }
  }
}

/// Extension to strategy lookup.
/// Notes open in the editor, everything else in the generic opener, config entries override both.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStrategies {
  by_extension: HashMap<String, OpenStrategy>,
  fallback: OpenStrategy,
}

impl Default for OpenStrategies {
  fn default() -> Self {
    let by_extension = [("md", OpenStrategy::ExternalEditor), ("txt", OpenStrategy::ExternalEditor)].into_iter().map(|(ext, strategy)| (ext.to_string(), strategy)).collect();

    Self {
      by_extension,
      fallback: OpenStrategy::ExternalOpener,
    }
  }
}

impl OpenStrategies {
  /// Builds the lookup from the defaults plus the config's overrides.
  pub fn from_config(config: &Config) -> Self {
    let mut strategies = Self::default();
    for (ext, strategy) in &config.open_strategies {
      strategies.by_extension.insert(ext.trim_start_matches('.').to_lowercase(), *strategy);
    }
    strategies
  }

  /// Picks the strategy for a file name (extension match is case-insensitive).
  pub fn resolve(&self, file_name: &str) -> OpenStrategy {
    extension_of(file_name).and_then(|ext| self.by_extension.get(&ext).copied()).unwrap_or(self.fallback)
  }
}

/// Whether a file name is a markdown document.
pub fn is_markdown(file_name: &str) -> bool {
  extension_of(file_name).as_deref() == Some("md")
}

/// Runs the program for a strategy and waits for it.
/// Exit statuses are not inspected. A markdown preview returns the handle of its scheduled cleanup.
pub async fn launch(path: &Path, strategy: OpenStrategy, config: &Config) -> Result<Option<JoinHandle<()>>> {
  match strategy {
    OpenStrategy::ExternalEditor => {
      run_foreground(&config.editor, path).await?;
      Ok(None)
    }
    OpenStrategy::ExternalOpener => {
      run_foreground(&config.open_with, path).await?;
      Ok(None)
    }
    OpenStrategy::InternalPreview => preview_markdown(path, config).await.map(Some),
  }
}

/// Runs `<program> <path>` with the terminal handed over, blocking until it exits.
async fn run_foreground(program: &str, path: &Path) -> Result<()> {
  log::info!("running {} {}", program, path.display());
  let status = Command::new(program).arg(path).status().await.with_context(|| format!("Failed to run {}", program))?;
  log::debug!("{} exited with {}", program, status);
  Ok(())
}

/// HTML path generated next to a markdown file.
pub fn html_path_for(markdown_path: &Path) -> PathBuf {
  markdown_path.with_extension("html")
}

/// Converts a markdown file to HTML, opens it in the default viewer,
/// then schedules removal of the HTML after the configured delay.
/// The removal races the viewer loading the page; a slow viewer can find the file already gone.
pub async fn preview_markdown(markdown_path: &Path, config: &Config) -> Result<JoinHandle<()>> {
  let html_path = html_path_for(markdown_path);

  log::info!("converting {} with {}", markdown_path.display(), config.markdown_converter);
  let status = Command::new(&config.markdown_converter)
    .arg(markdown_path)
    .arg("-o")
    .arg(&html_path)
    .status()
    .await
    .with_context(|| format!("Failed to run {}", config.markdown_converter))?;
  log::debug!("{} exited with {}", config.markdown_converter, status);

  if html_path.exists() {
    let viewer_target = html_path.clone();
    let opened = tokio::task::spawn_blocking(move || open::that(&viewer_target)).await.context("Viewer task failed")?;
    if let Err(e) = opened {
      log::warn!("failed to open {}: {}", html_path.display(), e);
    }
  }

  Ok(schedule_cleanup(html_path, Duration::from_millis(config.preview_cleanup_ms)))
}

/// Removes a generated file once the delay has passed.
/// Missing files are fine, someone else may have cleaned up already.
pub fn schedule_cleanup(path: PathBuf, delay: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => log::debug!("removed preview {}", path.display()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => log::warn!("failed to remove preview {}: {}", path.display(), e),
    }
  })
}
