use crate::opener::OpenStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// User configuration for duopane.
/// Loaded once at startup and passed around read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Root directory, may contain `~`, `$VAR` or `${VAR}`
  pub main_dir: String,
  /// Program used to open files that have no better strategy
  pub open_with: String,
  /// Text editor for notes
  pub editor: String,
  /// Document converter called as `<converter> <input> -o <output>`
  pub markdown_converter: String,
  /// How long the generated preview HTML lives before removal
  pub preview_cleanup_ms: u64,
  /// Per-extension overrides of the default open strategies
  pub open_strategies: HashMap<String, OpenStrategy>,
  /// Single-character action keys
  pub keybinds: Keybinds,
}

impl Default for Config {
  /// Provides sensible default values (first-time users).
  fn default() -> Self {
    Self {
      main_dir: "~".to_string(),
      open_with: default_opener().to_string(),
      editor: "nano".to_string(),
      markdown_converter: "pandoc".to_string(),
      preview_cleanup_ms: 2000,
      open_strategies: HashMap::new(),
      keybinds: Keybinds::default(),
    }
  }
}

/// Platform program that opens a file with its associated application.
fn default_opener() -> &'static str {
  if cfg!(target_os = "macos") {
    "open"
  } else if cfg!(target_os = "windows") {
    "explorer"
  } else {
    "xdg-open"
  }
}

/// Actions that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Quit,
  Refresh,
  Delete,
  NewFolder,
  NewFile,
  ViewMarkdown,
  Rename,
}

/// Key assignments. Each character is both the label shown to the user and the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybinds {
  pub quit: char,
  pub refresh: char,
  pub delete: char,
  pub new_folder: char,
  pub new_file: char,
  pub view_markdown: char,
  pub rename: char,
}

impl Default for Keybinds {
  fn default() -> Self {
    Self {
      quit: 'q',
      refresh: 'r',
      delete: 'd',
      new_folder: 'f',
      new_file: 'n',
      view_markdown: 'm',
      rename: 'e',
    }
  }
}

impl Keybinds {
  /// Named bindings in display order.
  pub fn entries(&self) -> [(&'static str, char, Action); 7] {
    [
      ("quit", self.quit, Action::Quit),
      ("refresh", self.refresh, Action::Refresh),
      ("delete", self.delete, Action::Delete),
      ("new_folder", self.new_folder, Action::NewFolder),
      ("new_file", self.new_file, Action::NewFile),
      ("view_markdown", self.view_markdown, Action::ViewMarkdown),
      ("rename", self.rename, Action::Rename),
    ]
  }

  /// Maps a pressed character to its action, first binding wins.
  pub fn action_for(&self, key: char) -> Option<Action> {
    self.entries().into_iter().find(|(_, bound, _)| *bound == key).map(|(_, _, action)| action)
  }
}

impl Config {
  /// Loads configuration from an explicit file, or from the user's config dir.
  /// The default location gets a fresh default config written when missing.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    if let Some(path) = explicit_path {
      return Self::read_from(path);
    }

    let config_path = get_config_path()?;
    if config_path.exists() {
      Self::read_from(&config_path)
    } else {
      let default_config = Config::default();
      default_config.save_to(&config_path)?;
      Ok(default_config)
    }
  }

  /// Reads and parses a config file.
  fn read_from(path: &Path) -> Result<Self> {
    let config_content = fs::read_to_string(path).with_context(|| format!("Error: failed to read config file: {}", path.display()))?;

    // handle corrupted config file
    let config: Config = serde_json::from_str(&config_content).with_context(|| format!("Error: failed to parse config file: {}", path.display()))?;

    Ok(config)
  }

  /// Writes the config as pretty JSON, creating parent directories.
  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Error: failed to create config directory: {}", parent.display()))?;
    }

    let config_content = serde_json::to_string_pretty(self).context("Error: failed to serialize config")?;
    fs::write(path, config_content).with_context(|| format!("Error: failed to write config file: {}", path.display()))?;

    Ok(())
  }

  /// The root directory with variables expanded.
  pub fn root_dir(&self) -> PathBuf {
    PathBuf::from(expand_path(&self.main_dir, |name| std::env::var(name).ok()))
  }
}

/// Gets the path to the duopane config file.
fn get_config_path() -> Result<PathBuf> {
  let config_dir = dirs::config_dir().context("Error: could not determine config directory")?;

  Ok(config_dir.join("duopane").join("config.json"))
}

/// Expands a leading `~` and any `$VAR` / `${VAR}` references.
/// Unknown variables are left untouched.
pub fn expand_path(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
  let mut input = raw.to_string();

  if input == "~" || input.starts_with("~/") {
    if let Some(home) = dirs::home_dir() {
      input = format!("{}{}", home.display(), &input[1..]);
    }
  }

  let mut expanded = String::with_capacity(input.len());
  let mut rest = input.as_str();

  while let Some(dollar) = rest.find('$') {
    expanded.push_str(&rest[..dollar]);
    let after = &rest[dollar + 1..];

    // ${NAME} form
    if let Some(braced) = after.strip_prefix('{') {
      if let Some(close) = braced.find('}') {
        let name = &braced[..close];
        match lookup(name) {
          Some(value) => expanded.push_str(&value),
          None => expanded.push_str(&rest[dollar..dollar + close + 3]),
        }
        rest = &braced[close + 1..];
        continue;
      }
    }

    // $NAME form
    let name_len = after.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(after.len());
    let name = &after[..name_len];
    match (name.is_empty(), lookup(name)) {
      (false, Some(value)) => expanded.push_str(&value),
      _ => {
        expanded.push('$');
        expanded.push_str(name);
      }
    }
    rest = &after[name_len..];
  }

  expanded.push_str(rest);
  expanded
}
