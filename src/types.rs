use crate::opener::OpenStrategy;
use std::path::PathBuf;

/// A folder inside a directory listing.
/// Carries the names of its own immediate entries, read one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfolder {
  /// Folder name (last path component)
  pub name: String,
  /// Names of the entries directly inside the folder
  pub children: Vec<String>,
}

/// One level of a directory, as read from disk.
/// Subfolders and files partition the entries and keep the order the filesystem returned them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
  /// The directory that was read
  pub path: PathBuf,
  /// Subfolders in enumeration order
  pub subfolders: Vec<Subfolder>,
  /// File names in enumeration order
  pub files: Vec<String>,
}

impl DirectoryListing {
  /// Flattens the listing into panel items, folders first.
  pub fn items(&self) -> Vec<Item> {
    self.subfolders.iter().map(|folder| Item::Folder(folder.name.clone())).chain(self.files.iter().map(|file| Item::File(file.clone()))).collect()
  }

  /// Looks up a subfolder by name.
  pub fn subfolder(&self, name: &str) -> Option<&Subfolder> {
    self.subfolders.iter().find(|folder| folder.name == name)
  }
}

/// A single row of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
  Folder(String),
  File(String),
}

impl Item {
  /// Returns the entry name.
  pub fn name(&self) -> &str {
    match self {
      Item::Folder(name) | Item::File(name) => name,
    }
  }

  pub fn is_folder(&self) -> bool {
    matches!(self, Item::Folder(_))
  }
}

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
  #[default]
  Left,
  Right,
}

/// Navigation events the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
  MoveUp,
  MoveDown,
  Enter,
  GoBack,
  SwitchFocus,
  Refresh,
}

/// Follow-up work a navigation event asks the input loop to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  /// State changed (or didn't), nothing else to do
  None,
  /// Launch an external program for a file
  Open { path: PathBuf, strategy: OpenStrategy },
}

/// Kinds of text prompt the app can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
  /// Create a folder in the given directory
  NewFolder(PathBuf),
  /// Create a file in the given directory
  NewFile(PathBuf),
  /// Rename the entry at the given path
  Rename(PathBuf),
  /// Confirm deletion of an entry inside a directory
  ConfirmDelete { dir: PathBuf, name: String, is_folder: bool },
}

impl PromptKind {
  /// Title shown on the prompt box.
  pub fn title(&self) -> String {
    match self {
      PromptKind::NewFolder(_) => "Enter folder name".to_string(),
      PromptKind::NewFile(_) => "Enter file name".to_string(),
      PromptKind::Rename(_) => "Enter new name".to_string(),
      PromptKind::ConfirmDelete { name, .. } => format!("Are you sure you want to delete '{}'? (y/n)", name),
    }
  }
}

/// Text entry state for an open prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
  pub kind: PromptKind,
  pub input: String,
}

/// Input mode of the app.
/// Normal routes keys to navigation and actions, the others capture every key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
  #[default]
  Normal,
  Prompt(Prompt),
  Help,
}
