use crate::types::{DirectoryListing, Subfolder};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Upper bound on how much of a file the text preview reads.
const PREVIEW_READ_LIMIT: u64 = 64 * 1024;

/// Errors from reading a directory snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
  /// The directory vanished (or never existed)
  #[error("directory not found: {}", .0.display())]
  NotFound(PathBuf),
  /// The path exists but is not a directory
  #[error("not a directory: {}", .0.display())]
  NotADirectory(PathBuf),
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Reads one level of a directory into a listing.
/// Subfolders also carry the names of their own entries, but nothing deeper is read,
/// so symlinked loops can never be followed.
pub fn list_directory(path: &Path) -> Result<DirectoryListing, SnapshotError> {
  match path.metadata() {
    Ok(metadata) if metadata.is_dir() => {}
    Ok(_) => return Err(SnapshotError::NotADirectory(path.to_path_buf())),
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SnapshotError::NotFound(path.to_path_buf())),
    Err(e) => {
      return Err(SnapshotError::Io {
        path: path.to_path_buf(),
        source: e,
      })
    }
  }

  let mut subfolders = Vec::new();
  let mut files = Vec::new();

  // no sorting, selection indices depend on enumeration order
  for entry in read_level(path) {
    let name = entry.file_name().to_string_lossy().to_string();

    if is_folder(&entry) {
      let children = read_level(entry.path()).map(|child| child.file_name().to_string_lossy().to_string()).collect();
      subfolders.push(Subfolder { name, children });
    } else {
      files.push(name);
    }
  }

  Ok(DirectoryListing {
    path: path.to_path_buf(),
    subfolders,
    files,
  })
}

/// Iterates the immediate entries of a directory, skipping ones that can't be read.
fn read_level(path: &Path) -> impl Iterator<Item = DirEntry> {
  WalkDir::new(path)
    .min_depth(1)
    .max_depth(1)
    .follow_links(false) // symlinks are classified, never walked
    .into_iter()
    .filter_map(|e| e.ok())
}

/// A symlink pointing at a directory counts as a folder.
fn is_folder(entry: &DirEntry) -> bool {
  entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

/// Reads the first lines of a file for the preview panel.
/// Returns None when the file can't be read or looks binary.
pub fn read_text_preview(path: &Path, max_lines: usize) -> Option<Vec<String>> {
  let file = File::open(path).ok()?;
  let mut buffer = Vec::new();
  file.take(PREVIEW_READ_LIMIT).read_to_end(&mut buffer).ok()?;

  // null bytes mean binary content
  if buffer.contains(&0) {
    return None;
  }

  let text = String::from_utf8_lossy(&buffer);
  Some(text.lines().take(max_lines).map(|line| line.replace('\t', "    ")).collect())
}

/// Returns the file extension in lowercase, if any.
pub fn extension_of(name: &str) -> Option<String> {
  Path::new(name).extension().map(|ext| ext.to_string_lossy().to_lowercase())
}
