use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result of a file operation that didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
  /// The filesystem was changed
  Done,
  /// Nothing to do (empty name, name already taken, already gone)
  Skipped,
}

/// Errors surfaced to the user after a file operation.
#[derive(Debug, Error)]
pub enum FileOpError {
  /// Rename target already exists; nothing was moved
  #[error("'{}' already exists", .0.display())]
  Collision(PathBuf),
  /// Name would leave its directory
  #[error("invalid name '{0}'")]
  InvalidName(String),
  #[error("{}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn io_error(path: &Path, source: io::Error) -> FileOpError {
  FileOpError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Proof that the user answered a delete confirmation affirmatively.
/// Only `confirm_response` can create one.
#[derive(Debug)]
pub struct Confirmed(());

/// Interprets a confirmation answer: only `y` (any case) agrees.
pub fn confirm_response(response: &str) -> Option<Confirmed> {
  if response.to_lowercase() == "y" {
    Some(Confirmed(()))
  } else {
    None
  }
}

/// A name must stay inside its directory: no separators, no `.` or `..`.
fn check_name(name: &str) -> Result<(), FileOpError> {
  if name == "." || name == ".." || name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
    return Err(FileOpError::InvalidName(name.to_string()));
  }
  Ok(())
}

/// Creates a folder, quietly skipping names that are taken or not allowed.
pub fn create_folder(dir: &Path, name: &str) -> Result<OpOutcome, FileOpError> {
  check_name(name)?;
  let path = dir.join(name);

  match fs::create_dir(&path) {
    Ok(()) => {
      log::info!("created folder {}", path.display());
      Ok(OpOutcome::Done)
    }
    Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::PermissionDenied) => {
      log::debug!("skipped folder {}: {}", path.display(), e);
      Ok(OpOutcome::Skipped)
    }
    Err(e) => Err(io_error(&path, e)),
  }
}

/// Header line a new file starts with: the name minus its last extension.
pub fn default_header(name: &str) -> String {
  let stem = match name.rsplit_once('.') {
    Some((stem, _)) => stem,
    None => name,
  };
  format!("# {}\n", stem)
}

/// Creates (or rewrites) a file holding the default header.
/// A folder of the same name, or a permission error, skips quietly.
pub fn create_file(dir: &Path, name: &str) -> Result<OpOutcome, FileOpError> {
  check_name(name)?;
  let path = dir.join(name);

  if path.is_dir() {
    log::debug!("skipped file {}: a folder has that name", path.display());
    return Ok(OpOutcome::Skipped);
  }

  match fs::write(&path, default_header(name)) {
    Ok(()) => {
      log::info!("created file {}", path.display());
      Ok(OpOutcome::Done)
    }
    Err(e) if e.kind() == ErrorKind::PermissionDenied => {
      log::debug!("skipped file {}: {}", path.display(), e);
      Ok(OpOutcome::Skipped)
    }
    Err(e) => Err(io_error(&path, e)),
  }
}

/// Deletes a file, or a folder with everything in it.
/// Entries that are already gone count as deleted.
pub fn delete_item(dir: &Path, name: &str, is_folder: bool, _confirmed: Confirmed) -> Result<OpOutcome, FileOpError> {
  let path = dir.join(name);
  let result = if is_folder { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };

  match result {
    Ok(()) => {
      log::info!("deleted {}", path.display());
      Ok(OpOutcome::Done)
    }
    Err(e) if e.kind() == ErrorKind::NotFound => {
      log::debug!("{} was already gone", path.display());
      Ok(OpOutcome::Done)
    }
    Err(e) => Err(io_error(&path, e)),
  }
}

/// Renames an entry inside its parent directory.
/// Empty names do nothing; an existing target is refused rather than overwritten.
pub fn rename_item(old_path: &Path, new_name: &str) -> Result<OpOutcome, FileOpError> {
  let new_name = new_name.trim();
  if new_name.is_empty() {
    return Ok(OpOutcome::Skipped);
  }

  check_name(new_name)?;

  let parent = old_path.parent().unwrap_or_else(|| Path::new("."));
  let new_path = parent.join(new_name);

  if new_path == old_path {
    return Ok(OpOutcome::Skipped);
  }

  // symlink_metadata so dangling links count as taken too
  if new_path.symlink_metadata().is_ok() {
    return Err(FileOpError::Collision(new_path));
  }

  fs::rename(old_path, &new_path).map_err(|e| io_error(old_path, e))?;
  log::info!("renamed {} to {}", old_path.display(), new_path.display());

  Ok(OpOutcome::Done)
}
