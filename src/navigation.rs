use crate::file_utils::{self, SnapshotError};
use crate::opener::OpenStrategies;
use crate::types::{DirectoryListing, Effect, Focus, Item, NavEvent};
use std::path::{Path, PathBuf};

/// Lines of a file read for the preview panel.
const PREVIEW_MAX_LINES: usize = 200;

/// Selection and scroll state of one panel.
/// Keeps `scroll <= selected < scroll + rows` for the rows it was last fitted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
  directory: PathBuf,
  items: Vec<Item>,
  selected: usize,
  scroll: usize,
}

impl PanelState {
  /// Creates a panel at the top of its item list.
  pub fn new(directory: PathBuf, items: Vec<Item>) -> Self {
    Self {
      directory,
      items,
      selected: 0,
      scroll: 0,
    }
  }

  pub fn from_listing(listing: &DirectoryListing) -> Self {
    Self::new(listing.path.clone(), listing.items())
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn scroll(&self) -> usize {
    self.scroll
  }

  pub fn selected_item(&self) -> Option<&Item> {
    self.items.get(self.selected)
  }

  /// Full path of the selected entry.
  pub fn selected_path(&self) -> Option<PathBuf> {
    self.selected_item().map(|item| self.directory.join(item.name()))
  }

  /// Moves the selection up one row. Returns false at the top.
  pub fn move_up(&mut self, rows: usize) -> bool {
    if self.selected == 0 {
      return false;
    }
    self.selected -= 1;
    if self.selected < self.scroll {
      self.scroll -= 1;
    }
    self.fit(rows);
    true
  }

  /// Moves the selection down one row. Returns false at the bottom.
  pub fn move_down(&mut self, rows: usize) -> bool {
    if self.selected + 1 >= self.items.len() {
      return false;
    }
    self.selected += 1;
    if self.selected >= self.scroll + rows.max(1) {
      self.scroll += 1;
    }
    self.fit(rows);
    true
  }

  /// Clamps the selection into the item list and shifts the scroll
  /// as little as possible to keep the selection on screen.
  pub fn fit(&mut self, rows: usize) {
    let rows = rows.max(1);
    self.selected = self.selected.min(self.items.len().saturating_sub(1));
    if self.selected < self.scroll {
      self.scroll = self.selected;
    }
    if self.selected >= self.scroll + rows {
      self.scroll = self.selected + 1 - rows;
    }
  }

  /// Swaps in a fresh listing of the same directory, keeping indices where they still fit.
  pub fn replace_items(&mut self, items: Vec<Item>, rows: usize) {
    self.items = items;
    self.fit(rows);
  }
}

/// What the right panel shows while the left one has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
  Empty,
  /// Entry names inside the selected folder
  Folder { path: PathBuf, children: Vec<String> },
  /// Head of the selected text file
  Text { path: PathBuf, lines: Vec<String> },
  /// Selected file can't be shown as text
  Binary { path: PathBuf },
}

/// The right panel is either a passive preview or a browsable folder with focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightPanel {
  Preview(Preview),
  Browse(PanelState),
}

/// Drill-down navigation over a root directory with a secondary panel.
/// Owns both panels; renderers only borrow them.
#[derive(Debug)]
pub struct Navigator {
  root: PathBuf,
  strategies: OpenStrategies,
  listing: DirectoryListing,
  left: PanelState,
  right: RightPanel,
  visible_rows: usize,
}

impl Navigator {
  /// Starts at the root directory.
  pub fn new(root: &Path, strategies: OpenStrategies, visible_rows: usize) -> Result<Self, SnapshotError> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let listing = file_utils::list_directory(&root)?;

    let mut navigator = Self {
      left: PanelState::from_listing(&listing),
      root,
      strategies,
      listing,
      right: RightPanel::Preview(Preview::Empty),
      visible_rows: visible_rows.max(1),
    };
    navigator.sync_preview();
    Ok(navigator)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn left(&self) -> &PanelState {
    &self.left
  }

  pub fn right(&self) -> &RightPanel {
    &self.right
  }

  pub fn visible_rows(&self) -> usize {
    self.visible_rows
  }

  pub fn focus(&self) -> Focus {
    match self.right {
      RightPanel::Browse(_) => Focus::Right,
      RightPanel::Preview(_) => Focus::Left,
    }
  }

  /// The panel that receives keys.
  pub fn focused_panel(&self) -> &PanelState {
    match &self.right {
      RightPanel::Browse(panel) => panel,
      RightPanel::Preview(_) => &self.left,
    }
  }

  /// Directory and selected entry that file operations act on.
  pub fn target(&self) -> (&Path, Option<&Item>) {
    let panel = self.focused_panel();
    (panel.directory(), panel.selected_item())
  }

  /// Applies one navigation event.
  pub fn handle(&mut self, event: NavEvent) -> Effect {
    match event {
      NavEvent::MoveUp => self.move_selection(false),
      NavEvent::MoveDown => self.move_selection(true),
      NavEvent::Enter => return self.enter(),
      NavEvent::GoBack => self.go_back(),
      NavEvent::SwitchFocus => self.switch_focus(),
      NavEvent::Refresh => self.refresh(),
    }
    Effect::None
  }

  /// Re-fits both panels after the terminal changed size.
  pub fn set_visible_rows(&mut self, rows: usize) {
    self.visible_rows = rows.max(1);
    self.left.fit(self.visible_rows);
    if let RightPanel::Browse(panel) = &mut self.right {
      panel.fit(self.visible_rows);
    }
  }

  fn move_selection(&mut self, down: bool) {
    let rows = self.visible_rows;
    if let RightPanel::Browse(panel) = &mut self.right {
      if down {
        panel.move_down(rows);
      } else {
        panel.move_up(rows);
      }
      return;
    }

    let moved = if down { self.left.move_down(rows) } else { self.left.move_up(rows) };
    if moved {
      self.sync_preview();
    }
  }

  fn enter(&mut self) -> Effect {
    let panel = self.focused_panel();
    let Some(item) = panel.selected_item().cloned() else {
      return Effect::None;
    };
    let path = panel.directory().join(item.name());

    match item {
      Item::Folder(_) => {
        self.descend(path);
        Effect::None
      }
      Item::File(name) => Effect::Open {
        strategy: self.strategies.resolve(&name),
        path,
      },
    }
  }

  /// Replaces the listing with a subdirectory, focus goes back to the left panel.
  fn descend(&mut self, path: PathBuf) {
    match file_utils::list_directory(&path) {
      Ok(listing) => self.replace_listing(listing),
      Err(e) => log::warn!("cannot enter {}: {}", path.display(), e),
    }
  }

  fn go_back(&mut self) {
    if let RightPanel::Browse(_) = self.right {
      self.focus_left();
      return;
    }

    // the root is a floor
    if self.left.directory() == self.root || !self.left.directory().starts_with(&self.root) {
      return;
    }

    if let Some(parent) = self.left.directory().parent().map(Path::to_path_buf) {
      match file_utils::list_directory(&parent) {
        Ok(listing) => self.replace_listing(listing),
        Err(e) => {
          log::warn!("cannot go up to {}: {}", parent.display(), e);
          self.refresh();
        }
      }
    }
  }

  fn switch_focus(&mut self) {
    match self.right {
      RightPanel::Browse(_) => self.focus_left(),
      RightPanel::Preview(_) => {
        let Some(Item::Folder(name)) = self.left.selected_item() else {
          return;
        };
        let path = self.left.directory().join(name);
        match file_utils::list_directory(&path) {
          Ok(listing) => {
            let mut panel = PanelState::from_listing(&listing);
            panel.fit(self.visible_rows);
            self.right = RightPanel::Browse(panel);
          }
          Err(e) => log::warn!("cannot browse {}: {}", path.display(), e),
        }
      }
    }
  }

  /// Re-reads the current directories, keeping focus and clamping selections.
  pub fn refresh(&mut self) {
    let rows = self.visible_rows;
    let directory = self.left.directory().to_path_buf();

    match file_utils::list_directory(&directory) {
      Ok(listing) => {
        self.left.replace_items(listing.items(), rows);
        self.listing = listing;
      }
      Err(e) => {
        log::warn!("listing {} failed: {}", directory.display(), e);
        let fallback = self.nearest_listing(&directory);
        self.replace_listing(fallback);
        return;
      }
    }

    // the browsed folder must still be the one selected on the left
    let browsed = match &self.right {
      RightPanel::Browse(panel) => Some(panel.directory().to_path_buf()),
      RightPanel::Preview(_) => None,
    };
    match browsed {
      Some(browsed) if self.left.selected_item().map_or(false, Item::is_folder) && self.left.selected_path().as_deref() == Some(browsed.as_path()) => match file_utils::list_directory(&browsed) {
        Ok(listing) => {
          if let RightPanel::Browse(panel) = &mut self.right {
            panel.replace_items(listing.items(), rows);
          }
        }
        Err(_) => self.focus_left(),
      },
      Some(_) => self.focus_left(),
      None => self.sync_preview(),
    }
  }

  /// Closest readable directory at or above `start` that isn't above the root.
  fn nearest_listing(&self, start: &Path) -> DirectoryListing {
    for candidate in start.ancestors().skip(1).filter(|path| path.starts_with(&self.root)) {
      if let Ok(listing) = file_utils::list_directory(candidate) {
        return listing;
      }
    }

    file_utils::list_directory(&self.root).unwrap_or_else(|_| DirectoryListing {
      path: self.root.clone(),
      subfolders: Vec::new(),
      files: Vec::new(),
    })
  }

  /// Directory change: the left panel is rebuilt from scratch.
  fn replace_listing(&mut self, listing: DirectoryListing) {
    self.left = PanelState::from_listing(&listing);
    self.listing = listing;
    self.right = RightPanel::Preview(Preview::Empty);
    self.sync_preview();
  }

  fn focus_left(&mut self) {
    self.right = RightPanel::Preview(Preview::Empty);
    self.sync_preview();
  }

  /// Recomputes the passive preview for the left selection.
  fn sync_preview(&mut self) {
    if let RightPanel::Browse(_) = self.right {
      return;
    }

    let preview = match self.left.selected_item() {
      None => Preview::Empty,
      Some(Item::Folder(name)) => Preview::Folder {
        path: self.left.directory().join(name),
        children: self.listing.subfolder(name).map(|folder| folder.children.clone()).unwrap_or_default(),
      },
      Some(Item::File(name)) => {
        let path = self.left.directory().join(name);
        match file_utils::read_text_preview(&path, PREVIEW_MAX_LINES) {
          Some(lines) => Preview::Text { path, lines },
          None => Preview::Binary { path },
        }
      }
    };
    self.right = RightPanel::Preview(preview);
  }
}
