use crate::config::{Action, Config};
use crate::file_ops::{self, OpOutcome};
use crate::navigation::Navigator;
use crate::opener::{self, OpenStrategies, OpenStrategy};
use crate::types::{Effect, Item, Mode, NavEvent, Prompt, PromptKind};
use crate::ui::{geometry_for, navigation_event, render_app, ViewState};
use anyhow::{Context, Result};
use crossterm::{
  event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
  execute,
  terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// How long a status message stays in the footer.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// A file to hand to an external program, with the terminal released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
  pub path: PathBuf,
  pub strategy: OpenStrategy,
}

/// Main app struct.
/// Owns the navigator and routes keys to navigation, prompts and file operations.
pub struct App {
  /// Both panels and the current listing
  pub navigator: Navigator,
  pub config: Config,
  /// Normal, prompt or help overlay
  pub mode: Mode,
  pub should_quit: bool,
  pub status_message: String,
  /// When the status message was last updated
  pub status_updated_at: Instant,
  /// Scheduled removals of generated preview files
  pending_cleanups: Vec<JoinHandle<()>>,
}

impl App {
  /// Creates a new app rooted at `root_path`.
  pub fn new(root_path: &Path, config: Config, visible_rows: usize) -> Result<Self> {
    let strategies = OpenStrategies::from_config(&config);
    let navigator = Navigator::new(root_path, strategies, visible_rows).with_context(|| format!("Failed to read {}", root_path.display()))?;

    Ok(Self {
      navigator,
      config,
      mode: Mode::Normal,
      should_quit: false,
      status_message: String::new(),
      status_updated_at: Instant::now(),
      pending_cleanups: Vec::new(),
    })
  }

  /// Runs the main application loop.
  pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    loop {
      let view = ViewState {
        mode: &self.mode,
        status_message: &self.status_message,
      };
      terminal.draw(|frame| render_app(frame, &self.navigator, &self.config, &view))?;

      // poll with a timeout so status messages expire without input
      if event::poll(Duration::from_millis(100))? {
        match event::read()? {
          Event::Key(key) if key.kind == KeyEventKind::Press => {
            if let Some(launch) = self.handle_key_event(key) {
              self.run_launch(terminal, launch).await?;
            }
          }
          Event::Resize(cols, rows) => self.handle_resize(cols, rows),
          _ => {}
        }
      }

      self.periodic_update();

      if self.should_quit {
        break;
      }
    }

    self.finish_cleanups().await;
    Ok(())
  }

  /// Handles one key press.
  /// Returns the external launch the key asked for, which the loop runs with the terminal released.
  pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Launch> {
    match self.mode {
      Mode::Help => {
        // any key closes the keybind reference
        self.mode = Mode::Normal;
        return None;
      }
      Mode::Prompt(_) => {
        self.handle_prompt_key(key);
        return None;
      }
      Mode::Normal => {}
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return None;
    }

    // action keys are plain characters, shift allowed for `?` and capitals
    let plain = key.modifiers.difference(KeyModifiers::SHIFT).is_empty();
    if let (KeyCode::Char(c), true) = (key.code, plain) {
      if let Some(action) = self.config.keybinds.action_for(c) {
        return self.handle_action(action);
      }
      if c == 'h' || c == '?' {
        self.mode = Mode::Help;
        return None;
      }
    }

    let event = navigation_event(&key, self.navigator.focus())?;
    match self.navigator.handle(event) {
      Effect::Open { path, strategy } => Some(Launch { path, strategy }),
      Effect::None => None,
    }
  }

  /// Runs a configured action.
  fn handle_action(&mut self, action: Action) -> Option<Launch> {
    let (dir, item) = self.navigator.target();
    let dir = dir.to_path_buf();
    let item = item.cloned();

    match action {
      Action::Quit => self.should_quit = true,
      Action::Refresh => {
        self.navigator.handle(NavEvent::Refresh);
        self.set_status_message("Refreshed".to_string());
      }
      Action::NewFolder => self.open_prompt(PromptKind::NewFolder(dir)),
      Action::NewFile => self.open_prompt(PromptKind::NewFile(dir)),
      Action::Rename => {
        if let Some(item) = item {
          self.open_prompt(PromptKind::Rename(dir.join(item.name())));
        }
      }
      Action::Delete => {
        if let Some(item) = item {
          self.open_prompt(PromptKind::ConfirmDelete {
            dir,
            name: item.name().to_string(),
            is_folder: item.is_folder(),
          });
        }
      }
      Action::ViewMarkdown => {
        if let Some(Item::File(name)) = item {
          if opener::is_markdown(&name) {
            return Some(Launch {
              path: dir.join(name),
              strategy: OpenStrategy::InternalPreview,
            });
          }
        }
      }
    }

    None
  }

  fn open_prompt(&mut self, kind: PromptKind) {
    self.mode = Mode::Prompt(Prompt { kind, input: String::new() });
  }

  /// Edits the open prompt.
  /// Enter submits the trimmed text, Escape submits an empty answer.
  fn handle_prompt_key(&mut self, key: KeyEvent) {
    let Mode::Prompt(prompt) = &mut self.mode else {
      return;
    };

    match key.code {
      KeyCode::Enter => {
        let input = prompt.input.trim().to_string();
        let kind = prompt.kind.clone();
        self.mode = Mode::Normal;
        self.submit_prompt(kind, input);
      }
      KeyCode::Esc => {
        let kind = prompt.kind.clone();
        self.mode = Mode::Normal;
        self.submit_prompt(kind, String::new());
      }
      KeyCode::Backspace | KeyCode::Delete => {
        prompt.input.pop();
      }
      // printable ASCII only
      KeyCode::Char(c) if (' '..='~').contains(&c) && !key.modifiers.contains(KeyModifiers::CONTROL) => {
        prompt.input.push(c);
      }
      _ => {}
    }
  }

  /// Applies a prompt answer, then re-reads the listing.
  fn submit_prompt(&mut self, kind: PromptKind, input: String) {
    self.apply_prompt(kind, input);
    self.navigator.refresh();
  }

  /// Failures land in the status line; they never stop the loop.
  fn apply_prompt(&mut self, kind: PromptKind, input: String) {
    let (result, done_message) = match kind {
      PromptKind::NewFolder(dir) => {
        if input.is_empty() {
          return;
        }
        (file_ops::create_folder(&dir, &input), format!("Created folder {}", input))
      }
      PromptKind::NewFile(dir) => {
        if input.is_empty() {
          return;
        }
        (file_ops::create_file(&dir, &input), format!("Created file {}", input))
      }
      PromptKind::Rename(old_path) => {
        let old_name = old_path.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default();
        (file_ops::rename_item(&old_path, &input), format!("Renamed {} to {}", old_name, input))
      }
      PromptKind::ConfirmDelete { dir, name, is_folder } => match file_ops::confirm_response(&input) {
        Some(confirmed) => (file_ops::delete_item(&dir, &name, is_folder, confirmed), format!("Deleted {}", name)),
        None => {
          self.set_status_message("Delete cancelled".to_string());
          return;
        }
      },
    };

    match result {
      Ok(OpOutcome::Done) => self.set_status_message(done_message),
      Ok(OpOutcome::Skipped) => {}
      Err(e) => {
        log::warn!("file operation failed: {}", e);
        self.set_status_message(format!("Error: {}", e));
      }
    }
  }

  /// Hands the terminal to an external program and takes it back afterwards.
  async fn run_launch(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, launch: Launch) -> Result<()> {
    log::debug!("opening {} with {}", launch.path.display(), launch.strategy.display_name());

    suspend_terminal()?;
    let result = opener::launch(&launch.path, launch.strategy, &self.config).await;
    resume_terminal(terminal)?;

    match result {
      Ok(Some(cleanup)) => self.pending_cleanups.push(cleanup),
      Ok(None) => {}
      Err(e) => {
        log::warn!("launch failed: {:#}", e);
        self.set_status_message(format!("Error: {:#}", e));
      }
    }

    // the program may have changed the directory
    self.navigator.refresh();
    Ok(())
  }

  fn handle_resize(&mut self, cols: u16, rows: u16) {
    let geometry = geometry_for(ratatui::layout::Rect::new(0, 0, cols, rows));
    self.navigator.set_visible_rows(geometry.visible_rows());
  }

  /// Performs periodic updates.
  fn periodic_update(&mut self) {
    if !self.status_message.is_empty() && self.status_updated_at.elapsed() > STATUS_TIMEOUT {
      self.status_message.clear();
    }

    self.pending_cleanups.retain(|handle| !handle.is_finished());
  }

  /// Waits for scheduled preview removals so no generated file outlives the app.
  async fn finish_cleanups(&mut self) {
    for handle in self.pending_cleanups.drain(..) {
      if let Err(e) = handle.await {
        log::warn!("preview cleanup task failed: {}", e);
      }
    }
  }

  /// Sets a status message and updates the timestamp.
  fn set_status_message(&mut self, message: String) {
    self.status_message = message;
    self.status_updated_at = Instant::now();
  }
}

/// Initializes the terminal for TUI mode.
/// Sets up raw mode and alternate screen.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
  enable_raw_mode().context("Error: failed to enable raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("Error: failed to enter alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let terminal = Terminal::new(backend).context("Error: failed to create terminal")?;
  Ok(terminal)
}

/// Restores the terminal to normal mode.
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
  disable_raw_mode().context("Error: failed to disable raw mode")?;
  execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Error: failed to leave alternate screen")?;
  terminal.show_cursor().context("Error: failed to show cursor")?;
  Ok(())
}

/// Releases the terminal so a foreground program can draw on it.
fn suspend_terminal() -> Result<()> {
  disable_raw_mode().context("Error: failed to disable raw mode")?;
  execute!(io::stdout(), LeaveAlternateScreen).context("Error: failed to leave alternate screen")?;
  Ok(())
}

/// Takes the terminal back after a foreground program exits and forces a full redraw.
fn resume_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
  enable_raw_mode().context("Error: failed to enable raw mode")?;
  execute!(terminal.backend_mut(), EnterAlternateScreen).context("Error: failed to enter alternate screen")?;
  terminal.clear().context("Error: failed to clear terminal")?;
  Ok(())
}

/// Restores the terminal before the default panic output, so the message stays readable.
fn install_panic_hook() {
  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    default_hook(info);
  }));
}

/// Runs the browser, sets up terminal, runs the app, and cleans up.
pub async fn run_app(root_path: &Path, config: Config) -> Result<()> {
  install_panic_hook();

  // setup terminal
  let mut terminal = setup_terminal()?;

  let result = async {
    let size = terminal.size().context("Error: failed to read terminal size")?;
    let mut app = App::new(root_path, config, geometry_for(size).visible_rows())?;
    app.run(&mut terminal).await
  }
  .await;

  // always restore terminal, even if the app fails
  restore_terminal(&mut terminal)?;

  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_key_event(key(KeyCode::Char(c)));
    }
  }

  /// Root holding a `docs` folder and `a.txt`.
  fn setup() -> (TempDir, App) {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("docs")).unwrap();
    fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();
    let app = App::new(temp_dir.path(), Config::default(), 10).unwrap();
    (temp_dir, app)
  }

  #[test]
  fn test_delete_after_confirmation() {
    let (temp_dir, mut app) = setup();

    app.handle_key_event(key(KeyCode::Down));
    app.handle_key_event(key(KeyCode::Down));
    assert_eq!(app.navigator.left().selected(), 1);
    assert_eq!(app.navigator.left().selected_item(), Some(&Item::File("a.txt".to_string())));

    app.handle_key_event(key(KeyCode::Char('d')));
    assert!(matches!(&app.mode, Mode::Prompt(Prompt { kind: PromptKind::ConfirmDelete { name, .. }, .. }) if name == "a.txt"));

    type_text(&mut app, "y");
    app.handle_key_event(key(KeyCode::Enter));

    assert_eq!(app.mode, Mode::Normal);
    assert!(!temp_dir.path().join("a.txt").exists());
    assert_eq!(app.navigator.left().items(), &[Item::Folder("docs".to_string())]);
    assert_eq!(app.status_message, "Deleted a.txt");
  }

  #[test]
  fn test_delete_declined() {
    let (temp_dir, mut app) = setup();

    app.handle_key_event(key(KeyCode::Char('d')));
    type_text(&mut app, "yes");
    app.handle_key_event(key(KeyCode::Enter));
    assert!(temp_dir.path().join("docs").is_dir());

    app.handle_key_event(key(KeyCode::Char('d')));
    app.handle_key_event(key(KeyCode::Esc));
    assert!(temp_dir.path().join("docs").is_dir());
    assert_eq!(app.status_message, "Delete cancelled");
  }

  #[test]
  fn test_new_file_in_browsed_folder() {
    let (temp_dir, mut app) = setup();

    // browse into docs, then create a file there
    app.handle_key_event(key(KeyCode::Right));
    app.handle_key_event(key(KeyCode::Char('n')));
    type_text(&mut app, "  plan.md ");
    app.handle_key_event(key(KeyCode::Enter));

    let created = temp_dir.path().join("docs").join("plan.md");
    assert_eq!(fs::read_to_string(created).unwrap(), "# plan\n");
    assert_eq!(app.navigator.focused_panel().items(), &[Item::File("plan.md".to_string())]);
  }

  #[test]
  fn test_new_folder_and_empty_name() {
    let (temp_dir, mut app) = setup();

    app.handle_key_event(key(KeyCode::Char('f')));
    app.handle_key_event(key(KeyCode::Enter));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);

    app.handle_key_event(key(KeyCode::Char('f')));
    type_text(&mut app, "drafts");
    app.handle_key_event(key(KeyCode::Backspace));
    app.handle_key_event(key(KeyCode::Enter));
    assert!(temp_dir.path().join("draft").is_dir());
    assert!(app.navigator.left().items().contains(&Item::Folder("draft".to_string())));
  }

  #[test]
  fn test_rename_and_collision() {
    let (temp_dir, mut app) = setup();
    fs::write(temp_dir.path().join("b.txt"), "other").unwrap();
    app.navigator.refresh();

    let a_index = app.navigator.left().items().iter().position(|item| item.name() == "a.txt").unwrap();
    for _ in 0..a_index {
      app.handle_key_event(key(KeyCode::Down));
    }

    app.handle_key_event(key(KeyCode::Char('e')));
    type_text(&mut app, "b.txt");
    app.handle_key_event(key(KeyCode::Enter));
    assert!(app.status_message.starts_with("Error"));
    assert_eq!(fs::read_to_string(temp_dir.path().join("b.txt")).unwrap(), "other");

    app.handle_key_event(key(KeyCode::Char('e')));
    type_text(&mut app, "c.txt");
    app.handle_key_event(key(KeyCode::Enter));
    assert!(!temp_dir.path().join("a.txt").exists());
    assert_eq!(fs::read_to_string(temp_dir.path().join("c.txt")).unwrap(), "hello");
  }

  #[test]
  fn test_enter_on_file_requests_launch() {
    let (temp_dir, mut app) = setup();
    fs::write(temp_dir.path().join("notes.md"), "# notes\n").unwrap();
    app.navigator.refresh();

    let index = app.navigator.left().items().iter().position(|item| item.name() == "notes.md").unwrap();
    for _ in 0..index {
      app.handle_key_event(key(KeyCode::Down));
    }

    let launch = app.handle_key_event(key(KeyCode::Enter)).unwrap();
    assert_eq!(launch.strategy, OpenStrategy::ExternalEditor);
    assert!(launch.path.ends_with("notes.md"));

    let launch = app.handle_key_event(key(KeyCode::Char('m'))).unwrap();
    assert_eq!(launch.strategy, OpenStrategy::InternalPreview);
  }

  #[test]
  fn test_view_markdown_ignores_other_files() {
    let (_temp_dir, mut app) = setup();

    // docs folder
    assert_eq!(app.handle_key_event(key(KeyCode::Char('m'))), None);
    app.handle_key_event(key(KeyCode::Down));
    // a.txt
    assert_eq!(app.handle_key_event(key(KeyCode::Char('m'))), None);
  }

  #[test]
  fn test_help_and_quit() {
    let (_temp_dir, mut app) = setup();

    app.handle_key_event(key(KeyCode::Char('?')));
    assert_eq!(app.mode, Mode::Help);

    // closes help without quitting
    app.handle_key_event(key(KeyCode::Char('q')));
    assert_eq!(app.mode, Mode::Normal);
    assert!(!app.should_quit);

    app.handle_key_event(key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let (_temp_dir, mut app) = setup();
    app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[test]
  fn test_modified_keys_skip_actions() {
    let (temp_dir, mut app) = setup();

    app.handle_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::ALT));
    assert!(!app.should_quit);

    app.handle_key_event(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
    assert_eq!(app.mode, Mode::Normal);
    assert!(temp_dir.path().join("docs").is_dir());

    // shifted characters still reach the help key
    app.handle_key_event(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT));
    assert_eq!(app.mode, Mode::Help);
  }

  #[test]
  fn test_prompt_captures_action_keys() {
    let (temp_dir, mut app) = setup();

    app.handle_key_event(key(KeyCode::Char('f')));
    type_text(&mut app, "quick");
    assert!(!app.should_quit);
    app.handle_key_event(key(KeyCode::Enter));
    assert!(temp_dir.path().join("quick").is_dir());
  }

  #[test]
  fn test_resize_adjusts_rows() {
    let (_temp_dir, mut app) = setup();

    app.handle_resize(90, 24);
    assert_eq!(app.navigator.visible_rows(), 14);
  }

  #[tokio::test]
  async fn test_cleanups_awaited() {
    let (temp_dir, mut app) = setup();
    let generated = temp_dir.path().join("a.html");
    fs::write(&generated, "<p>a</p>").unwrap();

    app.pending_cleanups.push(opener::schedule_cleanup(generated.clone(), Duration::from_millis(10)));
    app.finish_cleanups().await;
    assert!(!generated.exists());
  }
}
