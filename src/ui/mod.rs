pub mod overlay;
pub mod panels;

use crate::config::{Config, Keybinds};
use crate::navigation::{Navigator, RightPanel};
use crate::types::{Focus, Mode, NavEvent};
use crossterm::event::{KeyCode, KeyEvent};
use panels::{panel_geometry, panel_rows, path_label, preview_rows, render_panel, right_title, truncate_text, PanelGeometry};
use ratatui::{
  layout::Rect,
  style::{Color, Style},
  widgets::Paragraph,
  Frame,
};

/// What the frame shows besides the panels.
pub struct ViewState<'a> {
  pub mode: &'a Mode,
  pub status_message: &'a str,
}

/// Geometry for the current terminal size.
pub fn geometry_for(area: Rect) -> PanelGeometry {
  panel_geometry(area.height, area.width)
}

/// Renders the complete UI.
/// Main entry point for all UI rendering, recomputes everything from state each frame.
pub fn render_app(frame: &mut Frame, navigator: &Navigator, config: &Config, view: &ViewState) {
  let area = frame.size();
  let geometry = geometry_for(area);
  let rows = geometry.visible_rows();
  let width = geometry.text_width();
  let focus = navigator.focus();

  // left panel always shows its selection
  let left_rows = panel_rows(navigator.left(), rows, width, true);
  let left_title = path_label(navigator.root(), navigator.left().directory());
  render_panel(frame, geometry.left, &left_title, &left_rows, focus == Focus::Left);

  let right_rows = match navigator.right() {
    RightPanel::Browse(panel) => panel_rows(panel, rows, width, true),
    RightPanel::Preview(preview) => preview_rows(preview, rows, width),
  };
  let right_title = right_title(navigator.root(), navigator.right());
  render_panel(frame, geometry.right, &right_title, &right_rows, focus == Focus::Right);

  render_footer(frame, &geometry, config, view.status_message);

  match view.mode {
    Mode::Normal => {}
    Mode::Prompt(prompt) => overlay::render_prompt(frame, prompt),
    Mode::Help => overlay::render_help(frame, &config.keybinds),
  }
}

/// Status and key hints on the rows below the panels, when they fit.
fn render_footer(frame: &mut Frame, geometry: &PanelGeometry, config: &Config, status_message: &str) {
  let area = frame.size();
  let x = geometry.left.x;
  let width = (geometry.left.width + geometry.right.width).min(area.width.saturating_sub(x));
  let status_y = geometry.left.y + geometry.left.height;

  if width == 0 {
    return;
  }

  if !status_message.is_empty() && status_y < area.height {
    let status_style = if status_message.starts_with("Error") { Style::default().fg(Color::Red) } else { Style::default().fg(Color::Green) };
    let status = Paragraph::new(truncate_text(status_message, width as usize)).style(status_style);
    frame.render_widget(status, Rect::new(x, status_y, width, 1));
  }

  let hints_y = status_y + 1;
  if hints_y < area.height {
    let hints_text = hint_text(&config.keybinds);
    let hints = Paragraph::new(truncate_text(&hints_text, width as usize)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(hints, Rect::new(x, hints_y, width, 1));
  }
}

/// Key hints: navigation first, then every configured action key.
pub fn hint_text(keys: &Keybinds) -> String {
  let actions = [
    (keys.new_folder, "folder"),
    (keys.new_file, "file"),
    (keys.rename, "rename"),
    (keys.delete, "delete"),
    (keys.view_markdown, "view md"),
    (keys.refresh, "refresh"),
    (keys.quit, "quit"),
  ];
  let action_hints: Vec<String> = actions.iter().map(|(key, label)| format!("{} {}", key, label)).collect();

  format!("↑/↓ navigate • Enter open • → browse • ← back • Tab focus • h help • {}", action_hints.join(" • "))
}

/// Maps a key to a navigation event.
/// Right arrow browses from the left panel and activates from the right one.
pub fn navigation_event(key: &KeyEvent, focus: Focus) -> Option<NavEvent> {
  match key.code {
    KeyCode::Up => Some(NavEvent::MoveUp),
    KeyCode::Down => Some(NavEvent::MoveDown),
    KeyCode::Enter | KeyCode::Char(' ') => Some(NavEvent::Enter),
    KeyCode::Right if focus == Focus::Left => Some(NavEvent::SwitchFocus),
    KeyCode::Right => Some(NavEvent::Enter),
    KeyCode::Tab => Some(NavEvent::SwitchFocus),
    KeyCode::Left | KeyCode::Backspace => Some(NavEvent::GoBack),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::opener::OpenStrategies;
  use crate::types::{Prompt, PromptKind};
  use crossterm::event::KeyModifiers;
  use ratatui::{backend::TestBackend, Terminal};
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_navigation_keys() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

    assert_eq!(navigation_event(&key(KeyCode::Down), Focus::Left), Some(NavEvent::MoveDown));
    assert_eq!(navigation_event(&key(KeyCode::Char(' ')), Focus::Left), Some(NavEvent::Enter));
    assert_eq!(navigation_event(&key(KeyCode::Right), Focus::Left), Some(NavEvent::SwitchFocus));
    assert_eq!(navigation_event(&key(KeyCode::Right), Focus::Right), Some(NavEvent::Enter));
    assert_eq!(navigation_event(&key(KeyCode::Backspace), Focus::Right), Some(NavEvent::GoBack));
    assert_eq!(navigation_event(&key(KeyCode::Char('x')), Focus::Left), None);
  }

  #[test]
  fn test_hints_follow_keybinds() {
    let mut keys = Keybinds::default();
    let hints = hint_text(&keys);
    for expected in ["f folder", "n file", "e rename", "d delete", "m view md", "r refresh", "q quit"] {
      assert!(hints.contains(expected), "missing '{}' in {}", expected, hints);
    }

    keys.delete = 'x';
    assert!(hint_text(&keys).contains("x delete"));
  }

  #[test]
  fn test_render_survives_any_size() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("a folder with a rather long name")).unwrap();
    fs::write(temp_dir.path().join("note.md"), "# note\nbody").unwrap();

    let navigator = Navigator::new(temp_dir.path(), OpenStrategies::default(), 5).unwrap();
    let config = Config::default();
    let prompt = Mode::Prompt(Prompt {
      kind: PromptKind::NewFile(temp_dir.path().to_path_buf()),
      input: "draft.md".to_string(),
    });

    for (width, height) in [(1, 1), (2, 2), (7, 3), (40, 12), (120, 40)] {
      for mode in [Mode::Normal, Mode::Help, prompt.clone()] {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let view = ViewState {
          mode: &mode,
          status_message: "Error: something went wrong",
        };
        terminal.draw(|frame| render_app(frame, &navigator, &config, &view)).unwrap();
      }
    }
  }
}
