use crate::file_utils::extension_of;
use crate::navigation::{PanelState, Preview, RightPanel};
use crate::types::Item;
use ratatui::{
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
  Frame,
};
use std::path::Path;

/// Columns lost to the border and padding inside a panel.
const ROW_PADDING: u16 = 4;

const FOLDER_ICON: &str = " \u{f07b} ";
const IMAGE_ICON: &str = " \u{f02e9} ";
const MARKDOWN_ICON: &str = " \u{f48a} ";
const TEXT_ICON: &str = " \u{f15c} ";
const PDF_ICON: &str = " \u{f1c1} ";
const DEFAULT_ICON: &str = " \u{f15b} ";

/// Where the two panel boxes sit on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
  pub left: Rect,
  pub right: Rect,
}

impl PanelGeometry {
  /// Item rows that fit inside a box (height minus the two border rows).
  pub fn visible_rows(&self) -> usize {
    self.left.height.saturating_sub(2) as usize
  }

  /// Characters available for a row of text.
  pub fn text_width(&self) -> usize {
    self.left.width.saturating_sub(ROW_PADDING) as usize
  }
}

/// Lays out two equal boxes with a sixth of the screen as margin on every side.
/// Boxes are never smaller than 2x2, even when the terminal is.
pub fn panel_geometry(rows: u16, cols: u16) -> PanelGeometry {
  let margin_h = rows / 6;
  let margin_w = cols / 6;
  let box_h = rows.saturating_sub(2 * margin_h).max(2);
  let box_w = (cols.saturating_sub(2 * margin_w) / 2).max(2);

  PanelGeometry {
    left: Rect::new(margin_w, margin_h, box_w, box_h),
    right: Rect::new(margin_w.saturating_add(box_w), margin_h, box_w, box_h),
  }
}

/// Icon for a file name, by extension (case-insensitive).
pub fn file_icon(name: &str) -> &'static str {
  match extension_of(name).as_deref() {
    Some("png" | "jpg" | "jpeg" | "gif") => IMAGE_ICON,
    Some("md") => MARKDOWN_ICON,
    Some("txt") => TEXT_ICON,
    Some("pdf") => PDF_ICON,
    _ => DEFAULT_ICON,
  }
}

pub fn item_icon(item: &Item) -> &'static str {
  match item {
    Item::Folder(_) => FOLDER_ICON,
    Item::File(name) => file_icon(name),
  }
}

/// Cuts text to `max_width` characters, ending in `...` when something was dropped.
pub fn truncate_text(text: &str, max_width: usize) -> String {
  if text.chars().count() <= max_width {
    return text.to_string();
  }
  if max_width < 3 {
    return text.chars().take(max_width).collect();
  }
  let mut truncated: String = text.chars().take(max_width - 3).collect();
  truncated.push_str("...");
  truncated
}

/// One projected row of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
  pub text: String,
  pub highlighted: bool,
}

/// Projects the visible window of a panel into display rows.
pub fn panel_rows(panel: &PanelState, rows: usize, text_width: usize, show_selection: bool) -> Vec<RowView> {
  panel
    .items()
    .iter()
    .enumerate()
    .skip(panel.scroll())
    .take(rows)
    .map(|(index, item)| RowView {
      text: truncate_text(&format!("{}{} ", item_icon(item), item.name()), text_width),
      highlighted: show_selection && index == panel.selected(),
    })
    .collect()
}

/// Rows for the passive preview.
pub fn preview_rows(preview: &Preview, rows: usize, text_width: usize) -> Vec<RowView> {
  let plain = |text: String| RowView { text, highlighted: false };

  match preview {
    Preview::Empty => Vec::new(),
    Preview::Folder { children, .. } => children.iter().take(rows).map(|name| plain(truncate_text(&format!("{}{} ", file_icon(name), name), text_width))).collect(),
    Preview::Text { lines, .. } => lines.iter().take(rows).map(|line| plain(truncate_text(line, text_width))).collect(),
    Preview::Binary { .. } => vec![plain(truncate_text("(binary file)", text_width))],
  }
}

/// Path label relative to the root, which shows as `~`.
pub fn path_label(root: &Path, dir: &Path) -> String {
  match dir.strip_prefix(root) {
    Ok(relative) if relative.as_os_str().is_empty() => "~".to_string(),
    Ok(relative) => format!("~/{}", relative.display()),
    Err(_) => dir.display().to_string(),
  }
}

/// Title for the right panel.
pub fn right_title(root: &Path, right: &RightPanel) -> String {
  let name_of = |path: &Path| path.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default();

  match right {
    RightPanel::Browse(panel) => path_label(root, panel.directory()),
    RightPanel::Preview(Preview::Empty) => String::new(),
    RightPanel::Preview(Preview::Folder { path, .. } | Preview::Text { path, .. } | Preview::Binary { path }) => name_of(path),
  }
}

/// Part of `rect` inside `bounds`; zero-sized when they don't overlap.
pub fn clip(rect: Rect, bounds: Rect) -> Rect {
  let x = rect.x.max(bounds.x);
  let y = rect.y.max(bounds.y);
  let right = rect.right().min(bounds.right());
  let bottom = rect.bottom().min(bounds.bottom());
  Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
}

/// Draws one panel box with its rows.
/// The box is clipped to the frame so tiny terminals never draw out of bounds.
pub fn render_panel(frame: &mut Frame, area: Rect, title: &str, rows: &[RowView], focused: bool) {
  let area = clip(area, frame.size());
  if area.width == 0 || area.height == 0 {
    return;
  }

  let border_style = if focused { Style::default().fg(Color::White) } else { Style::default().fg(Color::DarkGray) };
  let title = truncate_text(title, area.width.saturating_sub(2) as usize);
  let block = Block::default().borders(Borders::ALL).border_style(border_style).title(title);

  let inner = block.inner(area);
  frame.render_widget(block, area);
  if inner.width == 0 || inner.height == 0 {
    return;
  }

  // one column of padding inside the border
  let text_area = Rect {
    x: inner.x + 1,
    width: inner.width.saturating_sub(1),
    ..inner
  };

  let lines: Vec<Line> = rows
    .iter()
    .map(|row| {
      let style = match (row.highlighted, focused) {
        (true, true) => Style::default().add_modifier(Modifier::REVERSED),
        (true, false) => Style::default().add_modifier(Modifier::REVERSED | Modifier::DIM),
        (false, _) => Style::default(),
      };
      Line::from(Span::styled(row.text.clone(), style))
    })
    .collect();

  frame.render_widget(Paragraph::new(lines), text_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn test_geometry_margins() {
    let geometry = panel_geometry(24, 90);

    assert_eq!(geometry.left, Rect::new(15, 4, 30, 16));
    assert_eq!(geometry.right, Rect::new(45, 4, 30, 16));
    assert_eq!(geometry.visible_rows(), 14);
    assert_eq!(geometry.text_width(), 26);
  }

  #[test]
  fn test_geometry_never_below_two() {
    for (rows, cols) in [(0, 0), (1, 1), (2, 3), (5, 4)] {
      let geometry = panel_geometry(rows, cols);
      assert!(geometry.left.height >= 2 && geometry.left.width >= 2);
      assert_eq!(geometry.left.height, geometry.right.height);
      assert_eq!(geometry.left.width, geometry.right.width);
    }
    assert_eq!(panel_geometry(1, 1).visible_rows(), 0);
  }

  #[test]
  fn test_clip() {
    let frame = Rect::new(0, 0, 1, 1);
    assert_eq!(clip(Rect::new(0, 0, 2, 2), frame), Rect::new(0, 0, 1, 1));
    assert_eq!(clip(Rect::new(2, 0, 2, 2), frame).width, 0);
  }

  #[test]
  fn test_icons_by_extension() {
    assert_eq!(file_icon("cat.PNG"), IMAGE_ICON);
    assert_eq!(file_icon("notes.md"), MARKDOWN_ICON);
    assert_eq!(file_icon("todo.txt"), TEXT_ICON);
    assert_eq!(file_icon("paper.Pdf"), PDF_ICON);
    assert_eq!(file_icon("main.rs"), DEFAULT_ICON);
    assert_eq!(file_icon("Makefile"), DEFAULT_ICON);
    assert_eq!(item_icon(&Item::Folder("notes.md".to_string())), FOLDER_ICON);
  }

  #[test]
  fn test_truncate_text() {
    assert_eq!(truncate_text("short", 10), "short");
    assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
    assert_eq!(truncate_text("a much longer name", 10), "a much ...");
    assert_eq!(truncate_text("abcdef", 2), "ab");
    assert_eq!(truncate_text("abcdef", 0), "");
  }

  #[test]
  fn test_panel_rows_window_and_highlight() {
    let items = (0..6).map(|i| Item::File(format!("file{}.txt", i))).collect();
    let mut panel = PanelState::new(PathBuf::from("/n"), items);
    for _ in 0..4 {
      panel.move_down(3);
    }

    let rows = panel_rows(&panel, 3, 40, true);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].text.ends_with("file2.txt "));
    assert!(rows[2].highlighted);
    assert!(!rows[0].highlighted && !rows[1].highlighted);

    let unfocused = panel_rows(&panel, 3, 40, false);
    assert!(unfocused.iter().all(|row| !row.highlighted));
  }

  #[test]
  fn test_preview_rows() {
    let preview = Preview::Text {
      path: PathBuf::from("/n/a.md"),
      lines: vec!["# a".to_string(), "a fairly long line of text".to_string(), "third".to_string()],
    };
    let rows = preview_rows(&preview, 2, 10);
    assert_eq!(rows.iter().map(|row| row.text.as_str()).collect::<Vec<_>>(), vec!["# a", "a fairl..."]);

    assert!(preview_rows(&Preview::Empty, 5, 10).is_empty());
  }

  #[test]
  fn test_path_label() {
    let root = Path::new("/home/ada/notes");
    assert_eq!(path_label(root, root), "~");
    assert_eq!(path_label(root, &root.join("docs").join("drafts")), "~/docs/drafts");
    assert_eq!(path_label(root, Path::new("/elsewhere")), "/elsewhere");
  }
}
