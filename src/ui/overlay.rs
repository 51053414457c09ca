use crate::config::Keybinds;
use crate::types::Prompt;
use ratatui::{
  layout::Rect,
  style::{Color, Style},
  text::Line,
  widgets::{Block, Borders, Clear, Paragraph},
  Frame,
};

/// Rect of the given size centered in `area`, shrunk to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  let x = area.x + (area.width - width) / 2;
  let y = area.y + (area.height - height) / 2;
  Rect::new(x, y, width, height)
}

/// Draws the text entry box: three rows high, half the screen wide.
pub fn render_prompt(frame: &mut Frame, prompt: &Prompt) {
  let area = frame.size();
  let box_area = centered_rect(area.width / 2, 3, area);
  if box_area.width < 2 || box_area.height < 2 {
    return;
  }

  let block = Block::default().borders(Borders::ALL).title(format!(" {} ", prompt.kind.title())).style(Style::default().fg(Color::White));
  let paragraph = Paragraph::new(format!(" > {}", prompt.input)).block(block);

  frame.render_widget(Clear, box_area);
  frame.render_widget(paragraph, box_area);
}

/// Lines of the keybind reference.
pub fn keybind_lines(keybinds: &Keybinds) -> Vec<String> {
  keybinds.entries().iter().map(|(name, key, _)| format!("{}: {}", name, key)).collect()
}

/// Draws the keybind reference box; any key closes it.
pub fn render_help(frame: &mut Frame, keybinds: &Keybinds) {
  let lines = keybind_lines(keybinds);
  let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0) + 8;
  let height = lines.len() + 4;

  let area = frame.size();
  let box_area = centered_rect(width as u16, height as u16, area);
  if box_area.width < 2 || box_area.height < 2 {
    return;
  }

  // blank row under the title, like the prompt's padding
  let mut content = vec![Line::from("")];
  content.extend(lines.into_iter().map(|line| Line::from(format!(" {}", line))));

  let block = Block::default().borders(Borders::ALL).title(" Keybinds ").style(Style::default().fg(Color::White));

  frame.render_widget(Clear, box_area);
  frame.render_widget(Paragraph::new(content).block(block), box_area);
}
