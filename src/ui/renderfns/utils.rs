use ratatui::prelude::Color;

/// Spinner glyphs, advanced one per spinner event
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for an incident or alert status
pub fn status_color(status: &str) -> Color {
  match status.to_ascii_lowercase().as_str() {
    "resolved" | "closed" => Color::Green,
    "acknowledged" => Color::Yellow,
    "triggered" | "open" | "firing" => Color::Red,
    _ => Color::White,
  }
}

pub fn severity_color(severity: &str) -> Color {
  match severity.to_ascii_lowercase().as_str() {
    "critical" => Color::Magenta,
    "high" => Color::Red,
    "medium" => Color::Yellow,
    "low" => Color::Blue,
    _ => Color::White,
  }
}

pub fn spinner_glyph(frame: usize) -> char {
  SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ünïcödé text", 7), "ünïc...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color("resolved"), Color::Green);
    assert_eq!(status_color("Acknowledged"), Color::Yellow);
    assert_eq!(status_color("triggered"), Color::Red);
    assert_eq!(status_color("snoozed"), Color::White);
  }

  #[test]
  fn test_severity_color() {
    assert_eq!(severity_color("critical"), Color::Magenta);
    assert_eq!(severity_color("LOW"), Color::Blue);
  }

  #[test]
  fn test_spinner_wraps() {
    assert_eq!(spinner_glyph(0), spinner_glyph(SPINNER_FRAMES.len()));
  }
}
