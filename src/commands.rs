//! `:` commands, their aliases and completion.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Incidents,
  Alerts,
  Refresh,
  Logs,
  Quit,
}

impl Command {
  pub const ALL: [Command; 5] = [
    Command::Incidents,
    Command::Alerts,
    Command::Refresh,
    Command::Logs,
    Command::Quit,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Command::Incidents => "incidents",
      Command::Alerts => "alerts",
      Command::Refresh => "refresh",
      Command::Logs => "logs",
      Command::Quit => "quit",
    }
  }

  pub fn aliases(self) -> &'static [&'static str] {
    match self {
      Command::Incidents => &["i", "inc"],
      Command::Alerts => &["a"],
      Command::Refresh => &["r", "reload"],
      Command::Logs => &["l", "log"],
      Command::Quit => &["q", "exit"],
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      Command::Incidents => "Browse incidents",
      Command::Alerts => "Browse alerts",
      Command::Refresh => "Clear the cache and reload page 1",
      Command::Logs => "Toggle the log panel",
      Command::Quit => "Exit inctui",
    }
  }

  fn spellings(self) -> impl Iterator<Item = &'static str> {
    std::iter::once(self.name()).chain(self.aliases().iter().copied())
  }

  /// Look up a fully typed name or alias.
  pub fn parse(input: &str) -> Option<Command> {
    let input = input.trim().to_lowercase();
    Command::ALL
      .into_iter()
      .find(|cmd| cmd.spellings().any(|s| s == input))
  }
}

impl fmt::Display for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Commands that `input` could complete to.
///
/// An exact name or alias comes first, then prefix matches in table order.
/// Empty input lists everything.
pub fn complete(input: &str) -> Vec<Command> {
  let input = input.trim().to_lowercase();
  let exact = Command::parse(&input);

  let mut matches: Vec<Command> = exact.into_iter().collect();
  matches.extend(
    Command::ALL
      .into_iter()
      .filter(|cmd| Some(*cmd) != exact)
      .filter(|cmd| cmd.spellings().any(|s| s.starts_with(&input))),
  );
  matches
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_names_and_aliases() {
    assert_eq!(Command::parse("alerts"), Some(Command::Alerts));
    assert_eq!(Command::parse("inc"), Some(Command::Incidents));
    assert_eq!(Command::parse(" Reload "), Some(Command::Refresh));
    assert_eq!(Command::parse("exit"), Some(Command::Quit));
    assert_eq!(Command::parse("ale"), None);
  }

  #[test]
  fn test_every_spelling_is_unique() {
    let mut seen = std::collections::HashSet::new();
    for cmd in Command::ALL {
      for spelling in cmd.spellings() {
        assert!(seen.insert(spelling), "{} used twice", spelling);
      }
    }
  }

  #[test]
  fn test_empty_input_lists_all_in_order() {
    assert_eq!(complete(""), Command::ALL.to_vec());
  }

  #[test]
  fn test_alias_outranks_prefix() {
    // "l" is the logs alias, and nothing else starts with it
    assert_eq!(complete("l"), vec![Command::Logs]);
    // "r" is an exact alias for refresh
    assert_eq!(complete("r")[0], Command::Refresh);
  }

  #[test]
  fn test_prefix_completion() {
    assert_eq!(complete("al"), vec![Command::Alerts]);
    assert_eq!(complete("re"), vec![Command::Refresh]);
    assert_eq!(complete("i"), vec![Command::Incidents]);
  }

  #[test]
  fn test_unknown_input_completes_to_nothing() {
    assert!(complete("cide").is_empty());
    assert!(complete("zzz").is_empty());
  }
}
