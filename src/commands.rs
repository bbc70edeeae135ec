/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "markers",
    aliases: &["m", "marker"],
    description: "Browse map markers",
  },
  Command {
    name: "folders",
    aliases: &["f", "folder"],
    description: "Browse map folders",
  },
  Command {
    name: "reload",
    aliases: &["r"],
    description: "Reload address and marker files",
  },
  Command {
    name: "connect",
    aliases: &["c", "url"],
    description: "Connect to a map URL",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit sartopo-address",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();
  let input_word = input_lower.split_whitespace().next().unwrap_or("");

  if input_word.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_word {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_word) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(input_word) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(input_word)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(input_word) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(input_word)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("markers");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "markers");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("f");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "folders");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("mar");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "markers");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("old");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "folders");
  }

  #[test]
  fn test_argument_does_not_break_matching() {
    let suggestions = get_suggestions("connect sartopo.com/m/ABC1");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "connect");
  }
}
