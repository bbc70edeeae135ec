use color_eyre::{eyre::eyre, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Section header our keys live under in the rc file. Other sections are
/// ignored so the file can be shared with sibling tools.
const SECTION: &str = "sartopo_address";

const RC_FILE_NAME: &str = "sartopo_address.rc";

/// Persisted settings: window geometry, file paths, and account name,
/// stored as `key=value` lines under a `[sartopo_address]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub cols: u16,
  pub rows: u16,
  pub address_file: Option<PathBuf>,
  pub marker_file: Option<PathBuf>,
  pub account_name: Option<String>,
  pub map_url: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      cols: 100,
      rows: 30,
      address_file: None,
      marker_file: None,
      account_name: None,
      map_url: None,
    }
  }
}

impl Settings {
  /// Load settings from the rc file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sartopo_address.rc (current directory)
  /// 3. $XDG_CONFIG_HOME/sartopo-address/sartopo_address.rc
  ///
  /// A missing or malformed file falls back to defaults; the returned
  /// warning is shown to the user and execution continues.
  pub fn load(explicit_path: Option<&Path>) -> (Self, Option<String>) {
    let path = match explicit_path {
      Some(p) => {
        if p.exists() {
          Some(p.to_path_buf())
        } else {
          return (
            Self::default(),
            Some(format!(
              "Settings file {} not found; using defaults.",
              p.display()
            )),
          );
        }
      }
      None => Self::find_rc_file(),
    };

    let path = match path {
      Some(p) => p,
      None => return (Self::default(), None),
    };

    match std::fs::read_to_string(&path) {
      Ok(contents) => Self::parse(&contents, &path.display().to_string()),
      Err(e) => (
        Self::default(),
        Some(format!(
          "Could not read settings file {}: {}; using defaults.",
          path.display(),
          e
        )),
      ),
    }
  }

  fn find_rc_file() -> Option<PathBuf> {
    let local = PathBuf::from(RC_FILE_NAME);
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sartopo-address").join(RC_FILE_NAME);
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  /// Default location for saving when no rc file exists yet.
  pub fn default_rc_path() -> PathBuf {
    dirs::config_dir()
      .map(|d| d.join("sartopo-address").join(RC_FILE_NAME))
      .unwrap_or_else(|| PathBuf::from(RC_FILE_NAME))
  }

  /// Parse rc contents. Lines outside the `[sartopo_address]` section are
  /// ignored; lines inside it that are not `key=value` produce a warning
  /// but do not abort the load.
  fn parse(contents: &str, source: &str) -> (Self, Option<String>) {
    let mut settings = Self::default();
    let mut warning = None;
    let mut in_section = false;
    let mut saw_section = false;

    for line in contents.lines() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        continue;
      }
      if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
        in_section = name == SECTION;
        saw_section |= in_section;
        continue;
      }
      if !in_section {
        continue;
      }

      let Some((key, value)) = line.split_once('=') else {
        warning.get_or_insert_with(|| {
          format!("Malformed line in settings file {}: {:?}", source, line)
        });
        continue;
      };
      let (key, value) = (key.trim(), value.trim());

      match key {
        "cols" => {
          if let Ok(v) = value.parse() {
            settings.cols = v;
          }
        }
        "rows" => {
          if let Ok(v) = value.parse() {
            settings.rows = v;
          }
        }
        "address_file" => settings.address_file = Some(PathBuf::from(value)),
        "marker_file" => settings.marker_file = Some(PathBuf::from(value)),
        "account_name" => settings.account_name = Some(value.to_string()),
        "map_url" => settings.map_url = Some(value.to_string()),
        _ => {} // unknown keys are tolerated
      }
    }

    if !saw_section {
      return (
        Self::default(),
        Some(format!(
          "Settings file {} has no [{}] section; using defaults.",
          source, SECTION
        )),
      );
    }

    (settings, warning)
  }

  /// Write the settings back in the same rc format.
  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
      }
    }

    let mut out = String::new();
    let _ = writeln!(out, "[{}]", SECTION);
    let _ = writeln!(out, "cols={}", self.cols);
    let _ = writeln!(out, "rows={}", self.rows);
    if let Some(p) = &self.address_file {
      let _ = writeln!(out, "address_file={}", p.display());
    }
    if let Some(p) = &self.marker_file {
      let _ = writeln!(out, "marker_file={}", p.display());
    }
    if let Some(name) = &self.account_name {
      let _ = writeln!(out, "account_name={}", name);
    }
    if let Some(url) = &self.map_url {
      let _ = writeln!(out, "map_url={}", url);
    }

    std::fs::write(path, out)
      .map_err(|e| eyre!("Failed to write settings file {}: {}", path.display(), e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_basic_settings() {
    let contents = "\
[sartopo_address]
cols=120
rows=40
address_file=/data/addresses.csv
account_name=NCSSAR
map_url=sartopo.com/m/ABC1
";
    let (settings, warning) = Settings::parse(contents, "test.rc");
    assert!(warning.is_none());
    assert_eq!(settings.cols, 120);
    assert_eq!(settings.rows, 40);
    assert_eq!(
      settings.address_file,
      Some(PathBuf::from("/data/addresses.csv"))
    );
    assert_eq!(settings.account_name.as_deref(), Some("NCSSAR"));
    assert_eq!(settings.map_url.as_deref(), Some("sartopo.com/m/ABC1"));
  }

  #[test]
  fn test_other_sections_ignored() {
    let contents = "\
[other_tool]
cols=999
[sartopo_address]
cols=80
";
    let (settings, _) = Settings::parse(contents, "test.rc");
    assert_eq!(settings.cols, 80);
  }

  #[test]
  fn test_missing_section_falls_back_to_defaults() {
    let (settings, warning) = Settings::parse("cols=120\n", "test.rc");
    assert_eq!(settings, Settings::default());
    assert!(warning.is_some());
  }

  #[test]
  fn test_malformed_line_warns_but_continues() {
    let contents = "\
[sartopo_address]
this is not a key value pair
rows=25
";
    let (settings, warning) = Settings::parse(contents, "test.rc");
    assert!(warning.is_some());
    assert_eq!(settings.rows, 25);
  }

  #[test]
  fn test_comments_and_blanks_skipped() {
    let contents = "\
[sartopo_address]
# geometry
cols=90

; account
account_name=test
";
    let (settings, warning) = Settings::parse(contents, "test.rc");
    assert!(warning.is_none());
    assert_eq!(settings.cols, 90);
    assert_eq!(settings.account_name.as_deref(), Some("test"));
  }

  #[test]
  fn test_save_then_parse_round_trips() {
    let settings = Settings {
      cols: 111,
      rows: 33,
      address_file: Some(PathBuf::from("/tmp/addr.csv")),
      marker_file: None,
      account_name: Some("caver".to_string()),
      map_url: Some("sartopo.com/m/XY12".to_string()),
    };

    let dir = std::env::temp_dir().join("sartopo-address-test-rc");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(RC_FILE_NAME);
    settings.save(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let (parsed, warning) = Settings::parse(&contents, "roundtrip");
    assert!(warning.is_none());
    assert_eq!(parsed, settings);

    let _ = std::fs::remove_file(&path);
  }
}
