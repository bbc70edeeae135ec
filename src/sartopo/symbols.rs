//! Marker symbol definitions loaded from the marker CSV.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;

/// Fixed marker identifying a marker-definition file; the first line must
/// contain it.
pub const FILE_MAGIC: &str = "sartopo_address marker file";

/// Symbol code used when a display name has no definition.
pub const DEFAULT_SYMBOL: &str = "point";

#[derive(Debug, Clone)]
pub struct SymbolDef {
  pub name: String,
  pub icon_file: String,
  pub code: String,
  pub folder: String,
}

/// Static name-to-code table for marker symbols.
///
/// Rows are `displayName, iconFile, symbolCode, folderName`; lines starting
/// with `#` are comments.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
  defs: Vec<SymbolDef>,
}

impl SymbolTable {
  pub fn load(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read marker file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Bad marker file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let first_line = contents.lines().next().unwrap_or("");
    if !first_line.contains(FILE_MAGIC) {
      return Err(eyre!(
        "first line does not identify a {} file",
        FILE_MAGIC
      ));
    }

    let body = &contents[first_line.len()..];
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(false)
      .comment(Some(b'#'))
      .flexible(true)
      .trim(csv::Trim::All)
      .from_reader(body.as_bytes());

    let mut defs = Vec::new();
    for record in reader.records() {
      let record = record.map_err(|e| eyre!("bad row: {}", e))?;
      if record.len() < 4 {
        continue;
      }
      defs.push(SymbolDef {
        name: record[0].to_string(),
        icon_file: record[1].to_string(),
        code: record[2].to_string(),
        folder: record[3].to_string(),
      });
    }

    Ok(Self { defs })
  }

  /// Resolve a display name to its symbol code, defaulting to a generic
  /// point symbol for unrecognized names.
  pub fn code_for(&self, name: &str) -> &str {
    self
      .defs
      .iter()
      .find(|d| d.name == name)
      .map_or(DEFAULT_SYMBOL, |d| d.code.as_str())
  }

  /// Default folder name a symbol files into, if it has a definition.
  pub fn folder_for(&self, name: &str) -> Option<&str> {
    self
      .defs
      .iter()
      .find(|d| d.name == name)
      .map(|d| d.folder.as_str())
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.defs.iter().map(|d| d.name.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.defs.is_empty()
  }

  pub fn len(&self) -> usize {
    self.defs.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
# sartopo_address marker file v1
# name, icon, code, folder
Clue,clue.png,clue,Clues
Helicopter Landing Zone,lz.png,heliport,Logistics
Vehicle,car.png,car,Logistics
";

  #[test]
  fn test_parse_skips_comments_and_magic() {
    let table = SymbolTable::parse(SAMPLE).unwrap();
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn test_code_lookup() {
    let table = SymbolTable::parse(SAMPLE).unwrap();
    assert_eq!(table.code_for("Helicopter Landing Zone"), "heliport");
  }

  #[test]
  fn test_unknown_name_defaults_to_point() {
    let table = SymbolTable::parse(SAMPLE).unwrap();
    assert_eq!(table.code_for("Submarine"), DEFAULT_SYMBOL);
  }

  #[test]
  fn test_folder_lookup() {
    let table = SymbolTable::parse(SAMPLE).unwrap();
    assert_eq!(table.folder_for("Clue"), Some("Clues"));
    assert_eq!(table.folder_for("Submarine"), None);
  }

  #[test]
  fn test_missing_magic_is_rejected() {
    let err = SymbolTable::parse("Clue,clue.png,clue,Clues\n");
    assert!(err.is_err());
  }

  #[test]
  fn test_short_rows_are_skipped() {
    let table =
      SymbolTable::parse("# sartopo_address marker file\nClue,clue.png\nVehicle,car.png,car,Log\n")
        .unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.code_for("Vehicle"), "car");
  }
}
