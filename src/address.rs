//! In-memory address lookup table built from the county address CSV.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AddressEntry {
  pub text: String,
  pub lat: f64,
  pub lon: f64,
}

/// Lookup table over `address, latitude, longitude` rows.
///
/// Besides the literal rows, one pseudo-entry per unique "street and city"
/// is synthesized so a bare street name resolves to the coordinates of the
/// first row seen for that street. That is a known approximation, not a
/// precise geocode.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
  entries: Vec<AddressEntry>,
}

impl AddressTable {
  pub fn load(path: &Path) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .trim(csv::Trim::All)
      .from_path(path)
      .map_err(|e| eyre!("Failed to read address file {}: {}", path.display(), e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record.map_err(|e| eyre!("Bad address row: {}", e))?;
      if record.len() < 3 {
        continue;
      }
      let lat: f64 = record[1]
        .parse()
        .map_err(|e| eyre!("Bad latitude {:?}: {}", &record[1], e))?;
      let lon: f64 = record[2]
        .parse()
        .map_err(|e| eyre!("Bad longitude {:?}: {}", &record[2], e))?;
      rows.push(AddressEntry {
        text: record[0].to_string(),
        lat,
        lon,
      });
    }

    info!("finished reading {} addresses from {}", rows.len(), path.display());
    Ok(Self::from_rows(rows))
  }

  /// Build the table from raw rows: synthesize street entries, then sort
  /// ascending by address text.
  pub fn from_rows(rows: Vec<AddressEntry>) -> Self {
    let mut entries = rows;

    let mut seen_streets: HashSet<String> = HashSet::new();
    let mut synthesized = Vec::new();
    for entry in &entries {
      if let Some(street) = street_of(&entry.text) {
        // First-encountered row wins, not the numerically lowest number.
        if seen_streets.insert(street.clone()) {
          synthesized.push(AddressEntry {
            text: street,
            lat: entry.lat,
            lon: entry.lon,
          });
        }
      }
    }
    entries.extend(synthesized);

    entries.sort_by(|a, b| a.text.cmp(&b.text));
    Self { entries }
  }

  /// Case-insensitive exact match; no fuzzy or prefix matching here.
  pub fn lookup(&self, text: &str) -> Option<(f64, f64)> {
    let wanted = text.to_lowercase();
    self
      .entries
      .iter()
      .find(|e| e.text.to_lowercase() == wanted)
      .map(|e| (e.lat, e.lon))
  }

  /// Case-insensitive prefix matches for the incremental-typing
  /// autocomplete in the address field.
  pub fn completions<'a>(&'a self, prefix: &str) -> Vec<&'a str> {
    if prefix.is_empty() {
      return Vec::new();
    }
    let prefix = prefix.to_lowercase();
    self
      .entries
      .iter()
      .filter(|e| e.text.to_lowercase().starts_with(&prefix))
      .map(|e| e.text.as_str())
      .collect()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Strip the leading house-number token, yielding the "street and city"
/// key. `None` when the text does not start with a number.
fn street_of(text: &str) -> Option<String> {
  let mut tokens = text.split_whitespace();
  let first = tokens.next()?;
  if !first.chars().next()?.is_ascii_digit() {
    return None;
  }
  let rest = tokens.collect::<Vec<_>>().join(" ");
  if rest.is_empty() {
    None
  } else {
    Some(rest)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(text: &str, lat: f64, lon: f64) -> AddressEntry {
    AddressEntry {
      text: text.to_string(),
      lat,
      lon,
    }
  }

  fn sample_table() -> AddressTable {
    AddressTable::from_rows(vec![
      entry("301 Redbud Way", 39.0, -120.0),
      entry("322 Sacramento Street", 38.0, -121.0),
      entry("123 Joe Place", 32.0, -122.0),
      entry("1262 Redbud Lane", 37.0, -123.0),
    ])
  }

  #[test]
  fn test_lookup_exact_case_insensitive() {
    let table = sample_table();
    assert_eq!(table.lookup("301 Redbud Way"), Some((39.0, -120.0)));
    assert_eq!(table.lookup("301 redbud way"), Some((39.0, -120.0)));
  }

  #[test]
  fn test_lookup_no_match() {
    let table = sample_table();
    assert_eq!(table.lookup("999 Nowhere Road"), None);
    // Prefixes are not matches.
    assert_eq!(table.lookup("301 Redbud"), None);
  }

  #[test]
  fn test_street_entries_synthesized() {
    let table = sample_table();
    assert_eq!(table.lookup("Redbud Way"), Some((39.0, -120.0)));
    assert_eq!(table.lookup("Sacramento Street"), Some((38.0, -121.0)));
  }

  #[test]
  fn test_street_entry_uses_first_row_encountered() {
    // 900 comes first in the file even though 100 is numerically lower.
    let table = AddressTable::from_rows(vec![
      entry("900 Oak Court", 39.9, -120.9),
      entry("100 Oak Court", 39.1, -120.1),
    ]);
    assert_eq!(table.lookup("Oak Court"), Some((39.9, -120.9)));
  }

  #[test]
  fn test_rows_without_house_number_get_no_street_entry() {
    let table = AddressTable::from_rows(vec![entry("Rough And Ready Highway", 39.2, -121.1)]);
    // Just the literal row, nothing synthesized from it.
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn test_sorted_by_address_text() {
    let table = sample_table();
    let texts: Vec<_> = table.entries.iter().map(|e| e.text.as_str()).collect();
    let mut sorted = texts.clone();
    sorted.sort();
    assert_eq!(texts, sorted);
  }

  #[test]
  fn test_completions_prefix_case_insensitive() {
    let table = sample_table();
    let hits = table.completions("redbud");
    assert_eq!(hits, vec!["Redbud Lane", "Redbud Way"]);
    assert!(table.completions("").is_empty());
  }
}
