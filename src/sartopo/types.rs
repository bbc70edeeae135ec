use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature classes the map exposes that we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureClass {
  Folder,
  Marker,
}

impl FeatureClass {
  /// Wire name as it appears in feature properties and endpoint paths.
  pub fn as_str(&self) -> &'static str {
    match self {
      FeatureClass::Folder => "Folder",
      FeatureClass::Marker => "Marker",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "Folder" => Some(FeatureClass::Folder),
      "Marker" => Some(FeatureClass::Marker),
      _ => None,
    }
  }
}

impl std::fmt::Display for FeatureClass {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Property bag carried by every map feature. Keys we don't model are kept
/// in `extra` so edits can round-trip them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
  #[serde(default)]
  pub title: String,
  #[serde(rename = "class", default)]
  pub class: Option<String>,
  #[serde(rename = "folderId", default, skip_serializing_if = "Option::is_none")]
  pub folder_id: Option<String>,
  #[serde(
    rename = "marker-symbol",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub marker_symbol: Option<String>,
  #[serde(
    rename = "marker-color",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub marker_color: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, serde_json::Value>,
}

/// A remote map object (Folder or Marker) with an id and property bag.
///
/// Features are created remotely, fetched via poll, and cached locally until
/// process exit; we never delete them from the cache even if they disappear
/// from the map.
#[derive(Debug, Clone)]
pub struct Feature {
  pub id: String,
  pub properties: FeatureProperties,
}

impl Feature {
  pub fn title(&self) -> &str {
    &self.properties.title
  }

  pub fn folder_id(&self) -> Option<&str> {
    self.properties.folder_id.as_deref()
  }

  pub fn class(&self) -> Option<FeatureClass> {
    self.properties.class.as_deref().and_then(FeatureClass::parse)
  }
}

/// Everything a marker submission needs. `existing_id` switches the post
/// from creation to update-in-place.
#[derive(Debug, Clone)]
pub struct MarkerSpec {
  pub label: String,
  pub description: Option<String>,
  pub lat: f64,
  pub lon: f64,
  pub color: String,
  pub symbol: String,
  pub existing_id: Option<String>,
  pub folder_id: Option<String>,
}
