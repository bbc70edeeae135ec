//! Serde-deserializable types matching the SARTopo API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::Value;

use super::types::{Feature, FeatureProperties};

// ============================================================================
// Since endpoint: GET /api/v1/map/{map}/since/{millis}
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiSinceResponse {
  #[serde(default)]
  pub result: ApiSinceResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSinceResult {
  #[serde(default)]
  pub state: ApiMapState,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiMapState {
  #[serde(default)]
  pub features: Vec<ApiFeature>,
}

/// One feature as returned by the map. Ids come back as strings on current
/// servers and as numbers on old ones, so we take a raw value.
#[derive(Debug, Deserialize)]
pub struct ApiFeature {
  pub id: Option<Value>,
  #[serde(default)]
  pub properties: FeatureProperties,
}

impl ApiFeature {
  /// Convert into a domain feature; `None` when the id is missing or not a
  /// scalar (a malformed entry the caller logs and skips).
  pub fn into_feature(self) -> Option<Feature> {
    let id = id_to_string(self.id.as_ref()?)?;
    Some(Feature {
      id,
      properties: self.properties,
    })
  }
}

// ============================================================================
// Folder / Marker creation responses
// ============================================================================

/// Creation responses either carry the id at the top level or wrap the new
/// feature under `result`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiIdResponse {
  pub id: Option<Value>,
  pub result: Option<ApiIdInner>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIdInner {
  pub id: Option<Value>,
}

impl ApiIdResponse {
  pub fn extract_id(&self) -> Option<String> {
    self
      .id
      .as_ref()
      .or_else(|| self.result.as_ref().and_then(|r| r.id.as_ref()))
      .and_then(id_to_string)
  }
}

fn id_to_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_since_response_parses_features() {
    let body = r#"{
      "result": {
        "state": {
          "features": [
            {"id": "f1", "properties": {"title": "Trails", "class": "Folder"}},
            {"id": 42, "properties": {"title": "IC", "class": "Marker", "folderId": "f1"}}
          ]
        }
      }
    }"#;

    let resp: ApiSinceResponse = serde_json::from_str(body).unwrap();
    let features: Vec<_> = resp
      .result
      .state
      .features
      .into_iter()
      .filter_map(ApiFeature::into_feature)
      .collect();

    assert_eq!(features.len(), 2);
    assert_eq!(features[0].id, "f1");
    assert_eq!(features[1].id, "42");
    assert_eq!(features[1].folder_id(), Some("f1"));
  }

  #[test]
  fn test_feature_without_id_is_skipped() {
    let body = r#"{"properties": {"title": "orphan"}}"#;
    let feature: ApiFeature = serde_json::from_str(body).unwrap();
    assert!(feature.into_feature().is_none());
  }

  #[test]
  fn test_id_response_top_level_and_wrapped() {
    let top: ApiIdResponse = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
    assert_eq!(top.extract_id(), Some("abc".to_string()));

    let wrapped: ApiIdResponse =
      serde_json::from_str(r#"{"result": {"id": 7}}"#).unwrap();
    assert_eq!(wrapped.extract_id(), Some("7".to_string()));

    let empty: ApiIdResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
    assert_eq!(empty.extract_id(), None);
  }
}
