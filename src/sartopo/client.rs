use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use tracing::warn;
use url::Url;

use super::api_types::{ApiFeature, ApiIdResponse, ApiSinceResponse};
use super::types::{Feature, FeatureClass, MarkerSpec};

/// SARTopo API client wrapper.
///
/// Built from a map URL like `sartopo.com/m/ABC123` (scheme optional); the
/// host-and-port and the trailing map code are split out and everything is
/// posted under `/api/v1/map/{code}/`.
#[derive(Clone)]
pub struct SartopoClient {
  http: reqwest::Client,
  base: String,
  map_id: String,
}

impl SartopoClient {
  pub fn new(map_url: &str) -> Result<Self> {
    let (base, map_id) = parse_map_url(map_url)?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      map_id,
    })
  }

  pub fn map_id(&self) -> &str {
    &self.map_id
  }

  fn api_url(&self, tail: &str) -> String {
    format!("{}/api/v1/map/{}/{}", self.base, self.map_id, tail)
  }

  /// Plain GET of the map page, used at connect time to validate
  /// reachability before anything is posted.
  pub async fn probe(&self) -> Result<()> {
    let url = format!("{}/m/{}", self.base, self.map_id);
    self
      .http
      .get(&url)
      .send()
      .await
      .map_err(|e| eyre!("Could not communicate with {}: {}", url, e))?;
    Ok(())
  }

  /// Fetch features of one class changed since the given watermark.
  ///
  /// Transport failures are errors; an unparsable payload is logged and
  /// treated as an empty result so the caller's cache is left untouched.
  pub async fn get_features(
    &self,
    class: FeatureClass,
    since_millis: i64,
  ) -> Result<Vec<Feature>> {
    let url = self.api_url(&format!("since/{}", since_millis));

    let response = self
      .http
      .get(&url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch features since {}: {}", since_millis, e))?;

    let parsed: ApiSinceResponse = match response.json().await {
      Ok(p) => p,
      Err(e) => {
        warn!("unparsable since-response from {}: {}", url, e);
        return Ok(Vec::new());
      }
    };

    let features = parsed
      .result
      .state
      .features
      .into_iter()
      .filter_map(|f: ApiFeature| match f.into_feature() {
        Some(feature) => Some(feature),
        None => {
          warn!("skipping feature with missing id in since-response");
          None
        }
      })
      .filter(|f| f.class() == Some(class))
      .collect();

    Ok(features)
  }

  /// Create a folder, returning the new folder id.
  pub async fn add_folder(&self, name: &str) -> Result<String> {
    let body = json!({ "label": name, "id": null });

    let response = self
      .http
      .post(self.api_url("Folder/"))
      .form(&[("json", body.to_string())])
      .send()
      .await
      .map_err(|e| eyre!("Folder request failed: {}", e))?;

    let parsed: ApiIdResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Could not parse folder response: {}", e))?;

    parsed
      .extract_id()
      .ok_or_else(|| eyre!("No folder id was returned from the folder request"))
  }

  /// Create a marker, or update one in place when `existing_id` is set.
  pub async fn add_marker(&self, spec: &MarkerSpec) -> Result<()> {
    let body = json!({
      "label": spec.label,
      "folderId": spec.folder_id,
      "url": "",
      "comments": spec.description.as_deref().unwrap_or(""),
      "position": { "lat": spec.lat, "lng": spec.lon },
      "marker-symbol": spec.symbol,
      "marker-color": spec.color,
      "id": spec.existing_id,
    });

    let response = self
      .http
      .post(self.api_url("Marker/"))
      .form(&[("json", body.to_string())])
      .send()
      .await
      .map_err(|e| eyre!("Marker request failed: {}", e))?;

    if !response.status().is_success() {
      return Err(eyre!("Marker request returned {}", response.status()));
    }

    Ok(())
  }
}

/// Split a map URL into (scheme://host[:port], map code).
///
/// The map code is the last path segment; `http://` is assumed when no
/// scheme is given, matching how field laptops have the URL written down.
fn parse_map_url(raw: &str) -> Result<(String, String)> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(eyre!("Map URL is empty"));
  }

  let with_scheme = if raw.contains("://") {
    raw.to_string()
  } else {
    format!("http://{}", raw)
  };

  let url = Url::parse(&with_scheme).map_err(|e| eyre!("Bad map URL {}: {}", raw, e))?;

  let host = url
    .host_str()
    .ok_or_else(|| eyre!("Map URL {} has no host", raw))?;

  let base = match url.port() {
    Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
    None => format!("{}://{}", url.scheme(), host),
  };

  let map_id = url
    .path_segments()
    .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
    .map(str::to_string)
    .ok_or_else(|| eyre!("Map URL {} has no map code", raw))?;

  Ok((base, map_id))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_bare_url() {
    let (base, code) = parse_map_url("sartopo.com/m/ABC123").unwrap();
    assert_eq!(base, "http://sartopo.com");
    assert_eq!(code, "ABC123");
  }

  #[test]
  fn test_parse_url_with_scheme_and_port() {
    let (base, code) = parse_map_url("http://localhost:8080/m/XY12").unwrap();
    assert_eq!(base, "http://localhost:8080");
    assert_eq!(code, "XY12");
  }

  #[test]
  fn test_parse_url_trailing_slash() {
    let (_, code) = parse_map_url("sartopo.com/m/ABC123/").unwrap();
    assert_eq!(code, "ABC123");
  }

  #[test]
  fn test_parse_rejects_empty() {
    assert!(parse_map_url("").is_err());
    assert!(parse_map_url("   ").is_err());
  }
}
