//! Feature cache and incremental sync.
//!
//! Each poll of the map brings back only the features changed since the
//! last watermark; this module merges those into a per-class cache, keyed
//! by feature id, and projects filtered views for the list widgets.

use std::collections::HashMap;

use super::types::{Feature, FeatureClass, FeatureProperties};

/// What a poll attempt produced.
#[derive(Debug)]
pub enum PollOutcome {
  /// No remote session established; the class goes back to a cold state.
  NoSession,
  /// The map answered; these are the features changed since the watermark.
  Fetched(Vec<Feature>),
  /// The map could not be reached. The window is forfeited, not retried.
  Unavailable,
}

/// Payload attached to a projected list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
  /// Folders carry just their id.
  Id(String),
  /// Everything else carries id plus the full property bag.
  Marker(String, FeatureProperties),
}

impl ItemPayload {
  pub fn id(&self) -> &str {
    match self {
      ItemPayload::Id(id) => id,
      ItemPayload::Marker(id, _) => id,
    }
  }
}

/// Anything that can accept a projected list of (label, payload) pairs.
/// The TUI list panes implement this; tests use plain recording sinks.
pub trait FeatureListSink {
  fn set_items(&mut self, items: &[(String, ItemPayload)]);
}

#[derive(Debug, Default)]
struct ClassCache {
  /// Unique by id, sorted by title ascending (case-sensitive).
  features: Vec<Feature>,
  /// Last successful poll watermark in epoch milliseconds.
  since_millis: i64,
}

/// Per-class feature caches plus the since-timestamps that drive polling.
///
/// Owned by the application controller and only touched from the event
/// dispatch sequence; no locking involved.
#[derive(Debug, Default)]
pub struct FeatureStore {
  classes: HashMap<FeatureClass, ClassCache>,
}

impl FeatureStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Merge a poll result into the cache for `class`.
  ///
  /// `Fetched` replaces any cached entry sharing an id with a returned
  /// feature (the remote may resend previously-seen ids with updated
  /// attributes), appends the new versions, and re-sorts by title. The
  /// watermark advances to `now_millis` for `Fetched` and `Unavailable`
  /// alike; `NoSession` resets the class to empty/zero.
  pub fn apply_poll(&mut self, class: FeatureClass, outcome: PollOutcome, now_millis: i64) {
    let cache = self.classes.entry(class).or_default();

    match outcome {
      PollOutcome::NoSession => {
        cache.features.clear();
        cache.since_millis = 0;
      }
      PollOutcome::Fetched(incoming) => {
        for feature in incoming {
          cache.features.retain(|existing| existing.id != feature.id);
          cache.features.push(feature);
        }
        cache
          .features
          .sort_by(|a, b| a.properties.title.cmp(&b.properties.title));
        cache.since_millis = now_millis;
      }
      PollOutcome::Unavailable => {
        cache.since_millis = now_millis;
      }
    }
  }

  /// Current watermark for `class`, zero if never polled.
  pub fn since(&self, class: FeatureClass) -> i64 {
    self.classes.get(&class).map_or(0, |c| c.since_millis)
  }

  pub fn features(&self, class: FeatureClass) -> &[Feature] {
    self
      .classes
      .get(&class)
      .map_or(&[], |c| c.features.as_slice())
  }

  /// Build the display list for `class`, limited to entries whose folder
  /// matches `filter_folder_id` when one is given. Recomputed on every
  /// call; order is the cache's title order.
  pub fn project(
    &self,
    class: FeatureClass,
    filter_folder_id: Option<&str>,
  ) -> Vec<(String, ItemPayload)> {
    self
      .features(class)
      .iter()
      .filter(|f| match filter_folder_id {
        Some(wanted) => f.folder_id() == Some(wanted),
        None => true,
      })
      .map(|f| {
        let payload = match class {
          FeatureClass::Folder => ItemPayload::Id(f.id.clone()),
          _ => ItemPayload::Marker(f.id.clone(), f.properties.clone()),
        };
        (f.properties.title.clone(), payload)
      })
      .collect()
  }

  /// Fan the projected view out to every registered list widget.
  pub fn publish(
    &self,
    class: FeatureClass,
    filter_folder_id: Option<&str>,
    sinks: &mut [&mut dyn FeatureListSink],
  ) {
    let items = self.project(class, filter_folder_id);
    for sink in sinks {
      sink.set_items(&items);
    }
  }

  /// Exact, case-sensitive title match over cached folders.
  pub fn find_folder(&self, name: &str) -> Option<&Feature> {
    self
      .features(FeatureClass::Folder)
      .iter()
      .find(|f| f.properties.title == name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn feature(id: &str, title: &str, folder_id: Option<&str>) -> Feature {
    Feature {
      id: id.to_string(),
      properties: FeatureProperties {
        title: title.to_string(),
        folder_id: folder_id.map(str::to_string),
        ..Default::default()
      },
    }
  }

  #[test]
  fn test_merge_keeps_ids_unique() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Alpha", None), feature("m2", "Bravo", None)]),
      1000,
    );
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Alpha moved", None)]),
      2000,
    );

    let features = store.features(FeatureClass::Marker);
    assert_eq!(features.len(), 2);
    assert_eq!(
      features.iter().filter(|f| f.id == "m1").count(),
      1,
      "one entry per id"
    );
  }

  #[test]
  fn test_refetch_fully_replaces_feature() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Original", Some("f1"))]),
      1000,
    );
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Updated", None)]),
      2000,
    );

    let features = store.features(FeatureClass::Marker);
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].title(), "Updated");
    // Full replacement: the old folder assignment is gone, not merged.
    assert_eq!(features[0].folder_id(), None);
  }

  #[test]
  fn test_cache_sorted_by_title_case_sensitive() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![
        feature("m1", "bravo", None),
        feature("m2", "Alpha", None),
        feature("m3", "Zulu", None),
      ]),
      1000,
    );

    let titles: Vec<_> = store
      .features(FeatureClass::Marker)
      .iter()
      .map(|f| f.title())
      .collect();
    // Byte order: uppercase sorts before lowercase.
    assert_eq!(titles, vec!["Alpha", "Zulu", "bravo"]);
  }

  #[test]
  fn test_fetched_advances_since() {
    let mut store = FeatureStore::new();
    assert_eq!(store.since(FeatureClass::Folder), 0);

    store.apply_poll(FeatureClass::Folder, PollOutcome::Fetched(Vec::new()), 5000);
    assert_eq!(store.since(FeatureClass::Folder), 5000);
  }

  #[test]
  fn test_unavailable_advances_since_and_keeps_cache() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Alpha", None)]),
      1000,
    );
    store.apply_poll(FeatureClass::Marker, PollOutcome::Unavailable, 2000);

    assert_eq!(store.since(FeatureClass::Marker), 2000);
    assert_eq!(store.features(FeatureClass::Marker).len(), 1);
  }

  #[test]
  fn test_no_session_resets_class() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![feature("m1", "Alpha", None)]),
      1000,
    );
    store.apply_poll(FeatureClass::Marker, PollOutcome::NoSession, 2000);

    assert_eq!(store.since(FeatureClass::Marker), 0);
    assert!(store.features(FeatureClass::Marker).is_empty());
  }

  #[test]
  fn test_project_filters_by_folder() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Marker,
      PollOutcome::Fetched(vec![
        feature("m1", "In folder", Some("f1")),
        feature("m2", "Other folder", Some("f2")),
        feature("m3", "No folder", None),
      ]),
      1000,
    );

    let filtered = store.project(FeatureClass::Marker, Some("f1"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].0, "In folder");

    let all = store.project(FeatureClass::Marker, None);
    assert_eq!(all.len(), 3);
  }

  #[test]
  fn test_project_folder_payload_is_id() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Folder,
      PollOutcome::Fetched(vec![feature("f1", "Addresses", None)]),
      1000,
    );

    let items = store.project(FeatureClass::Folder, None);
    assert_eq!(items[0].1, ItemPayload::Id("f1".to_string()));
  }

  #[test]
  fn test_publish_fans_out_to_all_sinks() {
    #[derive(Default)]
    struct Recorder {
      items: Vec<(String, ItemPayload)>,
      calls: usize,
    }
    impl FeatureListSink for Recorder {
      fn set_items(&mut self, items: &[(String, ItemPayload)]) {
        self.items = items.to_vec();
        self.calls += 1;
      }
    }

    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Folder,
      PollOutcome::Fetched(vec![feature("f1", "Addresses", None)]),
      1000,
    );

    let mut a = Recorder::default();
    let mut b = Recorder::default();
    let mut sinks: [&mut dyn FeatureListSink; 2] = [&mut a, &mut b];
    store.publish(FeatureClass::Folder, None, &mut sinks);

    assert_eq!(a.calls, 1);
    assert_eq!(b.calls, 1);
    assert_eq!(a.items.len(), 1);
    assert_eq!(b.items[0].0, "Addresses");
  }

  #[test]
  fn test_find_folder_is_case_sensitive() {
    let mut store = FeatureStore::new();
    store.apply_poll(
      FeatureClass::Folder,
      PollOutcome::Fetched(vec![feature("f1", "Addresses", None)]),
      1000,
    );

    assert!(store.find_folder("Addresses").is_some());
    assert!(store.find_folder("addresses").is_none());
  }
}
