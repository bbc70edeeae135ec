use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::sartopo::types::{Feature, FeatureClass};

/// Results coming back from spawned API calls.
#[derive(Debug)]
pub enum ApiEvent {
  /// A since-poll answered with the features changed for one class.
  FeaturesFetched {
    class: FeatureClass,
    features: Vec<Feature>,
  },
  /// A since-poll could not reach the map.
  FeaturesUnavailable { class: FeatureClass },
  /// A folder was created on the map.
  FolderCreated { name: String, id: String },
  /// A marker post went through.
  MarkerWritten { label: String },
  /// The connect-time probe of the map URL finished.
  Connected { ok: bool },
}

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh
  Tick,
  /// Result of a remote API call
  Api(ApiEvent),
  /// Failure to surface as a warning; nothing was written
  Error(String),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn terminal event reader
    let key_tx = tx.clone();
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(evt) = event::read() {
            if let CrosstermEvent::Key(key) = evt {
              if key_tx.send(Event::Key(key)).is_err() {
                break;
              }
            }
          }
        } else {
          // Tick
          if key_tx.send(Event::Tick).is_err() {
            break;
          }
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender handed to spawned API tasks so they can report back.
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
