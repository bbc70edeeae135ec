use crate::address::AddressTable;
use crate::commands::{self, Command};
use crate::config::Settings;
use crate::event::{ApiEvent, Event, EventHandler};
use crate::sartopo::client::SartopoClient;
use crate::sartopo::store::{FeatureListSink, FeatureStore, ItemPayload, PollOutcome};
use crate::sartopo::symbols::{SymbolTable, DEFAULT_SYMBOL};
use crate::sartopo::types::{FeatureClass, FeatureProperties, MarkerSpec};
use crate::ui;
use crate::ui::components::feature_list::FeaturePane;
use crate::ui::components::input::{InputResult, TextInput};
use chrono::{Local, Utc};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// All markers posted by this tool share one color.
const MARKER_COLOR: &str = "#FF0000";

/// Fallback folder when neither the form nor the symbol table names one.
const DEFAULT_FOLDER: &str = "Addresses";

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Insert,
  Command,
  FolderPick,
  SymbolPick,
}

/// Which form field receives typed text in insert mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Address,
  Label,
  Description,
}

/// Main application controller.
///
/// Owns all mutable state; everything is touched only from the event
/// dispatch sequence in `run`. Remote calls happen on spawned tasks that
/// report back through the event channel.
pub struct App {
  settings: Settings,
  /// Local-file warnings gathered at startup, surfaced in the status line
  warnings: Vec<String>,

  address_table: AddressTable,
  symbols: SymbolTable,
  store: FeatureStore,
  client: Option<SartopoClient>,
  connected: bool,

  mode: Mode,
  focus: Focus,
  address_input: TextInput,
  label_input: TextInput,
  description_input: TextInput,
  lat_text: String,
  lon_text: String,

  /// Display names from the symbol table, cached for the picker
  symbol_names: Vec<String>,
  symbol_selected: usize,
  /// Symbol chosen in the picker, if any
  symbol_name: Option<String>,

  /// Folder chosen in the picker: (title, id)
  selected_folder: Option<(String, String)>,
  /// Folder id limiting the marker pane, set alongside the picker choice
  folder_filter: Option<String>,

  /// Set when an existing marker was loaded into the form for editing
  editing: Option<(String, FeatureProperties)>,

  /// List widgets registered as observers of the feature store
  folder_pane: FeaturePane,
  marker_pane: FeaturePane,

  command_input: String,
  selected_suggestion: usize,
  status: Option<String>,

  event_tx: mpsc::UnboundedSender<Event>,
  should_quit: bool,
}

impl App {
  pub fn new(settings: Settings, mut warnings: Vec<String>) -> Self {
    let address_table = match &settings.address_file {
      Some(path) => match AddressTable::load(path) {
        Ok(table) => table,
        Err(e) => {
          warnings.push(e.to_string());
          AddressTable::default()
        }
      },
      None => AddressTable::default(),
    };

    let symbols = match &settings.marker_file {
      Some(path) => match SymbolTable::load(path) {
        Ok(table) => table,
        Err(e) => {
          warnings.push(e.to_string());
          SymbolTable::default()
        }
      },
      None => SymbolTable::default(),
    };

    let client = match &settings.map_url {
      Some(url) => match SartopoClient::new(url) {
        Ok(client) => Some(client),
        Err(e) => {
          warnings.push(e.to_string());
          None
        }
      },
      None => None,
    };

    let symbol_names: Vec<String> = symbols.names().map(str::to_string).collect();
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      settings,
      warnings,
      address_table,
      symbols,
      store: FeatureStore::new(),
      client,
      connected: false,
      mode: Mode::Insert,
      focus: Focus::Address,
      address_input: TextInput::new(),
      label_input: TextInput::new(),
      description_input: TextInput::new(),
      lat_text: String::new(),
      lon_text: String::new(),
      symbol_names,
      symbol_selected: 0,
      symbol_name: None,
      selected_folder: None,
      folder_filter: None,
      editing: None,
      folder_pane: FeaturePane::new("Folders"),
      marker_pane: FeaturePane::new("Markers"),
      command_input: String::new(),
      selected_suggestion: 0,
      status: None,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    self.probe_connection();
    self.refresh(FeatureClass::Folder);
    self.refresh(FeatureClass::Marker);

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Record the final window geometry for the settings file
    if let Ok((cols, rows)) = crossterm::terminal::size() {
      self.settings.cols = cols;
      self.settings.rows = rows;
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Api(api_event) => self.handle_api_event(api_event),
      Event::Error(msg) => {
        warn!("{}", msg);
        self.status = Some(msg);
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Insert => self.handle_insert_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
      Mode::FolderPick => self.handle_folder_pick_key(key),
      Mode::SymbolPick => self.handle_symbol_pick_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Focus a form field
      KeyCode::Char('a') => self.enter_insert(Focus::Address),
      KeyCode::Char('l') => self.enter_insert(Focus::Label),
      KeyCode::Char('d') => self.enter_insert(Focus::Description),

      // Pickers; opening one re-polls its class, like the live-update
      // combo boxes in the original tool
      KeyCode::Char('f') => {
        self.mode = Mode::FolderPick;
        self.refresh(FeatureClass::Folder);
      }
      KeyCode::Char('s') => {
        if !self.symbol_names.is_empty() {
          self.mode = Mode::SymbolPick;
        } else {
          self.status = Some("No marker symbol definitions loaded.".to_string());
        }
      }
      KeyCode::Char('x') => {
        self.selected_folder = None;
        self.folder_filter = None;
        self.publish(FeatureClass::Marker);
      }

      // Marker list navigation
      KeyCode::Up | KeyCode::Char('k') => self.marker_pane.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.marker_pane.move_selection(1),
      KeyCode::Enter => self.edit_selected_marker(),

      KeyCode::Char('r') => {
        self.refresh(FeatureClass::Folder);
        self.refresh(FeatureClass::Marker);
      }
      KeyCode::Char('g') => self.submit(),

      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn enter_insert(&mut self, focus: Focus) {
    self.mode = Mode::Insert;
    self.focus = focus;
  }

  fn handle_insert_mode_key(&mut self, key: KeyEvent) {
    // Tab in the address field accepts the first completion
    if self.focus == Focus::Address && key.code == KeyCode::Tab {
      let hit = self
        .address_table
        .completions(self.address_input.value())
        .first()
        .map(|s| s.to_string());
      if let Some(text) = hit {
        self.address_input.set_value(&text);
        self.lookup_address();
      }
      return;
    }

    let input = match self.focus {
      Focus::Address => &mut self.address_input,
      Focus::Label => &mut self.label_input,
      Focus::Description => &mut self.description_input,
    };

    match input.handle_key(key) {
      InputResult::Submitted(_) | InputResult::Cancelled => {
        self.mode = Mode::Normal;
      }
      InputResult::Consumed => {
        if self.focus == Focus::Address {
          self.lookup_address();
        }
      }
      InputResult::NotHandled => {}
    }
  }

  /// Case-insensitive exact lookup on every edit of the address field.
  fn lookup_address(&mut self) {
    match self.address_table.lookup(self.address_input.value()) {
      Some((lat, lon)) => {
        self.lat_text = lat.to_string();
        self.lon_text = lon.to_string();
      }
      None => {
        self.lat_text = "---".to_string();
        self.lon_text = "---".to_string();
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn handle_folder_pick_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.mode = Mode::Normal,
      KeyCode::Up | KeyCode::Char('k') => self.folder_pane.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.folder_pane.move_selection(1),
      KeyCode::Enter => {
        if let Some((title, payload)) = self.folder_pane.selected_item() {
          let id = payload.id().to_string();
          self.selected_folder = Some((title.clone(), id.clone()));
          // Picking a folder also narrows the marker list to it
          self.folder_filter = Some(id);
          self.publish(FeatureClass::Marker);
        }
        self.mode = Mode::Normal;
      }
      _ => {}
    }
  }

  fn handle_symbol_pick_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.mode = Mode::Normal,
      KeyCode::Up | KeyCode::Char('k') => {
        let len = self.symbol_names.len();
        if len > 0 {
          self.symbol_selected =
            (self.symbol_selected as i32 - 1).rem_euclid(len as i32) as usize;
        }
      }
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.symbol_names.len();
        if len > 0 {
          self.symbol_selected = (self.symbol_selected + 1) % len;
        }
      }
      KeyCode::Enter => {
        self.symbol_name = self.symbol_names.get(self.symbol_selected).cloned();
        self.mode = Mode::Normal;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self
        .command_input
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
    };
    let arg = self
      .command_input
      .split_whitespace()
      .nth(1)
      .map(str::to_string);

    match cmd.as_str() {
      "markers" => self.refresh(FeatureClass::Marker),
      "folders" => self.refresh(FeatureClass::Folder),
      "reload" => self.reload_files(),
      "connect" => {
        let url = arg.or_else(|| self.settings.map_url.clone());
        match url {
          Some(url) => self.connect(&url),
          None => self.status = Some("connect needs a map URL.".to_string()),
        }
      }
      "quit" => self.should_quit = true,
      _ => {}
    }
    self.command_input.clear();
  }

  fn reload_files(&mut self) {
    self.status = None;
    if let Some(path) = self.settings.address_file.clone() {
      match AddressTable::load(&path) {
        Ok(table) => self.address_table = table,
        Err(e) => self.status = Some(e.to_string()),
      }
    }
    if let Some(path) = self.settings.marker_file.clone() {
      match SymbolTable::load(&path) {
        Ok(table) => {
          self.symbol_names = table.names().map(str::to_string).collect();
          self.symbol_selected = 0;
          self.symbols = table;
        }
        Err(e) => self.status = Some(e.to_string()),
      }
    }
    if self.status.is_none() {
      self.status = Some(format!(
        "Reloaded {} addresses, {} symbols.",
        self.address_table.len(),
        self.symbols.len()
      ));
    }
  }

  fn connect(&mut self, url: &str) {
    match SartopoClient::new(url) {
      Ok(client) => {
        self.settings.map_url = Some(url.to_string());
        self.client = Some(client);
        self.connected = false;
        self.probe_connection();
        self.refresh(FeatureClass::Folder);
        self.refresh(FeatureClass::Marker);
      }
      Err(e) => self.status = Some(e.to_string()),
    }
  }

  fn probe_connection(&mut self) {
    let Some(client) = self.client.clone() else {
      return;
    };
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let ok = client.probe().await.is_ok();
      let _ = tx.send(Event::Api(ApiEvent::Connected { ok }));
    });
  }

  /// Poll the map for features of `class` changed since the stored
  /// watermark. With no client the class goes back to a cold, empty state
  /// and an empty view is published; that is deliberate, not an error.
  fn refresh(&mut self, class: FeatureClass) {
    match self.client.clone() {
      None => {
        self.store.apply_poll(class, PollOutcome::NoSession, 0);
        self.publish(class);
      }
      Some(client) => {
        let since = self.store.since(class);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          match client.get_features(class, since).await {
            Ok(features) => {
              let _ = tx.send(Event::Api(ApiEvent::FeaturesFetched { class, features }));
            }
            Err(e) => {
              warn!("poll for {} features failed: {}", class, e);
              let _ = tx.send(Event::Api(ApiEvent::FeaturesUnavailable { class }));
            }
          }
        });
      }
    }
  }

  /// Fan the current projection out to the widgets observing `class`.
  fn publish(&mut self, class: FeatureClass) {
    match class {
      FeatureClass::Folder => {
        let mut sinks: [&mut dyn FeatureListSink; 1] = [&mut self.folder_pane];
        self.store.publish(class, None, &mut sinks);
      }
      FeatureClass::Marker => {
        let filter = self.folder_filter.as_deref();
        let mut sinks: [&mut dyn FeatureListSink; 1] = [&mut self.marker_pane];
        self.store.publish(class, filter, &mut sinks);
      }
    }
  }

  fn handle_api_event(&mut self, event: ApiEvent) {
    match event {
      ApiEvent::FeaturesFetched { class, features } => {
        self
          .store
          .apply_poll(class, PollOutcome::Fetched(features), now_millis());
        self.publish(class);
      }
      ApiEvent::FeaturesUnavailable { class } => {
        // The watermark still advances; this window is forfeited
        self
          .store
          .apply_poll(class, PollOutcome::Unavailable, now_millis());
        self.publish(class);
        self.status = Some(format!("Could not fetch {} list from the map.", class));
      }
      ApiEvent::FolderCreated { name, id } => {
        self.selected_folder = Some((name, id));
      }
      ApiEvent::MarkerWritten { label } => {
        self.status = Some(format!("Marker written: {}", label));
        self.editing = None;
        self.label_input.clear();
        self.description_input.clear();
        self.refresh(FeatureClass::Marker);
      }
      ApiEvent::Connected { ok } => {
        self.connected = ok;
        if !ok {
          self.status = Some(
            "Could not communicate with the specified URL. Fix it or blank it out, and try again."
              .to_string(),
          );
        }
      }
    }
  }

  /// Load the selected marker into the form so the next submit updates it
  /// in place instead of creating a new feature.
  fn edit_selected_marker(&mut self) {
    let Some((title, payload)) = self.marker_pane.selected_item() else {
      return;
    };
    let ItemPayload::Marker(id, properties) = payload else {
      return;
    };

    let title = title.clone();
    let id = id.clone();
    let properties = properties.clone();

    self.label_input.set_value(&title);
    self
      .description_input
      .set_value(properties.description.as_deref().unwrap_or(""));
    self.editing = Some((id, properties));
    self.status = Some(format!("Editing marker {}.", title));
  }

  /// Build the marker from the form and post it, creating the target
  /// folder first when it does not exist yet.
  fn submit(&mut self) {
    let Some(client) = self.client.clone() else {
      self.status =
        Some("No map URL connected; marker not written. Use :connect <url>.".to_string());
      return;
    };

    let (Ok(lat), Ok(lon)) = (self.lat_text.parse::<f64>(), self.lon_text.parse::<f64>())
    else {
      self.status = Some("No coordinates for this address; marker not written.".to_string());
      return;
    };

    // Default label: house number and first street word, like the original
    let label = if self.label_input.is_empty() {
      self
        .address_input
        .value()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
    } else {
      self.label_input.value().to_string()
    };
    if label.is_empty() {
      self.status = Some("Nothing to write: no label or address.".to_string());
      return;
    }

    // Free-text description gets a timestamp stamp
    let description = if self.description_input.is_empty() {
      None
    } else {
      Some(format!(
        "{} [{}]",
        self.description_input.value(),
        Local::now().format("%m-%d %H:%M")
      ))
    };

    let editing = self.editing.clone();

    // Symbol: picker choice wins, then the edited marker's existing symbol
    let symbol = match (&self.symbol_name, &editing) {
      (Some(name), _) => self.symbols.code_for(name).to_string(),
      (None, Some((_, props))) => props
        .marker_symbol
        .clone()
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
      (None, None) => DEFAULT_SYMBOL.to_string(),
    };

    // Folder: picker choice, then the edited marker's folder, then the
    // symbol's default folder name, then the catch-all
    let (folder_id, folder_to_create) = if let Some((_, id)) = &self.selected_folder {
      (Some(id.clone()), None)
    } else if let Some(id) = editing
      .as_ref()
      .and_then(|(_, props)| props.folder_id.clone())
    {
      (Some(id), None)
    } else {
      let name = self
        .symbol_name
        .as_deref()
        .and_then(|n| self.symbols.folder_for(n))
        .unwrap_or(DEFAULT_FOLDER)
        .to_string();
      match self.store.find_folder(&name) {
        Some(folder) => (Some(folder.id.clone()), None),
        None => (None, Some(name)),
      }
    };

    let spec = MarkerSpec {
      label,
      description,
      lat,
      lon,
      color: MARKER_COLOR.to_string(),
      symbol,
      existing_id: editing.map(|(id, _)| id),
      folder_id,
    };

    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let mut spec = spec;
      if let Some(name) = folder_to_create {
        match client.add_folder(&name).await {
          Ok(id) => {
            spec.folder_id = Some(id.clone());
            let _ = tx.send(Event::Api(ApiEvent::FolderCreated { name, id }));
          }
          Err(e) => {
            let _ = tx.send(Event::Error(format!("{}. No markers written to URL.", e)));
            return;
          }
        }
      }

      match client.add_marker(&spec).await {
        Ok(()) => {
          let _ = tx.send(Event::Api(ApiEvent::MarkerWritten { label: spec.label }));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(format!(
            "URL POST request failed: {}. No markers written to URL.",
            e
          )));
        }
      }
    });
  }

  // Accessors for UI rendering

  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn focus(&self) -> Focus {
    self.focus
  }

  pub fn address_input(&self) -> &TextInput {
    &self.address_input
  }

  pub fn label_input(&self) -> &TextInput {
    &self.label_input
  }

  pub fn description_input(&self) -> &TextInput {
    &self.description_input
  }

  pub fn lat_text(&self) -> &str {
    &self.lat_text
  }

  pub fn lon_text(&self) -> &str {
    &self.lon_text
  }

  pub fn completion_hint(&self) -> Option<&str> {
    self
      .address_table
      .completions(self.address_input.value())
      .first()
      .copied()
  }

  pub fn symbol_name(&self) -> Option<&str> {
    self.symbol_name.as_deref()
  }

  pub fn symbol_names(&self) -> &[String] {
    &self.symbol_names
  }

  pub fn symbol_selected(&self) -> usize {
    self.symbol_selected
  }

  pub fn selected_folder_name(&self) -> Option<&str> {
    self.selected_folder.as_ref().map(|(name, _)| name.as_str())
  }

  pub fn editing_label(&self) -> Option<&str> {
    self.editing.as_ref().map(|(_, p)| p.title.as_str())
  }

  pub fn folder_pane(&self) -> &FeaturePane {
    &self.folder_pane
  }

  pub fn marker_pane(&self) -> &FeaturePane {
    &self.marker_pane
  }

  pub fn map_id(&self) -> Option<&str> {
    self.client.as_ref().map(|c| c.map_id())
  }

  pub fn account_name(&self) -> Option<&str> {
    self.settings.account_name.as_deref()
  }

  pub fn connected(&self) -> bool {
    self.connected
  }

  pub fn address_count(&self) -> usize {
    self.address_table.len()
  }

  pub fn status(&self) -> Option<&str> {
    self
      .status
      .as_deref()
      .or_else(|| self.warnings.first().map(String::as_str))
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}

fn now_millis() -> i64 {
  Utc::now().timestamp_millis()
}
