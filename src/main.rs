mod address;
mod app;
mod commands;
mod config;
mod event;
mod sartopo;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sartopo-address")]
#[command(about = "Look up street addresses offline and post markers to a SARTopo map")]
#[command(version)]
struct Args {
  /// Path to settings file (default: $XDG_CONFIG_HOME/sartopo-address/sartopo_address.rc)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address CSV file (address, latitude, longitude)
  #[arg(short, long)]
  address_file: Option<PathBuf>,

  /// Marker symbol definition CSV file
  #[arg(short, long)]
  marker_file: Option<PathBuf>,

  /// Map URL, e.g. sartopo.com/m/ABC123
  #[arg(short = 'u', long)]
  map_url: Option<String>,
}

/// Log to a file; stderr belongs to the terminal UI.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()?.join("sartopo-address").join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let appender = tracing_appender::rolling::daily(log_dir, "sartopo-address.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing();

  let args = Args::parse();

  // Load settings; a missing or malformed file degrades to defaults
  let (mut settings, warning) = config::Settings::load(args.config.as_deref());
  let mut warnings = Vec::new();
  if let Some(warning) = warning {
    warnings.push(warning);
  }

  // Command-line overrides
  if let Some(path) = args.address_file {
    settings.address_file = Some(path);
  }
  if let Some(path) = args.marker_file {
    settings.marker_file = Some(path);
  }
  if let Some(url) = args.map_url {
    settings.map_url = Some(url);
  }

  let rc_path = args
    .config
    .clone()
    .unwrap_or_else(config::Settings::default_rc_path);

  let mut app = app::App::new(settings, warnings);
  app.run().await?;

  // Persist window geometry and any map URL set during the session
  if let Err(e) = app.settings().save(&rc_path) {
    tracing::warn!("could not save settings: {}", e);
  }

  Ok(())
}
