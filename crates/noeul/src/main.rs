use std::fs::{self, File};
use std::io::stdout;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
};
use directories::ProjectDirs;
use noeul_config::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod terminal;

use app::App;
use cli::Cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    cli.apply(&mut config);

    if cli.init_config {
        config.save_to(&config_path)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    initialise_tracing();
    tracing::info!(path = %config_path.display(), ?config.tier, "starting noeul");

    let terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture, EnableFocusChange)
        .map_err(Into::into)
        .and_then(|()| App::new(config).run(terminal));
    if let Err(err) = execute!(stdout(), DisableMouseCapture, DisableFocusChange) {
        tracing::warn!(error = %err, "failed to release mouse capture");
    }
    ratatui::restore();
    result
}

/// Log to a file in the cache directory; the terminal belongs to the sky.
///
/// The filter comes from `NOEUL_LOG` and defaults to `info`. Logging is
/// skipped when no cache directory is available.
fn initialise_tracing() {
    let Some(dirs) = ProjectDirs::from("", "", "noeul") else {
        return;
    };
    let dir = dirs.cache_dir();
    if fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("noeul.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_env("NOEUL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
