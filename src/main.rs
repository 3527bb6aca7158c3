use std::path::PathBuf;

use blocknotes::{Config, NoteStore, SortOrder};
use log::{error, info};

pub fn initialize_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    initialize_logger();

    info!("Application starting up");

    // An optional JSON config file may be passed as the only argument.
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_from(&path),
        None => Config::from_platform_dirs(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Cannot start without a data directory: {}", e);
            std::process::exit(1);
        }
    };

    let mut store = match NoteStore::open_with_config(&config) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open note store: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(e) = store.last_error() {
        error!("Notes could not be loaded: {}", e);
    }

    info!("{} notes in {}", store.notes().len(), config.notes_file().display());
    for note in store.sorted(SortOrder::Recent) {
        info!(
            "{} {} ({} blocks, modified {})",
            note.icon,
            note.display_title(),
            note.blocks.len(),
            note.date.to_rfc3339()
        );
    }

    if store.has_pending_save() {
        if let Err(e) = store.flush().await {
            error!("Final save failed: {}", e);
        }
    }

    info!("Application shutting down");
}
