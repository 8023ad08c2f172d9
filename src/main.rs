mod app;
mod cli;
mod config;
mod dialogs;
mod error;
mod files;
mod input;
mod loader;
mod thumbnails;
mod ui;
mod viewport;

use clap::Parser;
use winit::event_loop::EventLoop;

use crate::app::{Settings, Viewer};
use crate::cli::Cli;
use crate::config::Config;
use crate::dialogs::NativeDialogs;
use crate::files::SortMode;
use crate::loader::ImageThumbnails;
use crate::ui::App;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_create(&cli.config);

    // `hideconsole` silences logging unless RUST_LOG overrides it.
    let default_filter = if config.hide_console { "off" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    log::debug!("{:?}", config);

    let settings = Settings {
        ignore_unknown_extensions: !cli.all_files,
        sort_by_modified: cli.sort == SortMode::ModifiedDescending,
        ..Settings::default()
    };

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };

    let mut viewer = Viewer::new(
        config,
        settings,
        Box::new(NativeDialogs),
        Box::new(ImageThumbnails),
        (1280, 720),
    );
    if let Some(path) = &cli.path {
        viewer.open_path(path, settings.ignore_unknown_extensions, cli.recursive);
    }

    let mut app = App::new(viewer);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {}", e);
    }
}
