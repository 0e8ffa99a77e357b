#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::process;

use log::{error, info, LevelFilter};

use win_engine::logger::ConsoleLogger;

#[cfg(windows)]
fn main() {
    use log::warn;
    use win_engine::{
        app::Application,
        ui::{WindowBuilder, WindowEngine},
    };

    ConsoleLogger::init(LevelFilter::Info);
    info!("Window engine {}", env!("CARGO_PKG_VERSION"));

    let mut engine = WindowEngine::native(Application::new(), WindowBuilder::default());

    if let Err(e) = engine.init() {
        error!("{}", e);
        process::exit(1);
    }

    while engine.is_running() {
        engine.pump();
    }

    if let Err(e) = engine.release() {
        warn!("{}", e);
    }
}

#[cfg(not(windows))]
fn main() {
    ConsoleLogger::init(LevelFilter::Info);
    info!("Window engine {}", env!("CARGO_PKG_VERSION"));
    error!("No native windowing backend on this platform");
    process::exit(1);
}
