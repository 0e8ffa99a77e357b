use log::{info, trace};

use crate::ui::{EngineHooks, Lifecycle};

/// The application behind the engine's window. Extend the hooks here.
#[derive(Debug, Default)]
pub struct Application;

impl Application {
    pub fn new() -> Application {
        Application
    }
}

impl EngineHooks for Application {
    fn on_create(&mut self, lifecycle: &Lifecycle) {
        if let Some(handle) = lifecycle.handle() {
            info!("Application window {} created", handle);
        }
    }

    fn on_update(&mut self, lifecycle: &Lifecycle) {
        trace!("Frame {}", lifecycle.frame());
    }

    fn on_destroy(&mut self, lifecycle: &Lifecycle) {
        info!("Application window destroyed");
        lifecycle.stop();
    }
}
