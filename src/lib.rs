pub mod util;

pub mod app;
pub mod logger;
pub mod ui;
