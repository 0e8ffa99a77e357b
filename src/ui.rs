pub mod engine;
pub mod headless;
pub mod platform;
#[cfg(windows)]
pub mod win32;
pub mod window;

pub use engine::{EngineHooks, EngineState, Lifecycle, WindowEngine};
pub use headless::{HeadlessPlatform, HeadlessQueue};
pub use platform::{MessageSink, Platform, PumpStatus};
pub use window::{
    MessageKind, MessageResult, PumpMode, WindowBuilder, WindowError, WindowGeometry,
    WindowHandle, WindowMessage, WindowOperation,
};
