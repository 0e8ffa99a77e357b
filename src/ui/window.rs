use std::{fmt, time::Duration};

use thiserror::Error;

pub const DEFAULT_CLASS_NAME: &str = "WindowsEngine";
pub const DEFAULT_WIDTH: i32 = 1024;
pub const DEFAULT_HEIGHT: i32 = 768;
pub const DEFAULT_PUMP_DELAY: Duration = Duration::from_millis(10);

/// `ERROR_INVALID_WINDOW_HANDLE`
pub const INVALID_WINDOW_HANDLE: u32 = 1400;
/// `ERROR_CLASS_ALREADY_EXISTS`
pub const CLASS_ALREADY_EXISTS: u32 = 1410;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOperation {
    Create,
    Destroy,
}

impl fmt::Display for WindowOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindowOperation::Create => f.write_str("create"),
            WindowOperation::Destroy => f.write_str("destroy"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window class registration failed for {class:?}: {code}")]
    Registration { class: String, code: u32 },
    #[error("Window {op} failed: {code}")]
    Operation { op: WindowOperation, code: u32 },
}

impl WindowError {
    pub fn invalid_handle(op: WindowOperation) -> WindowError {
        WindowError::Operation {
            op,
            code: INVALID_WINDOW_HANDLE,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            WindowError::Registration { code, .. } | WindowError::Operation { code, .. } => *code,
        }
    }
}

/// Opaque, backend-assigned identifier of a live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub(crate) isize);

impl WindowHandle {
    pub fn raw(&self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl WindowGeometry {
    pub fn sized(width: i32, height: i32) -> WindowGeometry {
        WindowGeometry {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn unwrap_or(&self, default: i32) -> (i32, i32, i32, i32) {
        (
            self.x.unwrap_or(default),
            self.y.unwrap_or(default),
            self.width.unwrap_or(default),
            self.height.unwrap_or(default),
        )
    }
}

/// How [`WindowEngine::pump`](crate::ui::WindowEngine::pump) paces frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpMode {
    /// Drain without blocking, then sleep for the given delay.
    Poll(Duration),
    /// Block in the OS until a message arrives while the window is alive.
    Wait,
}

impl Default for PumpMode {
    fn default() -> Self {
        PumpMode::Poll(DEFAULT_PUMP_DELAY)
    }
}

#[derive(Debug, Clone)]
pub struct WindowBuilder {
    pub(crate) class: String,
    pub(crate) title: String,
    pub(crate) geometry: WindowGeometry,
    pub(crate) style: u32,
    pub(crate) extended_style: u32,
    pub(crate) pump_mode: PumpMode,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        WindowBuilder::window(DEFAULT_CLASS_NAME).title(DEFAULT_CLASS_NAME)
    }
}

impl WindowBuilder {
    pub fn window<S>(class: S) -> WindowBuilder
    where
        S: AsRef<str>,
    {
        WindowBuilder {
            class: class.as_ref().to_owned(),
            title: String::new(),
            geometry: WindowGeometry::sized(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            style: 0,
            extended_style: 0,
            pump_mode: PumpMode::default(),
        }
    }

    pub fn title<T>(mut self, title: T) -> Self
    where
        T: AsRef<str>,
    {
        self.title = title.as_ref().to_owned();
        self
    }

    pub fn geometry(mut self, geometry: WindowGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Zero keeps the backend's overlapped-window default.
    pub fn style(mut self, style: u32) -> Self {
        self.style = style;
        self
    }

    pub fn extended_style(mut self, style: u32) -> Self {
        self.extended_style = style;
        self
    }

    pub fn pump_mode(mut self, mode: PumpMode) -> Self {
        self.pump_mode = mode;
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn window_title(&self) -> &str {
        &self.title
    }

    pub fn window_geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn window_pump_mode(&self) -> PumpMode {
        self.pump_mode
    }
}

/// Message kinds the engine distinguishes. Raw values follow the Win32 numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Create,
    Destroy,
    Close,
    Quit,
    Other(u32),
}

impl MessageKind {
    const CREATE: u32 = 0x0001;
    const DESTROY: u32 = 0x0002;
    const CLOSE: u32 = 0x0010;
    const QUIT: u32 = 0x0012;

    pub fn from_raw(msg: u32) -> MessageKind {
        match msg {
            Self::CREATE => MessageKind::Create,
            Self::DESTROY => MessageKind::Destroy,
            Self::CLOSE => MessageKind::Close,
            Self::QUIT => MessageKind::Quit,
            other => MessageKind::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            MessageKind::Create => Self::CREATE,
            MessageKind::Destroy => Self::DESTROY,
            MessageKind::Close => Self::CLOSE,
            MessageKind::Quit => Self::QUIT,
            MessageKind::Other(msg) => msg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMessage {
    pub handle: WindowHandle,
    pub msg: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl WindowMessage {
    pub fn new(handle: WindowHandle, msg: u32, wparam: usize, lparam: isize) -> WindowMessage {
        WindowMessage {
            handle,
            msg,
            wparam,
            lparam,
        }
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::from_raw(self.msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResult {
    Processed,
    Ignored,
    Value(isize),
    /// Processed; the backend posts a quit signal with this exit code.
    Quit(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builder_uses_fixed_geometry() {
        let builder = WindowBuilder::default();
        assert_eq!(builder.class_name(), "WindowsEngine");
        assert_eq!(builder.window_title(), "WindowsEngine");
        assert_eq!(
            builder.window_geometry(),
            WindowGeometry {
                x: None,
                y: None,
                width: Some(1024),
                height: Some(768),
            }
        );
        assert_eq!(
            builder.window_pump_mode(),
            PumpMode::Poll(Duration::from_millis(10))
        );
    }

    #[test]
    fn geometry_fills_unset_fields() {
        let gm = WindowGeometry::sized(640, 480);
        assert_eq!(gm.unwrap_or(-1), (-1, -1, 640, 480));
    }

    #[test]
    fn message_kinds_map_win32_numbers() {
        assert_eq!(MessageKind::from_raw(0x0001), MessageKind::Create);
        assert_eq!(MessageKind::from_raw(0x0002), MessageKind::Destroy);
        assert_eq!(MessageKind::from_raw(0x0010), MessageKind::Close);
        assert_eq!(MessageKind::from_raw(0x0012), MessageKind::Quit);
        assert_eq!(MessageKind::from_raw(0x000f), MessageKind::Other(0x000f));
        assert_eq!(MessageKind::Other(0x0200).raw(), 0x0200);
    }

    #[test]
    fn errors_carry_os_codes() {
        let err = WindowError::invalid_handle(WindowOperation::Destroy);
        assert_eq!(err.code(), 1400);
        assert_eq!(err.to_string(), "Window destroy failed: 1400");

        let err = WindowError::Registration {
            class: "Demo".to_owned(),
            code: CLASS_ALREADY_EXISTS,
        };
        assert_eq!(
            err.to_string(),
            "Window class registration failed for \"Demo\": 1410"
        );
    }
}
