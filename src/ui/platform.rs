use std::rc::Rc;

use crate::ui::window::{MessageResult, WindowBuilder, WindowError, WindowHandle, WindowMessage};

/// Receives every message the backend delivers to a window.
///
/// `Ignored` hands the message to the backend's default handler, `Quit` asks the
/// backend to post a quit signal.
pub trait MessageSink {
    fn handle_message(&self, message: &WindowMessage) -> MessageResult;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStatus {
    pub dispatched: usize,
    pub quit: Option<i32>,
}

/// The native windowing facility the engine drives.
///
/// Backends deliver the creation and destruction notifications synchronously,
/// from inside `create_window` and `destroy_window`, to the sink registered for
/// that window.
pub trait Platform {
    fn register_class(&mut self, builder: &WindowBuilder) -> Result<(), WindowError>;

    fn create_window(
        &mut self,
        builder: &WindowBuilder,
        sink: Rc<dyn MessageSink>,
    ) -> Result<WindowHandle, WindowError>;

    fn show(&mut self, handle: WindowHandle);

    /// Whether `handle` still names a window this backend created.
    fn is_window(&self, handle: WindowHandle) -> bool;

    /// Drains the queue without blocking, dispatching each message.
    fn pump_messages(&mut self) -> PumpStatus;

    /// Blocks until at least one message is queued.
    fn wait_message(&mut self);

    fn destroy_window(&mut self, handle: WindowHandle) -> Result<(), WindowError>;

    fn post_quit(&mut self, code: i32);
}
