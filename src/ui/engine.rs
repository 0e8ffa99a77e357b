use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    rc::Rc,
    thread,
};

use log::{debug, info, warn};

use crate::ui::{
    platform::{MessageSink, Platform},
    window::{
        MessageKind, MessageResult, PumpMode, WindowBuilder, WindowError, WindowHandle,
        WindowMessage, WindowOperation,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running,
    Stopped,
}

/// Application callbacks driven by [`WindowEngine`].
pub trait EngineHooks {
    /// Runs once, inside window creation.
    fn on_create(&mut self, lifecycle: &Lifecycle);

    /// Runs once per [`WindowEngine::pump`], whether or not messages were queued.
    fn on_update(&mut self, lifecycle: &Lifecycle);

    /// Runs when the OS destroys the window. Overrides must call
    /// [`Lifecycle::stop`] so the engine leaves the running state.
    fn on_destroy(&mut self, lifecycle: &Lifecycle) {
        lifecycle.stop();
    }
}

#[derive(Debug)]
struct Shared {
    state: Cell<EngineState>,
    handle: Cell<Option<WindowHandle>>,
    destroyed: Cell<bool>,
    close_requested: Cell<bool>,
    frame: Cell<u64>,
}

impl Shared {
    fn new() -> Shared {
        Shared {
            state: Cell::new(EngineState::Uninitialized),
            handle: Cell::new(None),
            destroyed: Cell::new(false),
            close_requested: Cell::new(false),
            frame: Cell::new(0),
        }
    }
}

/// The engine as seen from inside a hook.
pub struct Lifecycle<'a> {
    shared: &'a Shared,
}

impl<'a> Lifecycle<'a> {
    /// Leaves the running state for good.
    pub fn stop(&self) {
        if self.shared.state.replace(EngineState::Stopped) != EngineState::Stopped {
            info!("Engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.get() == EngineState::Running
    }

    /// The window this engine created. Stays set after destruction.
    pub fn handle(&self) -> Option<WindowHandle> {
        self.shared.handle.get()
    }

    /// Frames started by `pump`, the current one included.
    pub fn frame(&self) -> u64 {
        self.shared.frame.get()
    }

    /// Destroys the window once the current hook returns.
    pub fn request_close(&self) {
        self.shared.close_requested.set(true);
    }
}

/// Routes OS messages for one window to the hooks.
struct Dispatcher<H> {
    hooks: RefCell<H>,
    shared: Shared,
}

impl<H: EngineHooks> Dispatcher<H> {
    fn invoke<F>(&self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut H, &Lifecycle),
    {
        match self.hooks.try_borrow_mut() {
            Ok(mut hooks) => {
                f(
                    &mut hooks,
                    &Lifecycle {
                        shared: &self.shared,
                    },
                );
                true
            }
            Err(_) => {
                warn!("Re-entrant {} notification dropped", name);
                false
            }
        }
    }

    fn destroy(&self, handle: WindowHandle) -> MessageResult {
        if self.shared.destroyed.replace(true) {
            warn!("Spurious destroy notification for {}", handle);
            return MessageResult::Processed;
        }

        debug!("Window {} destroyed", handle);
        if !self.invoke("destroy", |hooks, lifecycle| hooks.on_destroy(lifecycle)) {
            self.shared.state.set(EngineState::Stopped);
        }

        MessageResult::Quit(0)
    }
}

impl<H: EngineHooks> MessageSink for Dispatcher<H> {
    fn handle_message(&self, message: &WindowMessage) -> MessageResult {
        match message.kind() {
            MessageKind::Create => {
                debug!("Window {} created", message.handle);
                self.shared.handle.set(Some(message.handle));
                self.invoke("create", |hooks, lifecycle| hooks.on_create(lifecycle));
                MessageResult::Processed
            }
            MessageKind::Destroy => self.destroy(message.handle),
            _ => MessageResult::Ignored,
        }
    }
}

/// Owns one native window and drives its event loop.
///
/// The caller runs the loop: `init`, then `pump` while `is_running`, then
/// `release`.
pub struct WindowEngine<H> {
    builder: WindowBuilder,
    platform: Box<dyn Platform>,
    dispatcher: Rc<Dispatcher<H>>,
}

impl<H> WindowEngine<H>
where
    H: EngineHooks + 'static,
{
    pub fn with_platform(
        hooks: H,
        builder: WindowBuilder,
        platform: Box<dyn Platform>,
    ) -> WindowEngine<H> {
        WindowEngine {
            builder,
            platform,
            dispatcher: Rc::new(Dispatcher {
                hooks: RefCell::new(hooks),
                shared: Shared::new(),
            }),
        }
    }

    #[cfg(windows)]
    pub fn native(hooks: H, builder: WindowBuilder) -> WindowEngine<H> {
        WindowEngine::with_platform(
            hooks,
            builder,
            Box::new(crate::ui::win32::Win32Platform::new()),
        )
    }

    /// Registers the window class, creates and shows the window, and enters
    /// the running state.
    pub fn init(&mut self) -> Result<(), WindowError> {
        self.platform.register_class(&self.builder)?;

        let sink: Rc<dyn MessageSink> = self.dispatcher.clone();
        let handle = self.platform.create_window(&self.builder, sink)?;
        self.platform.show(handle);

        let shared = &self.dispatcher.shared;
        if shared.state.get() == EngineState::Uninitialized {
            shared.state.set(EngineState::Running);
        }
        self.process_close_request();

        info!(
            "Window {} \"{}\" is running",
            handle,
            self.builder.window_title()
        );

        Ok(())
    }

    /// Processes one frame: queued messages, then `on_update`. Always `true`.
    pub fn pump(&mut self) -> bool {
        let wait = self.builder.window_pump_mode() == PumpMode::Wait;
        if wait && self.is_running() && self.handle().is_some() {
            self.platform.wait_message();
        }

        let status = self.platform.pump_messages();
        if let Some(code) = status.quit {
            debug!("Quit signal received with code {}", code);
        }

        let shared = &self.dispatcher.shared;
        shared.frame.set(shared.frame.get() + 1);
        self.dispatcher
            .invoke("update", |hooks, lifecycle| hooks.on_update(lifecycle));
        self.process_close_request();

        if let PumpMode::Poll(delay) = self.builder.window_pump_mode() {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        true
    }

    /// Destroys the window. The state is left as is; a window the OS already
    /// destroyed counts as released.
    pub fn release(&mut self) -> Result<(), WindowError> {
        match self.dispatcher.shared.handle.get() {
            Some(handle) if self.platform.is_window(handle) => {
                self.platform.destroy_window(handle)?;
                debug!("Window {} released", handle);
                Ok(())
            }
            Some(handle) => {
                debug!("Window {} already destroyed, nothing to release", handle);
                Ok(())
            }
            None => Err(WindowError::invalid_handle(WindowOperation::Destroy)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    pub fn state(&self) -> EngineState {
        self.dispatcher.shared.state.get()
    }

    /// The live window, if any.
    pub fn handle(&self) -> Option<WindowHandle> {
        self.dispatcher
            .shared
            .handle
            .get()
            .filter(|handle| self.platform.is_window(*handle))
    }

    /// Frames started by `pump`. While `on_update` runs, the current frame is
    /// already counted.
    pub fn frame(&self) -> u64 {
        self.dispatcher.shared.frame.get()
    }

    pub fn hooks(&self) -> Ref<'_, H> {
        self.dispatcher.hooks.borrow()
    }

    pub fn hooks_mut(&self) -> RefMut<'_, H> {
        self.dispatcher.hooks.borrow_mut()
    }

    fn process_close_request(&mut self) {
        let shared = &self.dispatcher.shared;
        if !shared.close_requested.replace(false) {
            return;
        }

        if let Some(handle) = self.handle() {
            info!("Closing window {} on request", handle);
            if let Err(e) = self.platform.destroy_window(handle) {
                warn!("{}", e);
            }
        }
    }
}
