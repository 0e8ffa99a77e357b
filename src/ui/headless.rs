//! In-process stand-in for the native windowing API.
//!
//! Windows are plain handles mapped to their message sinks; the queue is a FIFO
//! shared with a [`HeadlessQueue`] so callers can inject messages, force
//! failures and observe what the engine asked of the OS.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    rc::Rc,
};

use log::{debug, warn};

use crate::ui::{
    platform::{MessageSink, Platform, PumpStatus},
    window::{
        MessageKind, MessageResult, WindowBuilder, WindowError, WindowHandle, WindowMessage,
        WindowOperation, CLASS_ALREADY_EXISTS,
    },
};

const ACCESS_DENIED: u32 = 5;
const NOT_ENOUGH_MEMORY: u32 = 8;
const INVALID_PARAMETER: u32 = 87;
const CANNOT_FIND_WND_CLASS: u32 = 1407;

enum Queued {
    Window(WindowMessage),
    Quit(i32),
}

#[derive(Default)]
struct QueueState {
    messages: VecDeque<Queued>,
    quit_count: usize,
    exit_code: Option<i32>,
    fail_registration: bool,
    fail_creation: bool,
    fail_destroy: bool,
    shown: Vec<WindowHandle>,
    destroyed: Vec<WindowHandle>,
}

#[derive(Clone, Default)]
pub struct HeadlessQueue(Rc<RefCell<QueueState>>);

impl HeadlessQueue {
    pub fn post(&self, handle: WindowHandle, kind: MessageKind) {
        self.post_message(WindowMessage::new(handle, kind.raw(), 0, 0));
    }

    pub fn post_message(&self, message: WindowMessage) {
        self.0
            .borrow_mut()
            .messages
            .push_back(Queued::Window(message));
    }

    pub fn fail_registration(&self, flag: bool) {
        self.0.borrow_mut().fail_registration = flag;
    }

    pub fn fail_creation(&self, flag: bool) {
        self.0.borrow_mut().fail_creation = flag;
    }

    pub fn fail_destroy(&self, flag: bool) {
        self.0.borrow_mut().fail_destroy = flag;
    }

    /// Number of quit signals posted so far.
    pub fn quit_count(&self) -> usize {
        self.0.borrow().quit_count
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.0.borrow().exit_code
    }

    pub fn shown(&self) -> Vec<WindowHandle> {
        self.0.borrow().shown.clone()
    }

    /// Windows actually destroyed, in order.
    pub fn destroyed(&self) -> Vec<WindowHandle> {
        self.0.borrow().destroyed.clone()
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().messages.len()
    }

    fn pop(&self) -> Option<Queued> {
        self.0.borrow_mut().messages.pop_front()
    }
}

#[derive(Default)]
pub struct HeadlessPlatform {
    queue: HeadlessQueue,
    classes: HashSet<String>,
    windows: HashMap<WindowHandle, Rc<dyn MessageSink>>,
    next_handle: isize,
}

impl HeadlessPlatform {
    pub fn new() -> HeadlessPlatform {
        HeadlessPlatform::default()
    }

    pub fn queue(&self) -> HeadlessQueue {
        self.queue.clone()
    }

    fn dispatch(&mut self, message: WindowMessage) -> isize {
        let sink = match self.windows.get(&message.handle) {
            Some(sink) => sink.clone(),
            None => {
                debug!(
                    "Dropping {:?} for unknown window {}",
                    message.kind(),
                    message.handle
                );
                return 0;
            }
        };

        match sink.handle_message(&message) {
            MessageResult::Processed => 0,
            MessageResult::Value(value) => value,
            MessageResult::Quit(code) => {
                self.post_quit(code);
                0
            }
            MessageResult::Ignored => self.default_handler(message),
        }
    }

    fn default_handler(&mut self, message: WindowMessage) -> isize {
        if message.kind() == MessageKind::Close {
            if let Err(e) = self.destroy_window(message.handle) {
                warn!("{}", e);
            }
        }
        0
    }
}

impl Platform for HeadlessPlatform {
    fn register_class(&mut self, builder: &WindowBuilder) -> Result<(), WindowError> {
        let code = if self.queue.0.borrow().fail_registration {
            Some(INVALID_PARAMETER)
        } else if self.classes.contains(builder.class_name()) {
            Some(CLASS_ALREADY_EXISTS)
        } else {
            None
        };

        if let Some(code) = code {
            return Err(WindowError::Registration {
                class: builder.class_name().to_owned(),
                code,
            });
        }

        self.classes.insert(builder.class_name().to_owned());
        Ok(())
    }

    fn create_window(
        &mut self,
        builder: &WindowBuilder,
        sink: Rc<dyn MessageSink>,
    ) -> Result<WindowHandle, WindowError> {
        if !self.classes.contains(builder.class_name()) {
            return Err(WindowError::Operation {
                op: WindowOperation::Create,
                code: CANNOT_FIND_WND_CLASS,
            });
        }
        if self.queue.0.borrow().fail_creation {
            return Err(WindowError::Operation {
                op: WindowOperation::Create,
                code: NOT_ENOUGH_MEMORY,
            });
        }

        self.next_handle += 1;
        let handle = WindowHandle(self.next_handle);
        self.windows.insert(handle, sink);

        self.dispatch(WindowMessage::new(handle, MessageKind::Create.raw(), 0, 0));

        Ok(handle)
    }

    fn show(&mut self, handle: WindowHandle) {
        if self.is_window(handle) {
            self.queue.0.borrow_mut().shown.push(handle);
        }
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        self.windows.contains_key(&handle)
    }

    fn pump_messages(&mut self) -> PumpStatus {
        let mut status = PumpStatus::default();

        while let Some(next) = self.queue.pop() {
            match next {
                Queued::Window(message) => {
                    self.dispatch(message);
                    status.dispatched += 1;
                }
                Queued::Quit(code) => status.quit = Some(code),
            }
        }

        status
    }

    fn wait_message(&mut self) {
        // Nothing outside this thread can post, so an empty queue stays empty.
        if self.queue.pending() == 0 {
            debug!("Wait on an empty headless queue returns immediately");
        }
    }

    fn destroy_window(&mut self, handle: WindowHandle) -> Result<(), WindowError> {
        if self.queue.0.borrow().fail_destroy {
            return Err(WindowError::Operation {
                op: WindowOperation::Destroy,
                code: ACCESS_DENIED,
            });
        }
        if !self.is_window(handle) {
            return Err(WindowError::invalid_handle(WindowOperation::Destroy));
        }

        self.dispatch(WindowMessage::new(handle, MessageKind::Destroy.raw(), 0, 0));
        self.windows.remove(&handle);
        self.queue.0.borrow_mut().destroyed.push(handle);

        Ok(())
    }

    fn post_quit(&mut self, code: i32) {
        let mut state = self.queue.0.borrow_mut();
        state.messages.push_back(Queued::Quit(code));
        state.quit_count += 1;
        state.exit_code = Some(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        seen: RefCell<Vec<MessageKind>>,
    }

    impl MessageSink for RecordingSink {
        fn handle_message(&self, message: &WindowMessage) -> MessageResult {
            self.seen.borrow_mut().push(message.kind());
            match message.kind() {
                MessageKind::Destroy => MessageResult::Quit(3),
                MessageKind::Other(_) => MessageResult::Value(42),
                _ => MessageResult::Ignored,
            }
        }
    }

    fn create(platform: &mut HeadlessPlatform) -> (Rc<RecordingSink>, WindowHandle) {
        let builder = WindowBuilder::default();
        platform.register_class(&builder).unwrap();
        let sink = Rc::new(RecordingSink::default());
        let handle = platform.create_window(&builder, sink.clone()).unwrap();
        (sink, handle)
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let mut platform = HeadlessPlatform::new();
        let builder = WindowBuilder::window("Twice");
        platform.register_class(&builder).unwrap();

        let err = platform.register_class(&builder).unwrap_err();
        assert_eq!(err.code(), CLASS_ALREADY_EXISTS);
    }

    #[test]
    fn create_requires_registered_class() {
        let mut platform = HeadlessPlatform::new();
        let sink = Rc::new(RecordingSink::default());

        let err = platform
            .create_window(&WindowBuilder::window("Missing"), sink.clone())
            .unwrap_err();
        assert_eq!(
            err,
            WindowError::Operation {
                op: WindowOperation::Create,
                code: CANNOT_FIND_WND_CLASS
            }
        );
        assert!(sink.seen.borrow().is_empty());
    }

    #[test]
    fn create_notifies_synchronously() {
        let mut platform = HeadlessPlatform::new();
        let (sink, handle) = create(&mut platform);

        assert_eq!(*sink.seen.borrow(), vec![MessageKind::Create]);
        assert!(platform.is_window(handle));
    }

    #[test]
    fn close_falls_through_to_destroy() {
        let mut platform = HeadlessPlatform::new();
        let queue = platform.queue();
        let (sink, handle) = create(&mut platform);

        queue.post(handle, MessageKind::Close);
        let status = platform.pump_messages();

        assert_eq!(
            *sink.seen.borrow(),
            vec![MessageKind::Create, MessageKind::Close, MessageKind::Destroy]
        );
        assert!(!platform.is_window(handle));
        assert_eq!(queue.destroyed(), vec![handle]);
        assert_eq!(queue.quit_count(), 1);
        assert_eq!(status.quit, Some(3));
        assert_eq!(status.dispatched, 1);
    }

    #[test]
    fn messages_for_dead_windows_are_dropped() {
        let mut platform = HeadlessPlatform::new();
        let queue = platform.queue();
        let (sink, handle) = create(&mut platform);
        platform.destroy_window(handle).unwrap();

        queue.post(handle, MessageKind::Other(0x000f));
        platform.pump_messages();

        assert_eq!(
            *sink.seen.borrow(),
            vec![MessageKind::Create, MessageKind::Destroy]
        );
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn destroying_unknown_window_fails() {
        let mut platform = HeadlessPlatform::new();
        let err = platform.destroy_window(WindowHandle(77)).unwrap_err();
        assert_eq!(err, WindowError::invalid_handle(WindowOperation::Destroy));
    }

    #[test]
    fn show_records_live_windows_only() {
        let mut platform = HeadlessPlatform::new();
        let queue = platform.queue();
        let (_sink, handle) = create(&mut platform);

        platform.show(handle);
        platform.show(WindowHandle(999));

        assert_eq!(queue.shown(), vec![handle]);
    }
}
