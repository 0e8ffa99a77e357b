use std::{collections::HashMap, ffi::c_void, mem, rc::Rc};

use log::{debug, warn};
use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::*, Graphics::Gdi::*, System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::*,
    },
};

use crate::{
    ui::{
        platform::{MessageSink, Platform, PumpStatus},
        window::{
            MessageResult, WindowBuilder, WindowError, WindowHandle, WindowMessage,
            WindowOperation,
        },
    },
    utf16z,
};

// Boxed so the fat `Rc<dyn MessageSink>` sits behind a thin pointer that fits
// the window's user-data slot.
type SinkSlot = Rc<dyn MessageSink>;

fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn last_error() -> u32 {
    unsafe { GetLastError().0 }
}

// Unwraps FACILITY_WIN32 results back to the plain Win32 error code.
fn error_code(e: &windows::core::Error) -> u32 {
    let hr = e.code().0 as u32;
    if hr & 0xffff_0000 == 0x8007_0000 {
        hr & 0xffff
    } else {
        hr
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_NCCREATE {
        let cs = lparam.0 as *const CREATESTRUCTW;
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, (*cs).lpCreateParams as isize);
    }

    let slot = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const SinkSlot;
    if slot.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let message = WindowMessage::new(to_handle(hwnd), msg, wparam.0, lparam.0);
    let result = match (*slot).handle_message(&message) {
        MessageResult::Processed => LRESULT(0),
        MessageResult::Ignored => DefWindowProcW(hwnd, msg, wparam, lparam),
        MessageResult::Value(value) => LRESULT(value),
        MessageResult::Quit(code) => {
            PostQuitMessage(code);
            LRESULT(0)
        }
    };

    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
    }

    result
}

/// Native backend over the Win32 windowing API.
///
/// Each window's sink is owned here and reached from `window_proc` through
/// `GWLP_USERDATA`.
pub struct Win32Platform {
    instance: HINSTANCE,
    sinks: HashMap<isize, Box<SinkSlot>>,
}

impl Default for Win32Platform {
    fn default() -> Self {
        Win32Platform::new()
    }
}

impl Win32Platform {
    pub fn new() -> Win32Platform {
        let instance = match unsafe { GetModuleHandleW(None) } {
            Ok(module) => module.into(),
            Err(e) => {
                warn!("Module handle unavailable, using NULL instance: {}", e);
                HINSTANCE::default()
            }
        };

        Win32Platform {
            instance,
            sinks: HashMap::new(),
        }
    }

    fn forget_dead_windows(&mut self) {
        self.sinks
            .retain(|hwnd, _| unsafe { IsWindow(HWND(*hwnd as *mut c_void)).as_bool() });
    }
}

// Windows still alive here point into `sinks`. Detach them before the slots
// go away, then destroy them without routing to the engines.
impl Drop for Win32Platform {
    fn drop(&mut self) {
        for &hwnd in self.sinks.keys() {
            let hwnd = HWND(hwnd as *mut c_void);
            unsafe {
                if !IsWindow(hwnd).as_bool() {
                    continue;
                }
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                if let Err(e) = DestroyWindow(hwnd) {
                    warn!("Orphaned window {} not destroyed: {}", to_handle(hwnd), e);
                }
            }
        }
    }
}

impl Platform for Win32Platform {
    fn register_class(&mut self, builder: &WindowBuilder) -> Result<(), WindowError> {
        let class = utf16z!(builder.class_name());

        let atom = unsafe {
            let wnd_class = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                style: WNDCLASS_STYLES(0),
                lpfnWndProc: Some(window_proc),
                cbClsExtra: 0,
                cbWndExtra: 0,
                hInstance: self.instance,
                hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as isize as *mut c_void),
                lpszMenuName: PCWSTR::null(),
                lpszClassName: PCWSTR(class.as_ptr()),
                hIconSm: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
            };
            RegisterClassExW(&wnd_class)
        };

        if atom == 0 {
            Err(WindowError::Registration {
                class: builder.class_name().to_owned(),
                code: last_error(),
            })
        } else {
            debug!("Registered window class {:?}", builder.class_name());
            Ok(())
        }
    }

    fn create_window(
        &mut self,
        builder: &WindowBuilder,
        sink: Rc<dyn MessageSink>,
    ) -> Result<WindowHandle, WindowError> {
        let class = utf16z!(builder.class_name());
        let title = utf16z!(builder.window_title());

        let style = if builder.style == 0 {
            WS_OVERLAPPEDWINDOW
        } else {
            WINDOW_STYLE(builder.style)
        };
        let extended_style = if builder.extended_style == 0 {
            WS_EX_OVERLAPPEDWINDOW
        } else {
            WINDOW_EX_STYLE(builder.extended_style)
        };
        let (x, y, width, height) = builder.window_geometry().unwrap_or(CW_USEDEFAULT);

        let slot: Box<SinkSlot> = Box::new(sink);
        let param = &*slot as *const SinkSlot as *const c_void;

        let hwnd = unsafe {
            CreateWindowExW(
                extended_style,
                PCWSTR(class.as_ptr()),
                PCWSTR(title.as_ptr()),
                style,
                x,
                y,
                width,
                height,
                None,
                None,
                self.instance,
                Some(param),
            )
        }
        .map_err(|e| WindowError::Operation {
            op: WindowOperation::Create,
            code: error_code(&e),
        })?;

        self.sinks.insert(hwnd.0 as isize, slot);
        Ok(to_handle(hwnd))
    }

    fn show(&mut self, handle: WindowHandle) {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_SHOW);
            let _ = UpdateWindow(to_hwnd(handle));
        }
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        self.sinks.contains_key(&handle.0) && unsafe { IsWindow(to_hwnd(handle)).as_bool() }
    }

    fn pump_messages(&mut self) -> PumpStatus {
        let mut status = PumpStatus::default();

        unsafe {
            let mut message = MSG::default();
            while PeekMessageW(&mut message, None, 0, 0, PM_REMOVE).as_bool() {
                if message.message == WM_QUIT {
                    status.quit = Some(message.wParam.0 as i32);
                    continue;
                }
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
                status.dispatched += 1;
            }
        }

        self.forget_dead_windows();
        status
    }

    fn wait_message(&mut self) {
        if let Err(e) = unsafe { WaitMessage() } {
            warn!("WaitMessage failed: {}", e);
        }
    }

    fn destroy_window(&mut self, handle: WindowHandle) -> Result<(), WindowError> {
        unsafe { DestroyWindow(to_hwnd(handle)) }.map_err(|e| WindowError::Operation {
            op: WindowOperation::Destroy,
            code: error_code(&e),
        })?;

        self.sinks.remove(&handle.0);
        Ok(())
    }

    fn post_quit(&mut self, code: i32) {
        unsafe { PostQuitMessage(code) }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::ui::window::MessageKind;

    #[derive(Default)]
    struct RecordingSink {
        seen: RefCell<Vec<MessageKind>>,
    }

    impl MessageSink for RecordingSink {
        fn handle_message(&self, message: &WindowMessage) -> MessageResult {
            self.seen.borrow_mut().push(message.kind());
            MessageResult::Ignored
        }
    }

    #[test]
    fn dropping_platform_detaches_and_destroys_live_windows() {
        let builder = WindowBuilder::window("Win32PlatformDropTest");
        let sink = Rc::new(RecordingSink::default());

        let hwnd = {
            let mut platform = Win32Platform::new();
            platform.register_class(&builder).unwrap();
            let handle = platform.create_window(&builder, sink.clone()).unwrap();
            assert!(platform.is_window(handle));
            to_hwnd(handle)
        };

        assert!(!unsafe { IsWindow(hwnd) }.as_bool());
        assert_eq!(Rc::strong_count(&sink), 1);
        assert!(sink.seen.borrow().contains(&MessageKind::Create));
        assert!(!sink.seen.borrow().contains(&MessageKind::Destroy));
    }

    #[test]
    fn destroyed_window_is_no_longer_live() {
        let builder = WindowBuilder::window("Win32PlatformLiveTest");
        let sink = Rc::new(RecordingSink::default());
        let mut platform = Win32Platform::new();
        platform.register_class(&builder).unwrap();
        let handle = platform.create_window(&builder, sink.clone()).unwrap();

        platform.destroy_window(handle).unwrap();

        assert!(!platform.is_window(handle));
        assert!(sink.seen.borrow().contains(&MessageKind::Destroy));
    }
}
