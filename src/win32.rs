//! Windows backend: raw bindings plus the message sink that feeds the
//! reactor.
#![allow(non_camel_case_types)]

use core::ffi::{c_int, c_void};
use core::mem::{size_of, MaybeUninit};
use core::ptr::{null, null_mut};
use tracing::{event, Level};

use crate::broadcast::{device_interface, DEV_BROADCAST_DEVICEINTERFACE_W, WCHAR};
use crate::classid::ClassId;
use crate::config::Config;
use crate::error::{Error, OsError};
use crate::event::{DeviceChangeKind, NotificationEvent, WM_DEVICECHANGE};
use crate::reactor::{Directive, Reactor, ReactorState};
use crate::subscription::{NotifyHandle, Platform, SinkHandle};

type HANDLE = *mut c_void;
type LPVOID = *mut c_void;
type HWND = HANDLE;
type HMENU = HANDLE;
type HINSTANCE = HANDLE;
type HMODULE = HANDLE;
type HDEVNOTIFY = HANDLE;
type DWORD = u32;
type LPCWSTR = *const WCHAR;
type INT = c_int;
type BOOL = c_int;
type UINT = u32;
type LRESULT = isize;
type ATOM = u16;
type HICON = HANDLE;
type HCURSOR = HICON;
type HBRUSH = HANDLE;
type UINT_PTR = usize;
type WPARAM = UINT_PTR;
type LONG_PTR = isize;
type LPARAM = LONG_PTR;
type LONG = i32;

type WNDPROC = Option<
    unsafe extern "system" fn(
        hwnd: HWND,
        Msg: UINT,
        wParam: WPARAM,
        lParam: LPARAM,
    ) -> LRESULT,
>;

const HWND_MESSAGE: HWND = -3isize as HWND;
const WM_NCCREATE: UINT = 0x0081;
const GWLP_USERDATA: c_int = -21;
const DEVICE_NOTIFY_WINDOW_HANDLE: DWORD = 0;

#[repr(C)]
#[allow(non_snake_case)]
struct WNDCLASSEXW {
    cbSize: UINT,
    style: UINT,
    lpfnWndProc: WNDPROC,
    cbClsExtra: c_int,
    cbWndExtra: c_int,
    hInstance: HINSTANCE,
    hIcon: HICON,
    hCursor: HCURSOR,
    hbrBackground: HBRUSH,
    lpszMenuName: LPCWSTR,
    lpszClassName: LPCWSTR,
    hIconSm: HICON,
}

#[repr(C)]
#[allow(non_snake_case, dead_code)]
struct CREATESTRUCTW {
    lpCreateParams: LPVOID,
    hInstance: HINSTANCE,
    hMenu: HMENU,
    hwndParent: HWND,
    cy: c_int,
    cx: c_int,
    y: c_int,
    x: c_int,
    style: LONG,
    lpszName: LPCWSTR,
    lpszClass: LPCWSTR,
    dwExStyle: DWORD,
}

#[repr(C)]
#[derive(Debug)]
#[allow(non_snake_case)]
struct MSG {
    hwnd: HWND,
    message: UINT,
    wParam: WPARAM,
    lParam: LPARAM,
    time: DWORD,
    pt: POINT,
    lPrivate: DWORD,
}

#[repr(C)]
#[derive(Debug)]
struct POINT {
    x: LONG,
    y: LONG,
}

#[link(name = "Kernel32")]
extern "system" {
    fn GetLastError() -> DWORD;
    fn GetModuleHandleW(lpModuleName: LPCWSTR) -> HMODULE;
    fn ExitProcess(uExitCode: UINT) -> !;
}

#[link(name = "User32")]
extern "system" {
    fn RegisterClassExW(lpWndClass: *const WNDCLASSEXW) -> ATOM;
    fn DefWindowProcW(
        hWnd: HWND,
        Msg: UINT,
        wParam: WPARAM,
        lParam: LPARAM,
    ) -> LRESULT;
    fn CreateWindowExW(
        dwExStyle: DWORD,
        lpClassName: LPCWSTR,
        lpWindowName: LPCWSTR,
        dwStyle: DWORD,
        X: INT,
        Y: INT,
        nWidth: INT,
        nHeight: INT,
        hWndParent: HWND,
        hMenu: HMENU,
        hInstance: HINSTANCE,
        lpParam: LPVOID,
    ) -> HWND;
    fn DestroyWindow(hWnd: HWND) -> BOOL;
    fn GetMessageW(
        lpMsg: *mut MSG,
        hWnd: HWND,
        wMsgFilterMin: UINT,
        wMsgFilterMax: UINT,
    ) -> BOOL;
    fn TranslateMessage(lpMsg: *const MSG) -> BOOL;
    fn DispatchMessageW(lpMsg: *const MSG) -> LRESULT;
    fn PostQuitMessage(nExitCode: c_int);
    #[cfg_attr(target_pointer_width = "32", link_name = "SetWindowLongW")]
    fn SetWindowLongPtrW(hWnd: HWND, nIndex: c_int, dwNewLong: LONG_PTR) -> LONG_PTR;
    #[cfg_attr(target_pointer_width = "32", link_name = "GetWindowLongW")]
    fn GetWindowLongPtrW(hWnd: HWND, nIndex: c_int) -> LONG_PTR;
    fn RegisterDeviceNotificationW(
        hRecipient: HANDLE,
        NotificationFilter: LPVOID,
        Flags: DWORD,
    ) -> HDEVNOTIFY;
    fn UnregisterDeviceNotification(Handle: HDEVNOTIFY) -> BOOL;
    fn LockWorkStation() -> BOOL;
}

/// Rust wrapper around GetLastError()
fn last_error() -> OsError {
    OsError(unsafe { GetLastError() })
}

fn wide(s: &str) -> Vec<WCHAR> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// The OS capabilities backed by User32.
#[derive(Debug, Default)]
pub struct Win32Platform;

impl Platform for Win32Platform {
    fn register(&mut self, sink: SinkHandle, class: &ClassId) -> Result<NotifyHandle, OsError> {
        let mut filter = DEV_BROADCAST_DEVICEINTERFACE_W::filter(class);

        let handle = unsafe {
            RegisterDeviceNotificationW(
                sink.0 as HWND,
                &mut filter as *mut _ as LPVOID,
                DEVICE_NOTIFY_WINDOW_HANDLE,
            )
        };
        if handle.is_null() {
            return Err(last_error());
        }
        Ok(NotifyHandle(handle as usize))
    }

    fn unregister(&mut self, handle: NotifyHandle) -> Result<(), OsError> {
        let res = unsafe { UnregisterDeviceNotification(handle.0 as HDEVNOTIFY) };
        if res == 0 {
            return Err(last_error());
        }
        Ok(())
    }

    fn lock_session(&mut self) -> Result<(), OsError> {
        let res = unsafe { LockWorkStation() };
        if res == 0 {
            return Err(last_error());
        }
        Ok(())
    }
}

unsafe fn classify(message: UINT, wparam: WPARAM, lparam: LPARAM) -> NotificationEvent {
    let interface = if message == WM_DEVICECHANGE
        && DeviceChangeKind::from(wparam).carries_broadcast()
    {
        device_interface(lparam)
    } else {
        None
    };
    NotificationEvent::decode(message, wparam, interface)
}

/// Window procedure of the sink. The reactor pointer arrives as creation
/// data and lives in the window's user data from then on.
unsafe extern "system" fn sink_proc(
    hwnd: HWND,
    message: UINT,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if message == WM_NCCREATE {
        let create = &*(lparam as *const CREATESTRUCTW);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as LONG_PTR);
        return DefWindowProcW(hwnd, message, wparam, lparam);
    }

    let reactor = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut Reactor<Win32Platform>;
    if reactor.is_null() {
        return DefWindowProcW(hwnd, message, wparam, lparam);
    }

    let notification = classify(message, wparam, lparam);
    let handled = notification.handled_result();
    // The borrow ends here, before any directive can re-enter this proc.
    let directive = (*reactor).handle(SinkHandle(hwnd as isize), notification);

    match directive {
        Directive::Handled => handled,
        Directive::PassThrough => DefWindowProcW(hwnd, message, wparam, lparam),
        Directive::DestroySink => {
            if DestroyWindow(hwnd) == 0 {
                event!(Level::WARN, "DestroyWindow {}", last_error());
            }
            handled
        }
        Directive::StopLoop => {
            PostQuitMessage(0);
            handled
        }
        Directive::ExitProcess(code) => ExitProcess(code),
    }
}

// Rust wrapper for GetModuleHandleW
fn get_module_handle_w() -> HMODULE {
    unsafe { GetModuleHandleW(null()) }
}

// Rust wrapper for RegisterClassExW
fn register_class_ex_w(class_name: &[WCHAR], h_instance: HINSTANCE) -> Result<ATOM, Error> {
    let window_class = WNDCLASSEXW {
        cbSize: size_of::<WNDCLASSEXW>() as UINT,
        style: 0,
        lpfnWndProc: Some(sink_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: h_instance,
        hIcon: null_mut(),
        hCursor: null_mut(),
        hbrBackground: null_mut(),
        lpszMenuName: null(),
        lpszClassName: class_name.as_ptr(),
        hIconSm: null_mut(),
    };

    let res = unsafe { RegisterClassExW(&window_class) };
    if res == 0 {
        let code = last_error();
        event!(Level::ERROR, "RegisterClassExW {code}");
        return Err(Error::SinkSetup {
            step: "RegisterClassExW",
            code,
        });
    }
    event!(Level::INFO, "RegisterClassExW {}", res);
    Ok(res)
}

// Rust wrapper for CreateWindowExW
fn create_window_ex_w(
    class_name: &[WCHAR],
    title: &[WCHAR],
    h_instance: HINSTANCE,
    reactor: *mut Reactor<Win32Platform>,
) -> Result<HWND, Error> {
    let handle = unsafe {
        CreateWindowExW(
            0,
            class_name.as_ptr(),
            title.as_ptr(),
            0,
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            null_mut(),
            h_instance,
            reactor as LPVOID,
        )
    };
    if handle.is_null() {
        let code = last_error();
        event!(Level::ERROR, "CreateWindowExW {code}");
        return Err(Error::SinkSetup {
            step: "CreateWindowExW",
            code,
        });
    }
    event!(Level::INFO, "CreateWindowExW handle: {:?}", handle);
    Ok(handle)
}

/// Blocking get/translate/dispatch loop over every window of this thread.
/// Returns once the quit message arrives or GetMessageW fails.
fn pump_messages() {
    let mut msg: MaybeUninit<MSG> = MaybeUninit::uninit();
    loop {
        let res = unsafe { GetMessageW(msg.as_mut_ptr(), null_mut(), 0, 0) };
        if res == -1 {
            event!(Level::ERROR, "GetMessageW {}", last_error());
            return;
        }
        if res == 0 {
            return;
        }
        unsafe {
            TranslateMessage(msg.as_ptr());
            DispatchMessageW(msg.as_ptr());
        }
    }
}

/// Create the sink, hand it to the reactor and pump until it is torn down.
pub fn run(config: &Config) -> Result<(), Error> {
    let class_name = wide(config.sink_class_name);
    let title = wide(config.sink_title);
    let h_instance = get_module_handle_w();

    register_class_ex_w(&class_name, h_instance)?;

    // Shared with the window procedure through the sink's user data; only
    // reclaimed once the pump has stopped.
    let reactor = Box::into_raw(Box::new(Reactor::new(Win32Platform, config.interface_class)));

    let handle = match create_window_ex_w(&class_name, &title, h_instance, reactor) {
        Ok(handle) => handle,
        Err(err) => {
            drop(unsafe { Box::from_raw(reactor) });
            return Err(err);
        }
    };

    pump_messages();

    // The pump can stop on an error with the sink still alive.
    if unsafe { (*reactor).state() } != ReactorState::Terminated {
        unsafe { DestroyWindow(handle) };
    }
    drop(unsafe { Box::from_raw(reactor) });
    event!(Level::INFO, "Sink {:?} torn down", handle);
    Ok(())
}
