//! Windows low-level keyboard hook implementation.
//!
//! This module installs a `WH_KEYBOARD_LL` hook using the Windows API.  The
//! hook procedure runs on the thread that installed it, inside that thread's
//! `GetMessageW` call, so the same thread must keep calling
//! [`HookApi::next_message`] for events to arrive.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::ffi::c_void;

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT,
    WM_SYSKEYDOWN,
};

use keytap_core::event::{self, RawKeyEvent};

use super::{HookApi, HookError, HookHandle, MessageStatus};
use crate::application::capture;

// The hook procedure reads l_param as a RawKeyEvent.
const _: () = assert!(std::mem::size_of::<KBDLLHOOKSTRUCT>() == std::mem::size_of::<RawKeyEvent>());
const _: () = assert!(std::mem::align_of::<KBDLLHOOKSTRUCT>() == std::mem::align_of::<RawKeyEvent>());
const _: () = assert!(WM_KEYDOWN == event::WM_KEYDOWN);
const _: () = assert!(WM_SYSKEYDOWN == event::WM_SYSKEYDOWN);
const _: () = assert!(WH_KEYBOARD_LL.0 == event::WH_KEYBOARD_LL);

/// Win32 hook backend.
#[derive(Debug, Default)]
pub struct WindowsHookApi;

impl WindowsHookApi {
    pub fn new() -> Self {
        Self
    }
}

fn to_hhook(handle: HookHandle) -> HHOOK {
    HHOOK(handle.raw() as *mut c_void)
}

impl HookApi for WindowsHookApi {
    fn install(&self) -> Result<HookHandle, HookError> {
        // SAFETY: keyboard_hook_proc has the HOOKPROC signature and lives for
        // the whole program.  A null module handle is accepted for low-level
        // hooks whose procedure is in the calling process.
        let hook = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) }
            .map_err(|e| HookError::InstallFailed(e.to_string()))?;

        Ok(HookHandle::new(hook.0 as usize))
    }

    fn call_next(
        &self,
        handle: Option<HookHandle>,
        n_code: i32,
        w_param: usize,
        l_param: isize,
    ) -> isize {
        // SAFETY: the arguments are passed through unchanged from the hook
        // procedure invocation currently running on this thread.
        let result = unsafe {
            CallNextHookEx(handle.map(to_hhook), n_code, WPARAM(w_param), LPARAM(l_param))
        };
        result.0
    }

    fn uninstall(&self, handle: HookHandle) -> Result<(), HookError> {
        // SAFETY: UnhookWindowsHookEx validates the handle and reports failure
        // for stale or foreign handles instead of faulting.
        unsafe { UnhookWindowsHookEx(to_hhook(handle)) }
            .map_err(|e| HookError::UninstallFailed(e.to_string()))
    }

    fn next_message(&self) -> Result<MessageStatus, HookError> {
        let mut msg = MSG::default();

        // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern; msg
        // is a valid, writable MSG.
        let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };

        match ret.0 {
            -1 => Err(HookError::MessageLoop(
                std::io::Error::last_os_error().to_string(),
            )),
            0 => Ok(MessageStatus::Quit),
            _ => {
                // SAFETY: msg was filled in by GetMessageW above.
                unsafe {
                    DispatchMessageW(&msg);
                }
                Ok(MessageStatus::Message)
            }
        }
    }

    fn current_thread_id(&self) -> u32 {
        // SAFETY: GetCurrentThreadId has no preconditions.
        unsafe { GetCurrentThreadId() }
    }

    fn post_quit(&self, thread_id: u32) -> Result<(), HookError> {
        // SAFETY: PostThreadMessageW only enqueues; an unknown thread id is
        // reported as an error.
        unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }.map_err(|e| {
            HookError::PostQuitFailed {
                thread_id,
                reason: e.to_string(),
            }
        })
    }
}

/// Low-level keyboard hook procedure.
///
/// # Safety
///
/// Called by Windows from the hook thread's message loop.  `l_param` points to
/// a `KBDLLHOOKSTRUCT` when `n_code == HC_ACTION`.  Must return quickly
/// (< ~300ms) to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    // SAFETY: forwarding the OS-provided arguments; see the function contract.
    match unsafe { capture::dispatch(n_code, w_param.0, l_param.0) } {
        Some(result) => LRESULT(result),
        // No runner bound to this thread: stay transparent in the chain.
        None => unsafe { CallNextHookEx(None, n_code, w_param, l_param) },
    }
}
