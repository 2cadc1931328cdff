//! Low-level keyboard hook infrastructure.
//!
//! On Windows this installs a `WH_KEYBOARD_LL` hook on the thread that runs
//! the hook's message loop.  Every key event the OS dispatches runs the hook
//! procedure synchronously on that thread, which hands the event to
//! [`crate::application::capture::dispatch`] and forwards the result along
//! the hook chain.
//!
//! # Windows-Specific Implementation
//!
//! The hook procedure must complete within ~300ms or Windows will silently
//! remove the hook, and the installing thread must keep pumping messages or
//! no events are delivered at all.
//!
//! # Testability
//!
//! The [`HookApi`] trait is the seam between the capture runner and the OS.
//! Tests use [`mock::MockHookApi`], which replays scripted events through the
//! same dispatch path the Win32 trampoline uses.

use std::sync::Arc;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Opaque identifier of an installed hook (`HHOOK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(usize);

impl HookHandle {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

/// Outcome of one message-queue retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// A message was retrieved; keep pumping.
    Message,
    /// `WM_QUIT` was retrieved; the loop should end.
    Quit,
}

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),
    #[error("failed to remove keyboard hook: {0}")]
    UninstallFailed(String),
    #[error("message loop failed: {0}")]
    MessageLoop(String),
    #[error("failed to post quit message to hook thread {thread_id}: {reason}")]
    PostQuitFailed { thread_id: u32, reason: String },
    #[error("a keyboard hook is already installed on this thread")]
    AlreadyInstalled,
    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawn(String),
    #[error("hook thread panicked")]
    ThreadPanicked,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// The OS operations the capture runner needs.
///
/// All methods except [`post_quit`](HookApi::post_quit) are called on the
/// hook thread.
pub trait HookApi: Send + Sync {
    /// Inserts this backend's hook procedure into the low-level keyboard hook chain.
    fn install(&self) -> Result<HookHandle, HookError>;

    /// Passes an event to the next hook in the chain and returns its result.
    fn call_next(
        &self,
        handle: Option<HookHandle>,
        n_code: i32,
        w_param: usize,
        l_param: isize,
    ) -> isize;

    /// Removes a hook installed by [`install`](HookApi::install).
    fn uninstall(&self, handle: HookHandle) -> Result<(), HookError>;

    /// Blocks until the calling thread's queue yields a message.
    fn next_message(&self) -> Result<MessageStatus, HookError>;

    /// Identifier of the calling thread, used to address [`post_quit`](HookApi::post_quit).
    fn current_thread_id(&self) -> u32;

    /// Posts `WM_QUIT` to `thread_id`, ending its message loop.
    fn post_quit(&self, thread_id: u32) -> Result<(), HookError>;
}

/// Returns the hook backend for the current platform.
///
/// # Errors
///
/// Returns [`HookError::UnsupportedPlatform`] outside Windows; low-level
/// keyboard hooks are a Win32 facility.
pub fn platform_hook_api() -> Result<Arc<dyn HookApi>, HookError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsHookApi::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(HookError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
