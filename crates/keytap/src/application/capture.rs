//! Keyboard capture: hook lifecycle and the per-event callback.
//!
//! [`start_capture`] spawns the dedicated hook thread.  On that thread a
//! [`HookRunner`] binds a [`HookContext`] (the hook handle plus the key queue
//! sender), installs the hook, pumps messages until `WM_QUIT`, and removes the
//! hook again:
//!
//! ```text
//! Uninstalled ──install()──► Installed ──message loop ends──► Uninstalled
//! ```
//!
//! The OS calls the hook procedure as a bare `extern "system"` function with
//! no user-data pointer.  Because a low-level hook procedure always runs on
//! the thread that installed it, the runner parks its context in a
//! thread-local slot for the lifetime of the hook and [`dispatch`] looks it up
//! there.  The context never crosses threads, so the handle needs no lock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use keytap_core::event::HC_ACTION;
use keytap_core::{HookMessage, KeyCode, KeySender, PushOutcome, RawKeyEvent};
use tracing::{debug, error, info, trace, warn};

use crate::infrastructure::hook::{HookApi, HookError, HookHandle, MessageStatus};

thread_local! {
    static ACTIVE_HOOK: RefCell<Option<Rc<HookContext>>> = const { RefCell::new(None) };
}

/// Name of the dedicated hook thread.
pub const HOOK_THREAD_NAME: &str = "keytap-hook";

/// Capture behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureOptions {
    /// Also capture `WM_SYSKEYDOWN` (keys pressed while ALT is held, F10).
    pub include_system_keys: bool,
}

/// Lifecycle state of a [`HookRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Uninstalled,
    Installed,
}

/// Everything the hook procedure needs for one installed hook.
pub struct HookContext {
    api: Arc<dyn HookApi>,
    handle: Cell<Option<HookHandle>>,
    sender: KeySender,
    options: CaptureOptions,
}

impl HookContext {
    pub fn new(api: Arc<dyn HookApi>, sender: KeySender, options: CaptureOptions) -> Self {
        Self {
            api,
            handle: Cell::new(None),
            sender,
            options,
        }
    }

    /// Handles one hook invocation and returns the hook chain's result.
    ///
    /// A key press pushes exactly one [`KeyCode`]; every other event pushes
    /// nothing.  The event is always forwarded to the next hook.
    ///
    /// # Safety
    ///
    /// When `n_code == HC_ACTION` and `w_param` is a key press, a non-zero
    /// `l_param` must point to a valid `KBDLLHOOKSTRUCT` for the duration of
    /// the call.
    pub unsafe fn handle_event(&self, n_code: i32, w_param: usize, l_param: isize) -> isize {
        if n_code == HC_ACTION {
            let message = HookMessage::from_w_param(w_param);
            if message.is_press(self.options.include_system_keys) {
                // SAFETY: upheld by the caller; the record is copied out here.
                if let Some(event) = unsafe { RawKeyEvent::from_l_param(l_param) } {
                    self.deliver(message, &event);
                }
            }
        }

        self.api.call_next(self.handle.get(), n_code, w_param, l_param)
    }

    fn deliver(&self, message: HookMessage, event: &RawKeyEvent) {
        let code = KeyCode::from_vk(event.vk_code);

        match self.sender.push(code) {
            PushOutcome::Queued => trace!(
                ?message,
                vk_code = event.vk_code,
                scan_code = event.scan_code,
                extended = event.is_extended(),
                injected = event.is_injected(),
                alt_down = event.is_alt_down(),
                time_ms = event.time,
                "key press queued"
            ),
            PushOutcome::DroppedNewest => {
                warn!(key = %code, "key queue full, dropped incoming key")
            }
            PushOutcome::DroppedOldest(evicted) => {
                warn!(key = %code, evicted = %evicted, "key queue full, dropped oldest key")
            }
            PushOutcome::Closed => debug!(key = %code, "key queue closed, key discarded"),
        }
    }
}

/// Runs the hook procedure for the context bound to the calling thread.
///
/// Returns `None` when no [`HookRunner`] has a hook installed on this thread;
/// the caller must then forward the event itself.
///
/// # Safety
///
/// Same contract as [`HookContext::handle_event`].
pub unsafe fn dispatch(n_code: i32, w_param: usize, l_param: isize) -> Option<isize> {
    // Clone the Rc out so the slot is not borrowed while the handler runs.
    let context = ACTIVE_HOOK.with(|slot| slot.borrow().clone())?;
    // SAFETY: forwarded from the caller.
    Some(unsafe { context.handle_event(n_code, w_param, l_param) })
}

/// Owns a hook on the current thread.
///
/// Not `Send`: a low-level hook is tied to the thread that installed it.
pub struct HookRunner {
    context: Rc<HookContext>,
    state: HookState,
}

impl HookRunner {
    pub fn new(api: Arc<dyn HookApi>, sender: KeySender, options: CaptureOptions) -> Self {
        Self {
            context: Rc::new(HookContext::new(api, sender, options)),
            state: HookState::Uninstalled,
        }
    }

    pub fn state(&self) -> HookState {
        self.state
    }

    /// Identifier of the calling thread as seen by the hook API.
    pub fn thread_id(&self) -> u32 {
        self.context.api.current_thread_id()
    }

    /// Installs the hook and binds this runner's context to the current thread.
    ///
    /// # Errors
    ///
    /// [`HookError::AlreadyInstalled`] if this runner or another one already
    /// owns a hook on this thread; [`HookError::InstallFailed`] if the OS
    /// refuses the hook.  Nothing stays bound on error.
    pub fn install(&mut self) -> Result<HookHandle, HookError> {
        if self.state == HookState::Installed {
            return Err(HookError::AlreadyInstalled);
        }

        // Bind before installing so the very first event finds the context.
        ACTIVE_HOOK.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(HookError::AlreadyInstalled);
            }
            *slot = Some(Rc::clone(&self.context));
            Ok(())
        })?;

        match self.context.api.install() {
            Ok(handle) => {
                self.context.handle.set(Some(handle));
                self.state = HookState::Installed;
                info!(handle = handle.raw(), "keyboard hook installed");
                Ok(handle)
            }
            Err(e) => {
                self.unbind();
                error!("keyboard hook installation refused: {e}");
                Err(e)
            }
        }
    }

    /// Pumps the thread's message queue until `WM_QUIT`.
    ///
    /// Hook events are delivered from inside this loop.
    pub fn run_message_loop(&self) -> Result<(), HookError> {
        let mut messages: u64 = 0;
        loop {
            match self.context.api.next_message()? {
                MessageStatus::Message => messages += 1,
                MessageStatus::Quit => {
                    debug!(messages, "message loop received WM_QUIT");
                    return Ok(());
                }
            }
        }
    }

    /// Removes the hook.  Calling it again, or without a hook, is a no-op.
    ///
    /// # Errors
    ///
    /// [`HookError::UninstallFailed`] if the OS rejects the removal.  The
    /// runner is `Uninstalled` afterwards either way.
    pub fn uninstall(&mut self) -> Result<(), HookError> {
        let Some(handle) = self.context.handle.take() else {
            return Ok(());
        };
        self.state = HookState::Uninstalled;

        let result = self.context.api.uninstall(handle);
        self.unbind();

        match &result {
            Ok(()) => info!(handle = handle.raw(), "keyboard hook removed"),
            Err(e) => warn!(handle = handle.raw(), "failed to remove keyboard hook: {e}"),
        }
        result
    }

    /// Pumps messages until `WM_QUIT` or a loop failure, then uninstalls.
    ///
    /// A message loop error takes precedence over an uninstall error; the
    /// hook is removed either way.
    pub fn pump_and_uninstall(mut self) -> Result<(), HookError> {
        let loop_result = self.run_message_loop();
        if let Err(e) = &loop_result {
            error!("hook message loop ended: {e}");
        }
        let unhook_result = self.uninstall();
        loop_result.and(unhook_result)
    }

    fn unbind(&self) {
        ACTIVE_HOOK.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot
                .as_ref()
                .is_some_and(|bound| Rc::ptr_eq(bound, &self.context))
            {
                *slot = None;
            }
        });
    }
}

impl Drop for HookRunner {
    fn drop(&mut self) {
        // Errors are already logged by uninstall().
        let _ = self.uninstall();
        self.unbind();
    }
}

/// Handle to a running capture session on the hook thread.
pub struct CaptureHandle {
    api: Arc<dyn HookApi>,
    thread_id: u32,
    join: Option<JoinHandle<Result<(), HookError>>>,
}

impl CaptureHandle {
    /// Hook thread identifier (the `WM_QUIT` target).
    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }

    /// Ends the message loop, waits for the hook to be removed, and returns
    /// the hook thread's result.
    pub fn stop(mut self) -> Result<(), HookError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), HookError> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        if let Err(e) = self.api.post_quit(self.thread_id) {
            // The thread may have ended on its own in the meantime.
            if !join.is_finished() {
                error!("cannot stop hook thread: {e}");
                return Err(e);
            }
        }

        debug!(thread_id = self.thread_id, "waiting for hook thread");
        join.join().map_err(|_| HookError::ThreadPanicked)?
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("hook thread did not shut down cleanly: {e}");
        }
    }
}

/// Starts keyboard capture on a dedicated hook thread.
///
/// Blocks until the hook is installed (or refused).  Codes of captured key
/// presses are pushed to `sender`; the sender is dropped, closing the queue,
/// when the hook thread ends.
///
/// # Errors
///
/// The install error if the OS refuses the hook; there is no retry.
/// [`HookError::ThreadSpawn`] if the thread cannot be created.
pub fn start_capture(
    api: Arc<dyn HookApi>,
    sender: KeySender,
    options: CaptureOptions,
) -> Result<CaptureHandle, HookError> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, HookError>>();
    let thread_api = Arc::clone(&api);

    let join = thread::Builder::new()
        .name(HOOK_THREAD_NAME.to_string())
        .spawn(move || {
            let mut runner = HookRunner::new(thread_api, sender, options);

            if let Err(e) = runner.install() {
                let _ = ready_tx.send(Err(e));
                return Ok(());
            }
            let _ = ready_tx.send(Ok(runner.thread_id()));

            runner.pump_and_uninstall()
        })
        .map_err(|e| HookError::ThreadSpawn(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(thread_id)) => {
            debug!(thread_id, "hook thread running");
            Ok(CaptureHandle {
                api,
                thread_id,
                join: Some(join),
            })
        }
        Ok(Err(e)) => {
            let _ = join.join();
            Err(e)
        }
        // The thread died before reporting back.
        Err(_) => match join.join() {
            Ok(Err(e)) => Err(e),
            _ => Err(HookError::ThreadPanicked),
        },
    }
}
