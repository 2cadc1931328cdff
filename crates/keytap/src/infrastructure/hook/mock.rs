//! Mock hook backend for testing.
//!
//! [`MockHookApi`] stands in for the Win32 hook API.  Tests script events with
//! [`MockHookApi::key_down`] and friends; the hook thread's message loop picks
//! them up in [`HookApi::next_message`] and runs them through
//! [`capture::dispatch`] exactly as the Windows trampoline would, with the
//! event record living on the hook thread's stack for the duration of the call.
//!
//! Every API call is recorded so tests can assert on installs, forwards and
//! removals.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use keytap_core::event::HC_ACTION;
use keytap_core::{HookMessage, RawKeyEvent};

use super::{HookApi, HookError, HookHandle, MessageStatus};
use crate::application::capture;

/// A recorded call on the mock API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    Install,
    CallNext {
        handle: Option<HookHandle>,
        n_code: i32,
        w_param: usize,
    },
    Uninstall(HookHandle),
    PostQuit(u32),
}

#[derive(Debug, Clone, Copy)]
enum Scripted {
    Key {
        n_code: i32,
        message: HookMessage,
        event: RawKeyEvent,
    },
    Message,
    Quit,
    Failure,
}

struct MockState {
    install_failure: Option<String>,
    uninstall_failure: Option<String>,
    next_handle: usize,
    installed: Option<HookHandle>,
    script: VecDeque<Scripted>,
    calls: Vec<HookCall>,
    forward_result: isize,
    hook_results: Vec<isize>,
    processed: usize,
}

/// A scripted implementation of [`HookApi`].
pub struct MockHookApi {
    state: Mutex<MockState>,
    changed: Condvar,
}

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static MOCK_THREAD_ID: Cell<u32> = const { Cell::new(0) };
}

impl MockHookApi {
    /// Creates a mock whose install succeeds.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                install_failure: None,
                uninstall_failure: None,
                next_handle: 0x1000,
                installed: None,
                script: VecDeque::new(),
                calls: Vec::new(),
                forward_result: 0,
                hook_results: Vec::new(),
                processed: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Creates a mock whose install is refused with `reason`.
    pub fn failing_install(reason: &str) -> Self {
        let mock = Self::new();
        mock.lock().install_failure = Some(reason.to_string());
        mock
    }

    /// Makes the next uninstall fail with `reason`.
    pub fn fail_uninstall(&self, reason: &str) {
        self.lock().uninstall_failure = Some(reason.to_string());
    }

    /// Sets the value the "next hook in the chain" returns.
    pub fn set_forward_result(&self, result: isize) {
        self.lock().forward_result = result;
    }

    /// Scripts a `WM_KEYDOWN` for `vk_code`.
    pub fn key_down(&self, vk_code: u32) {
        self.inject(HC_ACTION, HookMessage::KeyDown, RawKeyEvent::with_vk(vk_code));
    }

    /// Scripts a `WM_KEYUP` for `vk_code`.
    pub fn key_up(&self, vk_code: u32) {
        self.inject(HC_ACTION, HookMessage::KeyUp, RawKeyEvent::with_vk(vk_code));
    }

    /// Scripts an arbitrary hook invocation.
    pub fn inject(&self, n_code: i32, message: HookMessage, event: RawKeyEvent) {
        self.push(Scripted::Key {
            n_code,
            message,
            event,
        });
    }

    /// Scripts a non-keyboard thread message.
    pub fn post_message(&self) {
        self.push(Scripted::Message);
    }

    /// Scripts a `GetMessageW` failure.
    pub fn fail_next_message(&self) {
        self.push(Scripted::Failure);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<HookCall> {
        self.lock().calls.clone()
    }

    /// The value the hook procedure returned for each scripted key event.
    pub fn hook_results(&self) -> Vec<isize> {
        self.lock().hook_results.clone()
    }

    /// The currently installed handle, if any.
    pub fn installed(&self) -> Option<HookHandle> {
        self.lock().installed
    }

    /// Waits until `count` scripted items have been consumed by the message loop.
    ///
    /// Returns `false` on timeout.
    pub fn wait_processed(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.processed < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    fn push(&self, item: Scripted) {
        self.lock().script.push_back(item);
        self.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_item(&self, hook_result: Option<isize>) {
        let mut state = self.lock();
        if let Some(result) = hook_result {
            state.hook_results.push(result);
        }
        state.processed += 1;
        drop(state);
        self.changed.notify_all();
    }
}

impl Default for MockHookApi {
    fn default() -> Self {
        Self::new()
    }
}

impl HookApi for MockHookApi {
    fn install(&self) -> Result<HookHandle, HookError> {
        let mut state = self.lock();
        state.calls.push(HookCall::Install);

        if let Some(reason) = state.install_failure.clone() {
            return Err(HookError::InstallFailed(reason));
        }

        let handle = HookHandle::new(state.next_handle);
        state.next_handle += 1;
        state.installed = Some(handle);
        Ok(handle)
    }

    fn call_next(
        &self,
        handle: Option<HookHandle>,
        n_code: i32,
        w_param: usize,
        _l_param: isize,
    ) -> isize {
        let mut state = self.lock();
        state.calls.push(HookCall::CallNext {
            handle,
            n_code,
            w_param,
        });
        state.forward_result
    }

    fn uninstall(&self, handle: HookHandle) -> Result<(), HookError> {
        let mut state = self.lock();
        state.calls.push(HookCall::Uninstall(handle));

        if state.installed != Some(handle) {
            return Err(HookError::UninstallFailed("invalid hook handle".to_string()));
        }
        if let Some(reason) = state.uninstall_failure.take() {
            return Err(HookError::UninstallFailed(reason));
        }

        state.installed = None;
        Ok(())
    }

    fn next_message(&self) -> Result<MessageStatus, HookError> {
        let item = {
            let mut state = self.lock();
            loop {
                if let Some(item) = state.script.pop_front() {
                    break item;
                }
                state = self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        match item {
            Scripted::Key {
                n_code,
                message,
                event,
            } => {
                let w_param = message.to_w_param();
                let l_param = event.as_l_param();
                // SAFETY: `event` lives on this stack frame for the whole call.
                let result = unsafe { capture::dispatch(n_code, w_param, l_param) }
                    .unwrap_or_else(|| self.call_next(None, n_code, w_param, l_param));
                self.finish_item(Some(result));
                Ok(MessageStatus::Message)
            }
            Scripted::Message => {
                self.finish_item(None);
                Ok(MessageStatus::Message)
            }
            Scripted::Quit => {
                self.finish_item(None);
                Ok(MessageStatus::Quit)
            }
            Scripted::Failure => {
                self.finish_item(None);
                Err(HookError::MessageLoop("simulated GetMessage failure".to_string()))
            }
        }
    }

    fn current_thread_id(&self) -> u32 {
        MOCK_THREAD_ID.with(|id| {
            if id.get() == 0 {
                id.set(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
            }
            id.get()
        })
    }

    fn post_quit(&self, thread_id: u32) -> Result<(), HookError> {
        let mut state = self.lock();
        state.calls.push(HookCall::PostQuit(thread_id));
        state.script.push_back(Scripted::Quit);
        drop(state);
        self.changed.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_records_call_and_hands_out_handle() {
        // Arrange
        let mock = MockHookApi::new();

        // Act
        let handle = mock.install().expect("install should succeed");

        // Assert
        assert_eq!(mock.installed(), Some(handle));
        assert_eq!(mock.calls(), vec![HookCall::Install]);
    }

    #[test]
    fn test_failing_install_returns_error() {
        let mock = MockHookApi::failing_install("access denied");

        let result = mock.install();

        assert!(matches!(result, Err(HookError::InstallFailed(ref r)) if r == "access denied"));
        assert_eq!(mock.installed(), None);
    }

    #[test]
    fn test_uninstall_rejects_unknown_handle() {
        let mock = MockHookApi::new();

        let result = mock.uninstall(HookHandle::new(0xBAD));

        assert!(matches!(result, Err(HookError::UninstallFailed(_))));
    }

    #[test]
    fn test_uninstall_twice_fails_the_second_time() {
        let mock = MockHookApi::new();
        let handle = mock.install().unwrap();

        assert!(mock.uninstall(handle).is_ok());
        assert!(mock.uninstall(handle).is_err());
    }

    #[test]
    fn test_key_event_without_runner_is_forwarded() {
        // Arrange: no capture runner is bound to this thread.
        let mock = MockHookApi::new();
        mock.set_forward_result(42);
        mock.key_down(0x41);

        // Act
        let status = mock.next_message().unwrap();

        // Assert
        assert_eq!(status, MessageStatus::Message);
        assert_eq!(mock.hook_results(), vec![42]);
        assert_eq!(
            mock.calls(),
            vec![HookCall::CallNext {
                handle: None,
                n_code: HC_ACTION,
                w_param: 0x0100,
            }]
        );
    }

    #[test]
    fn test_post_quit_ends_message_loop() {
        let mock = MockHookApi::new();
        mock.post_message();
        mock.post_quit(7).unwrap();

        assert_eq!(mock.next_message().unwrap(), MessageStatus::Message);
        assert_eq!(mock.next_message().unwrap(), MessageStatus::Quit);
        assert!(mock.wait_processed(2, Duration::from_millis(10)));
        assert_eq!(mock.calls(), vec![HookCall::PostQuit(7)]);
    }

    #[test]
    fn test_scripted_failure_surfaces_as_message_loop_error() {
        let mock = MockHookApi::new();
        mock.fail_next_message();

        assert!(matches!(mock.next_message(), Err(HookError::MessageLoop(_))));
    }

    #[test]
    fn test_thread_ids_are_stable_per_thread_and_distinct_across_threads() {
        let mock = std::sync::Arc::new(MockHookApi::new());
        let here = mock.current_thread_id();
        assert_eq!(mock.current_thread_id(), here);

        let other = {
            let mock = std::sync::Arc::clone(&mock);
            std::thread::spawn(move || mock.current_thread_id()).join().unwrap()
        };
        assert_ne!(other, here);
    }
}
