//! Bounded key queue between the hook callback and the consumer.
//!
//! The producer side runs inside a `WH_KEYBOARD_LL` hook procedure, i.e. on
//! the system's synchronous input-dispatch path.  [`KeySender::push`] therefore
//! never waits for the consumer: when the queue is full the configured
//! [`OverflowPolicy`] drops either the incoming code or the oldest queued one,
//! and the drop is counted.
//!
//! The consumer side is async.  [`KeyReceiver::recv`] waits on a
//! [`tokio::sync::Notify`] and yields codes in push order.  It returns `None`
//! once every sender is gone (or the queue was closed) and the buffer is empty.
//!
//! `tokio::sync::mpsc::Sender::try_send` can only reject the incoming value
//! when full, so it cannot express [`OverflowPolicy::DropOldest`]; the ring
//! below is a `Mutex<VecDeque>` paired with a `Notify`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

use crate::keymap::KeyCode;

/// What to discard when a push finds the queue full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Keep the queued codes, discard the incoming one.
    #[default]
    DropNewest,
    /// Evict the oldest queued code to make room for the incoming one.
    DropOldest,
}

/// Result of a single [`KeySender::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The code was queued.
    Queued,
    /// The queue was full; the pushed code was discarded.
    DroppedNewest,
    /// The queue was full; the contained code was evicted and the pushed one queued.
    DroppedOldest(KeyCode),
    /// The receiver is gone or the queue was closed; the code was discarded.
    Closed,
}

/// Error type for queue construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Counters describing the queue's lifetime so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Codes accepted into the buffer.
    pub queued: u64,
    /// Codes discarded by the overflow policy.
    pub dropped: u64,
    /// Codes currently waiting for the consumer.
    pub pending: usize,
}

struct State {
    buf: VecDeque<KeyCode>,
    closed: bool,
    senders: usize,
    queued: u64,
    dropped: u64,
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl Shared {
    // A panic while holding the lock cannot leave `State` inconsistent, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            queued: state.queued,
            dropped: state.dropped,
            pending: state.buf.len(),
        }
    }
}

/// Creates a bounded key queue.
///
/// # Errors
///
/// Returns [`QueueError::ZeroCapacity`] when `capacity` is 0.
pub fn key_queue(
    capacity: usize,
    policy: OverflowPolicy,
) -> Result<(KeySender, KeyReceiver), QueueError> {
    if capacity == 0 {
        return Err(QueueError::ZeroCapacity);
    }
    debug!(capacity, ?policy, "key queue created");

    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buf: VecDeque::with_capacity(capacity),
            closed: false,
            senders: 1,
            queued: 0,
            dropped: 0,
        }),
        notify: Notify::new(),
        capacity,
        policy,
    });

    Ok((
        KeySender {
            shared: Arc::clone(&shared),
        },
        KeyReceiver { shared },
    ))
}

/// Producer half.  Cloneable; the queue closes when the last clone drops.
pub struct KeySender {
    shared: Arc<Shared>,
}

impl KeySender {
    /// Pushes `code` without blocking.
    pub fn push(&self, code: KeyCode) -> PushOutcome {
        let outcome = {
            let mut state = self.shared.lock();

            if state.closed {
                return PushOutcome::Closed;
            }

            if state.buf.len() < self.shared.capacity {
                state.buf.push_back(code);
                state.queued += 1;
                PushOutcome::Queued
            } else {
                state.dropped += 1;
                match self.shared.policy {
                    OverflowPolicy::DropNewest => return PushOutcome::DroppedNewest,
                    OverflowPolicy::DropOldest => {
                        let evicted = state.buf.pop_front();
                        state.buf.push_back(code);
                        state.queued += 1;
                        match evicted {
                            Some(old) => PushOutcome::DroppedOldest(old),
                            None => PushOutcome::Queued,
                        }
                    }
                }
            }
        };

        self.shared.notify.notify_one();
        outcome
    }

    /// `true` once the receiver has closed the queue or been dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }
}

impl Clone for KeySender {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for KeySender {
    fn drop(&mut self) {
        let last = {
            let mut state = self.shared.lock();
            state.senders -= 1;
            if state.senders == 0 {
                state.closed = true;
            }
            state.senders == 0
        };
        if last {
            debug!("last key sender dropped, queue closed");
            self.shared.notify.notify_one();
        }
    }
}

impl std::fmt::Debug for KeySender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySender")
            .field("capacity", &self.shared.capacity)
            .field("policy", &self.shared.policy)
            .finish_non_exhaustive()
    }
}

/// Consumer half.
pub struct KeyReceiver {
    shared: Arc<Shared>,
}

impl KeyReceiver {
    /// Waits for the next code.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<KeyCode> {
        loop {
            // Register interest before checking so a push between the check
            // and the await still wakes us.
            let notified = self.shared.notify.notified();

            {
                let mut state = self.shared.lock();
                if let Some(code) = state.buf.pop_front() {
                    return Some(code);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Takes the next code if one is already queued.
    pub fn try_recv(&mut self) -> Option<KeyCode> {
        self.shared.lock().buf.pop_front()
    }

    /// Closes the queue.  Later pushes return [`PushOutcome::Closed`]; codes
    /// already queued can still be received.
    pub fn close(&mut self) {
        self.shared.lock().closed = true;
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.shared.policy
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }
}

impl Drop for KeyReceiver {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for KeyReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyReceiver")
            .field("capacity", &self.shared.capacity)
            .field("policy", &self.shared.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn code(b: u8) -> KeyCode {
        KeyCode::new(b)
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = key_queue(0, OverflowPolicy::DropNewest);
        assert_eq!(result.err(), Some(QueueError::ZeroCapacity));
    }

    #[test]
    fn test_codes_come_out_in_push_order() {
        // Arrange
        let (tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();

        // Act
        for b in [0x42, 0x43, 0x41] {
            assert_eq!(tx.push(code(b)), PushOutcome::Queued);
        }

        // Assert
        assert_eq!(rx.try_recv(), Some(code(0x42)));
        assert_eq!(rx.try_recv(), Some(code(0x43)));
        assert_eq!(rx.try_recv(), Some(code(0x41)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_drop_newest_keeps_queued_codes() {
        // Arrange
        let (tx, mut rx) = key_queue(2, OverflowPolicy::DropNewest).unwrap();
        tx.push(code(1));
        tx.push(code(2));

        // Act
        let outcome = tx.push(code(3));

        // Assert
        assert_eq!(outcome, PushOutcome::DroppedNewest);
        assert_eq!(rx.try_recv(), Some(code(1)));
        assert_eq!(rx.try_recv(), Some(code(2)));
        assert_eq!(rx.try_recv(), None);
        assert_eq!(tx.stats().dropped, 1);
        assert_eq!(tx.stats().queued, 2);
    }

    #[test]
    fn test_drop_oldest_evicts_front_code() {
        // Arrange
        let (tx, mut rx) = key_queue(2, OverflowPolicy::DropOldest).unwrap();
        tx.push(code(1));
        tx.push(code(2));

        // Act
        let outcome = tx.push(code(3));

        // Assert
        assert_eq!(outcome, PushOutcome::DroppedOldest(code(1)));
        assert_eq!(rx.try_recv(), Some(code(2)));
        assert_eq!(rx.try_recv(), Some(code(3)));
        assert_eq!(rx.stats().dropped, 1);
    }

    #[test]
    fn test_single_slot_queue_holds_one_undelivered_code() {
        let (tx, mut rx) = key_queue(1, OverflowPolicy::DropNewest).unwrap();

        assert_eq!(tx.push(code(0x41)), PushOutcome::Queued);
        assert_eq!(tx.push(code(0x42)), PushOutcome::DroppedNewest);
        assert_eq!(rx.stats().pending, 1);

        assert_eq!(rx.try_recv(), Some(code(0x41)));
        assert_eq!(tx.push(code(0x43)), PushOutcome::Queued);
        assert_eq!(rx.try_recv(), Some(code(0x43)));
    }

    #[test]
    fn test_push_after_receiver_dropped_reports_closed() {
        let (tx, rx) = key_queue(4, OverflowPolicy::DropNewest).unwrap();
        drop(rx);

        assert!(tx.is_closed());
        assert_eq!(tx.push(code(1)), PushOutcome::Closed);
    }

    #[test]
    fn test_close_keeps_already_queued_codes() {
        let (tx, mut rx) = key_queue(4, OverflowPolicy::DropNewest).unwrap();
        tx.push(code(9));

        rx.close();

        assert_eq!(tx.push(code(10)), PushOutcome::Closed);
        assert_eq!(rx.try_recv(), Some(code(9)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_recv_is_pending_until_a_push_wakes_it() {
        // Arrange
        let (tx, mut rx) = key_queue(4, OverflowPolicy::DropNewest).unwrap();
        let mut fut = task::spawn(rx.recv());

        // Act / Assert
        assert_pending!(fut.poll());
        tx.push(code(0x41));
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), Some(code(0x41)));
    }

    #[test]
    fn test_recv_returns_none_when_last_sender_drops() {
        // Arrange
        let (tx, mut rx) = key_queue(4, OverflowPolicy::DropNewest).unwrap();
        let tx2 = tx.clone();
        tx.push(code(5));
        drop(tx);

        // Act / Assert: a clone still exists, so the queue stays open.
        {
            let mut fut = task::spawn(rx.recv());
            assert_ready_eq!(fut.poll(), Some(code(5)));
        }
        let mut fut = task::spawn(rx.recv());
        assert_pending!(fut.poll());

        drop(tx2);
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), None);
    }

    #[tokio::test]
    async fn test_recv_across_threads_preserves_order() {
        // Arrange
        let (tx, mut rx) = key_queue(256, OverflowPolicy::DropNewest).unwrap();

        // Act
        let producer = std::thread::spawn(move || {
            for b in 0u8..100 {
                assert_eq!(tx.push(code(b)), PushOutcome::Queued);
            }
        });

        let mut received = Vec::new();
        while let Some(c) = rx.recv().await {
            received.push(c.value());
        }
        producer.join().unwrap();

        // Assert
        assert_eq!(received, (0u8..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_overflow_policy_default_is_drop_newest() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropNewest);
    }
}
