//! # keytap-core
//!
//! Platform-independent building blocks for keytap: the key code type and its
//! renderings, the raw low-level keyboard event record, and the bounded queue
//! that carries key codes from the hook callback to the consumer.
//!
//! This crate makes no OS calls.  The `keytap` crate owns the hook itself and
//! only hands plain data (`w_param` values, [`RawKeyEvent`] copies) to the
//! types defined here.
//!
//! # Pipeline overview
//!
//! ```text
//! WH_KEYBOARD_LL callback ──► RawKeyEvent ──► KeyCode ──► KeySender
//!                                                             │
//!                                    print_keys ◄── KeyReceiver
//! ```
//!
//! - **`keymap`** – [`KeyCode`] (a virtual key code truncated to one byte),
//!   quoting as a character literal and the Windows virtual-key name table.
//! - **`event`** – Message-type decoding for the hook's `w_param` and the
//!   `#[repr(C)]` mirror of `KBDLLHOOKSTRUCT`.
//! - **`queue`** – A non-blocking bounded queue with an explicit overflow
//!   policy, safe to push from inside an OS hook callback.

pub mod event;
pub mod keymap;
pub mod queue;

pub use event::{HookMessage, RawKeyEvent};
pub use keymap::{KeyCode, OutputFormat};
pub use queue::{key_queue, KeyReceiver, KeySender, OverflowPolicy, PushOutcome, QueueError};
