//! Application layer for keytap.
//!
//! - **`capture`** – Owns the keyboard hook lifecycle on the dedicated hook
//!   thread and implements the per-event callback that turns key presses into
//!   queued key codes.
//! - **`print_keys`** – The consumer loop that drains the key queue and writes
//!   one rendered code per line.
//!
//! Both talk to the OS only through [`crate::infrastructure::hook::HookApi`]
//! and to each other only through the `keytap_core` key queue.

pub mod capture;
pub mod print_keys;
