//! Infrastructure layer: OS-facing adapters.
//!
//! - **`hook`** – the low-level keyboard hook API, with a Win32 backend and a
//!   scripted mock used by tests.
//! - **`storage`** – TOML configuration file persistence.
//!
//! The `application` layer drives these through the [`hook::HookApi`] trait
//! and plain config structs; it never calls the OS directly.

pub mod hook;
pub mod storage;
