//! Shared infrastructure utilities for Visitdesk.
//!
//! - **`atomic_write`**: crash-safe file persistence (temp + rename) with
//!   owner-only permissions for credential files.

pub mod atomic_write;

pub use atomic_write::{atomic_write, ensure_private_dir, recover_bak_file, remove_if_exists};
