//! MySQL glue for the `semaphore` and `ansible_logging` schemas.
//!
//! Every command opens a short-lived connection, runs exactly one
//! parameterized statement, and closes it again. There is no pooling, no
//! caching and no retrying; a failed connection or statement is a one-line
//! error and a non-zero exit.

pub mod client;
pub mod presets;

pub use client::{connect, execute, fetch, is_read_statement, DbTarget, SqlParam};
pub use presets::PresetQuery;
