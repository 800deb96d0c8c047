//! Semaphore REST API wrapper.
//!
//! One HTTP client abstraction serves every command: bearer-token auth,
//! relaxed certificate verification for self-signed internal endpoints, and a
//! fixed mapping from transport failures and HTTP status codes to distinct
//! error messages. On top of it sit the project-scoped resource operations
//! and the task run/poll/tail workflow.

pub mod client;
pub mod naming;
pub mod resources;
pub mod task;

pub use client::ApiClient;
pub use resources::{ProjectApi, ResourceKind};
pub use task::{RunRequest, Task, WaitOptions, TERMINAL_STATUSES};
