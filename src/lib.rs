//! semops - operational glue for a Semaphore-backed Ansible stack.
//!
//! Three independent entry points share this library:
//!
//! - The `review` stdout callback plugin ([`callback`]): renders playbook
//!   lifecycle events down to debug messages, failures and a final recap.
//! - `dbctl` ([`db`]): preset reports and parameterized SQL against the
//!   `semaphore` and `ansible_logging` MariaDB schemas.
//! - `semctl` ([`api`]): a command-line wrapper over the Semaphore REST API
//!   (task execution with poll/tail, template/schedule/environment/inventory/
//!   integration CRUD).
//!
//! No component depends on another; [`config`], [`error`] and [`output`] are
//! the shared plumbing.

pub mod api;
pub mod callback;
pub mod config;
pub mod db;
pub mod error;
pub mod output;

pub use error::{Error, Result};
