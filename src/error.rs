//! Error types for semops.
//!
//! One variant per failure class the CLIs can hit: configuration problems,
//! transport and server failures, policy rejections, and local IO. Every
//! error renders as a one-line message with an optional indented detail line,
//! matching what the tools print to stderr.

use thiserror::Error;

/// Result type alias for semops operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for semops.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Missing or incomplete settings file.
    #[error("{message}")]
    Config {
        /// What is wrong
        message: String,
        /// Remediation hint shown on the detail line
        hint: Option<String>,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Could not reach the remote endpoint.
    #[error("Cannot connect to {target}")]
    ConnectionFailed {
        /// Endpoint description (url or db@host:port)
        target: String,
        /// Underlying cause or hint
        detail: Option<String>,
    },

    /// Request or connection attempt timed out.
    #[error("Request timed out after {seconds}s")]
    Timeout {
        /// Effective timeout in seconds
        seconds: u64,
    },

    /// Any other HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Request(String),

    // ========================================================================
    // HTTP Status Errors
    // ========================================================================
    /// 401 from the server.
    #[error("Authentication failed")]
    AuthenticationFailed {
        /// Hint shown on the detail line
        detail: Option<String>,
    },

    /// 403 from the server.
    #[error("Permission denied")]
    PermissionDenied,

    /// 404 from the server.
    #[error("Not found: {what}")]
    NotFound {
        /// Method and path that missed
        what: String,
    },

    /// 409 from the server.
    #[error("Conflict")]
    Conflict {
        /// Response body, if any
        detail: Option<String>,
    },

    /// 422 from the server.
    #[error("Validation error")]
    Validation {
        /// Response body, if any
        detail: Option<String>,
    },

    /// 5xx from the server.
    #[error("Server error ({status})")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        detail: Option<String>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        detail: Option<String>,
    },

    // ========================================================================
    // Database Errors
    // ========================================================================
    /// The server rejected the statement (syntax, unknown table, ...).
    #[error("Query error")]
    Query {
        /// Server-reported cause
        detail: Option<String>,
    },

    /// Connection-level database failure.
    #[error("Database error")]
    Database {
        /// Underlying cause
        detail: Option<String>,
    },

    // ========================================================================
    // Policy Rejections
    // ========================================================================
    /// A write statement was issued without the confirmation flag.
    #[error("Write query detected. Add --write flag to confirm.")]
    WriteNotConfirmed {
        /// Leading part of the offending statement
        sql: String,
    },

    /// A destructive command was issued without the confirmation flag.
    #[error("Delete requires --confirm flag")]
    ConfirmationRequired {
        /// Kind, id and current name of the target
        target: String,
    },

    // ========================================================================
    // Local Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file did not parse.
    #[error("Invalid settings file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings file could not be serialized.
    #[error("Failed to write settings file: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Creates a configuration error with a remediation hint.
    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Creates a connection failure for the given endpoint.
    pub fn connection_failed(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            target: target.into(),
            detail: Some(detail.into()),
        }
    }

    /// The optional second line printed under the main message.
    pub fn detail(&self) -> Option<String> {
        match self {
            Error::Config { hint, .. } => hint.clone(),
            Error::ConnectionFailed { detail, .. }
            | Error::AuthenticationFailed { detail }
            | Error::Conflict { detail }
            | Error::Validation { detail }
            | Error::ServerError { detail, .. }
            | Error::Http { detail, .. }
            | Error::Query { detail }
            | Error::Database { detail } => detail.clone(),
            Error::WriteNotConfirmed { sql } => Some(format!("SQL: {sql}")),
            Error::ConfirmationRequired { target } => Some(format!("Target: {target}")),
            _ => None,
        }
    }

    /// Prints the error to stderr in the two-line CLI format.
    pub fn report(&self) {
        eprintln!("Error: {self}");
        if let Some(detail) = self.detail() {
            eprintln!("  {detail}");
        }
    }

    /// Returns the process exit code for this error.
    ///
    /// All CLI-side failures exit 1; exit 2 is reserved for remote tasks
    /// that end in a non-success terminal state, which is not an `Error`.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_hint_as_detail() {
        let err = Error::config("Config file not found: /tmp/x", "Run: dbctl config init");
        assert_eq!(err.to_string(), "Config file not found: /tmp/x");
        assert_eq!(err.detail().as_deref(), Some("Run: dbctl config init"));
    }

    #[test]
    fn write_rejection_echoes_sql() {
        let err = Error::WriteNotConfirmed {
            sql: "DELETE FROM backups".to_string(),
        };
        assert!(err.to_string().contains("--write"));
        assert_eq!(err.detail().as_deref(), Some("SQL: DELETE FROM backups"));
    }

    #[test]
    fn confirmation_error_names_target() {
        let err = Error::ConfirmationRequired {
            target: "Schedule 7 \"nightly\"".to_string(),
        };
        assert!(err.to_string().contains("--confirm"));
        assert!(err.detail().unwrap().contains("nightly"));
    }

    #[test]
    fn all_errors_exit_one() {
        assert_eq!(Error::PermissionDenied.exit_code(), 1);
        assert_eq!(Error::Timeout { seconds: 30 }.exit_code(), 1);
    }
}
