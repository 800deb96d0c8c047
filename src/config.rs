//! Settings handling for the semops CLIs.
//!
//! Both CLIs share one TOML settings file (default
//! `~/.config/semops/config.toml`) with two independent sections:
//! `[database]` for dbctl and `[server]` for semctl. The file is written
//! with owner-only permissions and is only ever mutated by the explicit
//! `config init` commands, which rewrite their own section and preserve the
//! other. Individual fields can be overridden per-invocation through
//! environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default MySQL port.
pub const DEFAULT_DB_PORT: u16 = 3306;
/// Default name of the Semaphore schema.
pub const DEFAULT_SEMAPHORE_DB: &str = "semaphore";
/// Default name of the ansible_logging schema.
pub const DEFAULT_LOGGING_DB: &str = "ansible_logging";

/// The on-disk settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// `[database]` section, used by dbctl.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseSettings>,

    /// `[server]` section, used by semctl.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSettings>,
}

/// Credentials for the two MariaDB schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database host
    pub host: String,
    /// Database port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Name of the Semaphore schema
    #[serde(default = "default_semaphore_db")]
    pub semaphore_db: String,
    /// Name of the logging schema
    #[serde(default = "default_logging_db")]
    pub logging_db: String,
}

/// Credentials for the Semaphore REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Base URL, stored without a trailing slash
    pub url: String,
    /// Bearer token
    pub token: String,
}

fn default_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_semaphore_db() -> String {
    DEFAULT_SEMAPHORE_DB.to_string()
}

fn default_logging_db() -> String {
    DEFAULT_LOGGING_DB.to_string()
}

/// Returns the default settings file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("semops")
        .join("config.toml")
}

/// Resolves the `--config` argument, expanding a leading `~`.
pub fn resolve_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
        None => default_path(),
    }
}

impl Settings {
    /// Loads the settings file and applies environment overrides.
    ///
    /// A missing file is a configuration error with a remediation hint.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(
                format!("Config file not found: {}", path.display()),
                "Run 'config init' to create it.",
            ));
        }
        let mut settings: Settings = toml::from_str(&fs::read_to_string(path)?)?;
        settings.apply_env();
        if let Some(server) = &mut settings.server {
            server.url = server.url.trim_end_matches('/').to_string();
        }
        Ok(settings)
    }

    /// Reads the file without env overrides, or starts empty if it is absent.
    ///
    /// Used by the save path so overrides never get persisted.
    fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Ok(toml::from_str(&fs::read_to_string(path)?)?)
        } else {
            Ok(Settings::default())
        }
    }

    /// Returns the `[database]` section or a config error with a hint.
    pub fn database(&self) -> Result<&DatabaseSettings> {
        self.database.as_ref().ok_or_else(|| {
            Error::config(
                "Missing [database] section in config file",
                "Run: dbctl config init --host HOST --user USER --password PASS",
            )
        })
    }

    /// Returns the `[server]` section or a config error with a hint.
    pub fn server(&self) -> Result<&ServerSettings> {
        self.server.as_ref().ok_or_else(|| {
            Error::config(
                "Missing [server] section in config file",
                "Run: semctl config init --url URL --token TOKEN",
            )
        })
    }

    fn apply_env(&mut self) {
        if let Some(db) = &mut self.database {
            if let Ok(host) = env::var("SEMOPS_DB_HOST") {
                db.host = host;
            }
            if let Ok(port) = env::var("SEMOPS_DB_PORT") {
                if let Ok(port) = port.parse() {
                    db.port = port;
                }
            }
            if let Ok(user) = env::var("SEMOPS_DB_USER") {
                db.user = user;
            }
            if let Ok(password) = env::var("SEMOPS_DB_PASSWORD") {
                db.password = password;
            }
        }
        if let Some(server) = &mut self.server {
            if let Ok(url) = env::var("SEMOPS_URL") {
                server.url = url;
            }
            if let Ok(token) = env::var("SEMOPS_TOKEN") {
                server.token = token;
            }
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        restrict_permissions(path)?;
        Ok(())
    }
}

/// Rewrites the `[database]` section, preserving the rest of the file.
pub fn save_database(path: &Path, database: DatabaseSettings) -> Result<()> {
    let mut settings = Settings::load_or_default(path)?;
    settings.database = Some(database);
    settings.write(path)
}

/// Rewrites the `[server]` section, preserving the rest of the file.
pub fn save_server(path: &Path, mut server: ServerSettings) -> Result<()> {
    server.url = server.url.trim_end_matches('/').to_string();
    let mut settings = Settings::load_or_default(path)?;
    settings.server = Some(server);
    settings.write(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Masks a secret for display: same length, all `*` except the last four
/// characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}
