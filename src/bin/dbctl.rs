//! dbctl - database CLI for the Semaphore and ansible_logging schemas.
//!
//! Preset reports plus parameterized custom SQL against the two MariaDB
//! databases behind the automation stack. Each invocation opens one
//! connection, runs one statement, and exits.

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use semops::config::{
    self, DatabaseSettings, Settings, DEFAULT_DB_PORT, DEFAULT_LOGGING_DB, DEFAULT_SEMAPHORE_DB,
};
use semops::db::{self, presets, DbTarget, PresetQuery};
use semops::error::{Error, Result};
use semops::output::{self, OutputFormat};

/// Database CLI for the semaphore and ansible_logging schemas
#[derive(Parser, Debug)]
#[command(name = "dbctl")]
#[command(version)]
#[command(about = "Database CLI for the Semaphore and ansible_logging schemas", long_about = None)]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, env = "SEMOPS_CONFIG")]
    config: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run custom SQL
    Query {
        /// Target database
        #[arg(value_enum)]
        db: DbTarget,
        /// SQL statement
        sql: String,
        /// Allow INSERT/UPDATE/DELETE
        #[arg(long)]
        write: bool,
    },

    /// Recent backups
    Backups {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Filter by hostname
        #[arg(long)]
        host: Option<String>,
    },

    /// Backups older than the threshold
    StaleBackups {
        /// Hours threshold (default: 216 = 9 days)
        #[arg(long, default_value_t = 216)]
        hours: i64,
    },

    /// Latest non-ok health checks
    Health,

    /// Recent restores
    Restores {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Recent updates
    Updates {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Recent playbook runs
    Runs {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Row counts for logging tables
    TableCounts,

    /// Docker size snapshots
    DockerSizes {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Recent Semaphore tasks with template names
    Tasks {
        /// Row limit
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Failed/stopped tasks
    FailedTasks {
        /// Row limit
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// List Semaphore environments
    Envs {
        /// Search by name or variable content
        #[arg(long)]
        search: Option<String>,
    },

    /// All templates with env and view names
    Templates,

    /// All schedules with template names
    Schedules,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Set up the [database] section
    Init(ConfigInitArgs),
    /// Show config with a masked password
    Show,
    /// Test connections to both databases
    Test,
}

#[derive(Args, Debug)]
struct ConfigInitArgs {
    /// Database host
    #[arg(long)]
    host: String,

    /// Database port
    #[arg(long, default_value_t = DEFAULT_DB_PORT)]
    port: u16,

    /// Database user
    #[arg(long)]
    user: String,

    /// Database password
    #[arg(long)]
    password: String,

    /// Semaphore DB name
    #[arg(long, default_value = DEFAULT_SEMAPHORE_DB)]
    semaphore_db: String,

    /// Logging DB name
    #[arg(long, default_value = DEFAULT_LOGGING_DB)]
    logging_db: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            err.report();
            std::process::exit(err.exit_code());
        }
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let path = config::resolve_path(cli.config.as_deref());

    if let Command::Config { action } = &cli.command {
        return config_command(action, &path).await;
    }

    let settings = Settings::load(&path)?;
    let database = settings.database()?;

    match cli.command {
        Command::Query { db, sql, write } => query_command(database, db, &sql, write, cli.format).await,
        Command::Backups { limit, host } => {
            run_preset(database, presets::backups(limit, host.as_deref()), cli.format).await
        }
        Command::StaleBackups { hours } => {
            run_preset(database, presets::stale_backups(hours), cli.format).await
        }
        Command::Health => run_preset(database, presets::health(), cli.format).await,
        Command::Restores { limit } => {
            run_preset(database, presets::restores(limit), cli.format).await
        }
        Command::Updates { limit } => run_preset(database, presets::updates(limit), cli.format).await,
        Command::Runs { limit } => run_preset(database, presets::runs(limit), cli.format).await,
        Command::TableCounts => run_preset(database, presets::table_counts(), cli.format).await,
        Command::DockerSizes { limit } => {
            run_preset(database, presets::docker_sizes(limit), cli.format).await
        }
        Command::Tasks { limit } => run_preset(database, presets::tasks(limit), cli.format).await,
        Command::FailedTasks { limit } => {
            run_preset(database, presets::failed_tasks(limit), cli.format).await
        }
        Command::Envs { search } => {
            run_preset(database, presets::environments(search.as_deref()), cli.format).await
        }
        Command::Templates => run_preset(database, presets::templates(), cli.format).await,
        Command::Schedules => run_preset(database, presets::schedules(), cli.format).await,
        Command::Config { .. } => unreachable!("handled above"),
    }
}

async fn config_command(action: &ConfigAction, path: &std::path::Path) -> Result<i32> {
    match action {
        ConfigAction::Init(args) => {
            let database = DatabaseSettings {
                host: args.host.clone(),
                port: args.port,
                user: args.user.clone(),
                password: args.password.clone(),
                semaphore_db: args.semaphore_db.clone(),
                logging_db: args.logging_db.clone(),
            };

            // Best-effort connectivity check; the config is saved either way.
            let mut results = serde_json::Map::new();
            for target in [DbTarget::Semaphore, DbTarget::Logging] {
                let name = target.database(&database).to_string();
                let outcome = match db::connect(&database, target).await {
                    Ok(_) => "ok".to_string(),
                    Err(err) => format!("failed: {err}"),
                };
                results.insert(name, Value::String(outcome));
            }

            config::save_database(path, database)?;
            println!(
                "{}",
                json!({
                    "status": "ok",
                    "message": format!("Database config saved to {}", path.display()),
                    "databases": results,
                })
            );
            Ok(0)
        }
        ConfigAction::Show => {
            let settings = Settings::load(path)?;
            let database = settings.database()?;
            println!(
                "{}",
                json!({
                    "host": database.host,
                    "port": database.port,
                    "user": database.user,
                    "password": config::mask_secret(&database.password),
                    "semaphore_db": database.semaphore_db,
                    "logging_db": database.logging_db,
                })
            );
            Ok(0)
        }
        ConfigAction::Test => {
            let settings = Settings::load(path)?;
            let database = settings.database()?;
            let mut results = serde_json::Map::new();
            for target in [DbTarget::Semaphore, DbTarget::Logging] {
                let mut conn = db::connect(database, target).await?;
                db::fetch(&mut conn, "SELECT 1", &[]).await?;
                results.insert(
                    target.database(database).to_string(),
                    Value::String("ok".to_string()),
                );
            }
            println!("{}", json!({ "status": "ok", "databases": results }));
            Ok(0)
        }
    }
}

async fn query_command(
    settings: &DatabaseSettings,
    target: DbTarget,
    sql: &str,
    write_confirmed: bool,
    format: OutputFormat,
) -> Result<i32> {
    let sql = sql.trim();
    let is_write = !db::is_read_statement(sql);

    if is_write && !write_confirmed {
        return Err(Error::WriteNotConfirmed {
            sql: sql.chars().take(100).collect(),
        });
    }

    let mut conn = db::connect(settings, target).await?;
    if is_write {
        let rows_affected = db::execute(&mut conn, sql, &[]).await?;
        output::emit(&json!({ "rows_affected": rows_affected }), format, None, None);
    } else {
        let rows = db::fetch(&mut conn, sql, &[]).await?;
        output::emit(&Value::Array(rows), format, None, None);
    }
    Ok(0)
}

async fn run_preset(
    settings: &DatabaseSettings,
    preset: PresetQuery,
    format: OutputFormat,
) -> Result<i32> {
    let mut conn = db::connect(settings, preset.target).await?;
    let rows = db::fetch(&mut conn, &preset.sql, &preset.params).await?;
    output::emit(
        &Value::Array(rows),
        format,
        Some(preset.columns),
        Some(preset.headers),
    );
    Ok(0)
}
