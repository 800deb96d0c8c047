//! semctl - CLI for the Semaphore REST API.
//!
//! Covers the day-to-day operations against one Semaphore server: health
//! check, project backup, task run/poll/tail, and CRUD over templates,
//! schedules, environments, inventories, views, and integrations. Every
//! command is one or a few API calls; nothing is cached between runs.

use std::io;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use semops::api::{naming, task, ApiClient, ResourceKind, RunRequest, WaitOptions};
use semops::config::{self, Settings, ServerSettings};
use semops::error::Result;
use semops::output::{self, OutputFormat};

/// CLI for the Semaphore REST API
#[derive(Parser, Debug)]
#[command(name = "semctl")]
#[command(version)]
#[command(about = "CLI for the Semaphore REST API", long_about = None)]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, env = "SEMOPS_CONFIG")]
    config: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Project id
    #[arg(long, global = true, default_value_t = 1)]
    project: i64,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check server reachability
    Ping,

    /// Export the full project as JSON
    Backup,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run and inspect tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage job templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Manage cron schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Manage environments
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Manage inventories
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },

    /// Manage views
    View {
        #[command(subcommand)]
        action: ViewAction,
    },

    /// Manage webhook integrations
    Integration {
        #[command(subcommand)]
        action: IntegrationAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Set up the [server] section (pings before saving)
    Init {
        /// Server base URL
        #[arg(long)]
        url: String,
        /// API token
        #[arg(long)]
        token: String,
    },
    /// Show config with a masked token
    Show,
    /// Ping using the saved config
    Test,
}

#[derive(Subcommand, Debug)]
enum TaskAction {
    /// Start a template run
    Run(TaskRunArgs),
    /// Recent tasks
    List {
        /// Number of tasks to fetch
        #[arg(long, default_value_t = 20)]
        count: i64,
        /// Filter by template id
        #[arg(long)]
        template: Option<i64>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one task
    Status {
        /// Task id
        task_id: i64,
    },
    /// Structured output entries
    Output {
        /// Task id
        task_id: i64,
    },
    /// Raw log text
    Log {
        /// Task id
        task_id: i64,
    },
    /// Stop a running task
    Stop {
        /// Task id
        task_id: i64,
    },
}

#[derive(Args, Debug)]
struct TaskRunArgs {
    /// Template to run
    template_id: i64,

    /// Extra CLI arguments as a JSON array string
    #[arg(long)]
    extra_args: Option<String>,

    /// Task message
    #[arg(long)]
    message: Option<String>,

    /// Verbose task output
    #[arg(long)]
    debug: bool,

    /// Check mode
    #[arg(long)]
    dry_run: bool,

    /// Diff mode
    #[arg(long)]
    diff: bool,

    /// Host limit pattern
    #[arg(long)]
    limit: Option<String>,

    /// Poll until the task finishes
    #[arg(long)]
    wait: bool,

    /// Stream task output while waiting (implies --wait)
    #[arg(long)]
    tail: bool,

    /// Poll interval in seconds
    #[arg(long, default_value_t = task::DEFAULT_POLL_SECS)]
    poll: u64,
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// List templates
    List {
        /// Filter by view id
        #[arg(long)]
        view: Option<i64>,
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one template
    Get {
        /// Template id
        id: i64,
    },
    /// Create a template
    Create(TemplateCreateArgs),
    /// Update template fields
    Update(TemplateUpdateArgs),
    /// Delete a template
    Delete {
        /// Template id
        id: i64,
        /// Actually delete
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Args, Debug)]
struct TemplateCreateArgs {
    /// Template name ("Verb — Target [Subtype]")
    #[arg(long)]
    name: String,

    /// Playbook path within the repository
    #[arg(long)]
    playbook: String,

    /// Inventory id
    #[arg(long, default_value_t = 3)]
    inventory_id: i64,

    /// Repository id
    #[arg(long, default_value_t = 1)]
    repository_id: i64,

    /// Environment id
    #[arg(long)]
    environment_id: i64,

    /// View id
    #[arg(long)]
    view_id: i64,

    /// Default CLI arguments as a JSON array string
    #[arg(long)]
    arguments: Option<String>,

    /// Description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct TemplateUpdateArgs {
    /// Template id
    id: i64,

    /// New name
    #[arg(long)]
    name: Option<String>,

    /// New playbook path
    #[arg(long)]
    playbook: Option<String>,

    /// New inventory id
    #[arg(long)]
    inventory_id: Option<i64>,

    /// New environment id
    #[arg(long)]
    environment_id: Option<i64>,

    /// New view id
    #[arg(long)]
    view_id: Option<i64>,

    /// New default CLI arguments
    #[arg(long)]
    arguments: Option<String>,

    /// New description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ScheduleAction {
    /// List schedules
    List {
        /// Filter by template id
        #[arg(long)]
        template: Option<i64>,
    },
    /// Show one schedule
    Get {
        /// Schedule id
        id: i64,
    },
    /// Create a schedule
    Create {
        /// Template to schedule
        #[arg(long)]
        template_id: i64,
        /// Cron expression
        #[arg(long)]
        cron: String,
        /// Schedule name
        #[arg(long)]
        name: String,
        /// Create in disabled state
        #[arg(long)]
        inactive: bool,
    },
    /// Update schedule fields
    Update {
        /// Schedule id
        id: i64,
        /// New cron expression
        #[arg(long)]
        cron: Option<String>,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Enable the schedule
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Disable the schedule
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a schedule
    Delete {
        /// Schedule id
        id: i64,
        /// Actually delete
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand, Debug)]
enum EnvAction {
    /// List environments
    List,
    /// Show one environment
    Get {
        /// Environment id
        id: i64,
    },
    /// Create an environment
    Create {
        /// Environment name
        #[arg(long)]
        name: String,
        /// Variables as a JSON object string
        #[arg(long)]
        json: Option<String>,
    },
    /// Update environment fields
    Update {
        /// Environment id
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New variables as a JSON object string
        #[arg(long)]
        json: Option<String>,
    },
    /// Delete an environment
    Delete {
        /// Environment id
        id: i64,
        /// Actually delete
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand, Debug)]
enum InventoryAction {
    /// List inventories
    List,
}

#[derive(Subcommand, Debug)]
enum ViewAction {
    /// List views
    List,
}

#[derive(Subcommand, Debug)]
enum IntegrationAction {
    /// List integrations
    List,
    /// Show one integration
    Get {
        /// Integration id
        id: i64,
    },
    /// Create an integration
    Create {
        /// Integration name
        #[arg(long)]
        name: String,
        /// Template the webhook triggers
        #[arg(long)]
        template_id: i64,
        /// Auth method (none, github, token, hmac)
        #[arg(long)]
        auth_method: Option<String>,
        /// Auth secret/token
        #[arg(long)]
        auth_secret: Option<String>,
        /// Auth header name
        #[arg(long)]
        auth_header: Option<String>,
    },
    /// Delete an integration
    Delete {
        /// Integration id
        id: i64,
        /// Actually delete
        #[arg(long)]
        confirm: bool,
    },
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
    let client = ApiClient::new(settings.server()?)?;
    let project = client.project(cli.project);
    let format = cli.format;

    match cli.command {
        Command::Ping => {
            let pong = client.ping().await?;
            println!("{}", json!({ "status": "ok", "ping": pong }));
            Ok(0)
        }
        Command::Backup => {
            let backup = project.backup().await?;
            output::emit(&backup, format, None, None);
            Ok(0)
        }
        Command::Task { action } => task_command(&project, action, format).await,
        Command::Template { action } => template_command(&project, cli.project, action, format).await,
        Command::Schedule { action } => schedule_command(&project, cli.project, action, format).await,
        Command::Env { action } => env_command(&project, cli.project, action, format).await,
        Command::Inventory { action } => match action {
            InventoryAction::List => {
                list_resources(
                    &project,
                    ResourceKind::Inventory,
                    format,
                    &["id", "name", "type"],
                    &["ID", "Name", "Type"],
                )
                .await
            }
        },
        Command::View { action } => match action {
            ViewAction::List => {
                list_resources(
                    &project,
                    ResourceKind::View,
                    format,
                    &["id", "title", "position"],
                    &["ID", "Title", "Position"],
                )
                .await
            }
        },
        Command::Integration { action } => {
            integration_command(&project, cli.project, action, format).await
        }
        Command::Config { .. } => unreachable!("handled above"),
    }
}

async fn config_command(action: &ConfigAction, path: &std::path::Path) -> Result<i32> {
    match action {
        ConfigAction::Init { url, token } => {
            let server = ServerSettings {
                url: url.clone(),
                token: token.clone(),
            };
            // A failed ping aborts the save; a bad URL or token never lands
            // in the config file.
            let client = ApiClient::new(&server)?;
            let pong = client.ping().await?;
            config::save_server(path, server)?;
            println!(
                "{}",
                json!({
                    "status": "ok",
                    "message": format!("Server config saved to {}", path.display()),
                    "ping": pong,
                })
            );
            Ok(0)
        }
        ConfigAction::Show => {
            let settings = Settings::load(path)?;
            let server = settings.server()?;
            println!(
                "{}",
                json!({
                    "url": server.url,
                    "token": config::mask_secret(&server.token),
                })
            );
            Ok(0)
        }
        ConfigAction::Test => {
            let settings = Settings::load(path)?;
            let client = ApiClient::new(settings.server()?)?;
            let pong = client.ping().await?;
            println!("{}", json!({ "status": "ok", "ping": pong }));
            Ok(0)
        }
    }
}

async fn task_command(
    project: &semops::api::ProjectApi<'_>,
    action: TaskAction,
    format: OutputFormat,
) -> Result<i32> {
    match action {
        TaskAction::Run(args) => task_run(project, args, format).await,
        TaskAction::List {
            count,
            template,
            status,
        } => {
            let tasks = project
                .last_tasks(Some(count), template, status.as_deref())
                .await?;
            let columns = ["id", "status", "template_id", "start", "end", "message"];
            let headers = ["ID", "Status", "Template", "Start", "End", "Message"];
            output::emit(&Value::Array(tasks), format, Some(&columns), Some(&headers));
            Ok(0)
        }
        TaskAction::Status { task_id } => {
            let task = project.task(task_id).await?;
            output::emit(&serde_json::to_value(&task)?, format, None, None);
            Ok(0)
        }
        TaskAction::Output { task_id } => {
            let entries = project.task_output(task_id).await?;
            output::emit(&entries, format, None, None);
            Ok(0)
        }
        TaskAction::Log { task_id } => {
            print!("{}", project.task_raw_output(task_id).await?);
            Ok(0)
        }
        TaskAction::Stop { task_id } => {
            project.stop_task(task_id).await?;
            println!("{}", json!({ "status": "ok", "stopped": task_id }));
            Ok(0)
        }
    }
}

async fn task_run(
    project: &semops::api::ProjectApi<'_>,
    args: TaskRunArgs,
    format: OutputFormat,
) -> Result<i32> {
    let request = RunRequest {
        template_id: args.template_id,
        arguments: args.extra_args,
        message: args.message,
        debug: args.debug,
        dry_run: args.dry_run,
        diff: args.diff,
        limit: args.limit,
    };
    let submitted = project.run_task(&request).await?;

    let wait = args.wait || args.tail;
    if !wait {
        output::emit(&serde_json::to_value(&submitted)?, format, None, None);
        return Ok(0);
    }

    eprintln!(
        "Task {} submitted; polling every {}s",
        submitted.id, args.poll
    );
    let options = WaitOptions {
        poll_interval: Duration::from_secs(args.poll),
        tail: args.tail,
    };
    // Tail output goes to stderr so stdout stays parseable JSON.
    let mut sink = io::stderr();
    let finished = task::wait_for_task(project, submitted.id, &options, &mut sink).await?;
    output::emit(&serde_json::to_value(&finished)?, format, None, None);
    Ok(finished.exit_code())
}

async fn template_command(
    project: &semops::api::ProjectApi<'_>,
    project_id: i64,
    action: TemplateAction,
    format: OutputFormat,
) -> Result<i32> {
    match action {
        TemplateAction::List { view, search } => {
            let mut templates = project.list(ResourceKind::Template).await?;
            if let Some(view) = view {
                templates.retain(|t| t.get("view_id").and_then(Value::as_i64) == Some(view));
            }
            if let Some(search) = search {
                let needle = search.to_lowercase();
                templates.retain(|t| {
                    t.get("name")
                        .and_then(Value::as_str)
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                });
            }
            let columns = [
                "id",
                "name",
                "playbook",
                "view_id",
                "inventory_id",
                "environment_id",
            ];
            let headers = ["ID", "Name", "Playbook", "View", "Inventory", "Env"];
            output::emit(
                &Value::Array(templates),
                format,
                Some(&columns),
                Some(&headers),
            );
            Ok(0)
        }
        TemplateAction::Get { id } => {
            let template = project.get(ResourceKind::Template, id).await?;
            output::emit(&template, format, None, None);
            Ok(0)
        }
        TemplateAction::Create(args) => {
            warn_on_naming(&args.name, args.view_id);
            let payload = json!({
                "project_id": project_id,
                "name": args.name,
                "playbook": args.playbook,
                "inventory_id": args.inventory_id,
                "repository_id": args.repository_id,
                "environment_id": args.environment_id,
                "view_id": args.view_id,
                "arguments": args.arguments.as_deref().unwrap_or("[]"),
                "description": args.description.unwrap_or_default(),
                "app": "ansible",
                "type": "",
                "allow_override_args_in_task": true,
                "allow_override_branch_in_task": true,
            });
            let created = project.create(ResourceKind::Template, &payload).await?;
            output::emit(&created, format, None, None);
            Ok(0)
        }
        TemplateAction::Update(args) => {
            let mut fields = Map::new();
            set_field(&mut fields, "name", args.name.map(Value::from));
            set_field(&mut fields, "playbook", args.playbook.map(Value::from));
            set_field(&mut fields, "inventory_id", args.inventory_id.map(Value::from));
            set_field(
                &mut fields,
                "environment_id",
                args.environment_id.map(Value::from),
            );
            set_field(&mut fields, "view_id", args.view_id.map(Value::from));
            set_field(&mut fields, "arguments", args.arguments.map(Value::from));
            set_field(&mut fields, "description", args.description.map(Value::from));
            let updated = project
                .update(ResourceKind::Template, args.id, &Value::Object(fields))
                .await?;
            // Validate the merged object, so a view-only change is still
            // checked against the existing name.
            for warning in naming::validate_template_object(&updated) {
                eprintln!("Warning: {warning}");
            }
            output::emit(&updated, format, None, None);
            Ok(0)
        }
        TemplateAction::Delete { id, confirm } => {
            let result = project.delete(ResourceKind::Template, id, confirm).await?;
            output::emit(&result, format, None, None);
            Ok(0)
        }
    }
}

async fn schedule_command(
    project: &semops::api::ProjectApi<'_>,
    project_id: i64,
    action: ScheduleAction,
    format: OutputFormat,
) -> Result<i32> {
    match action {
        ScheduleAction::List { template } => {
            let mut schedules = project.list(ResourceKind::Schedule).await?;
            if let Some(template) = template {
                schedules
                    .retain(|s| s.get("template_id").and_then(Value::as_i64) == Some(template));
            }
            let columns = ["id", "template_id", "name", "cron_format", "active"];
            let headers = ["ID", "Template", "Name", "Cron", "Active"];
            output::emit(
                &Value::Array(schedules),
                format,
                Some(&columns),
                Some(&headers),
            );
            Ok(0)
        }
        ScheduleAction::Get { id } => {
            let schedule = project.get(ResourceKind::Schedule, id).await?;
            output::emit(&schedule, format, None, None);
            Ok(0)
        }
        ScheduleAction::Create {
            template_id,
            cron,
            name,
            inactive,
        } => {
            let payload = json!({
                "project_id": project_id,
                "template_id": template_id,
                "cron_format": cron,
                "name": name,
                "active": !inactive,
            });
            let created = project.create(ResourceKind::Schedule, &payload).await?;
            output::emit(&created, format, None, None);
            Ok(0)
        }
        ScheduleAction::Update {
            id,
            cron,
            name,
            active,
            inactive,
        } => {
            let mut fields = Map::new();
            set_field(&mut fields, "cron_format", cron.map(Value::from));
            set_field(&mut fields, "name", name.map(Value::from));
            if active {
                fields.insert("active".to_string(), Value::from(true));
            } else if inactive {
                fields.insert("active".to_string(), Value::from(false));
            }
            let updated = project
                .update(ResourceKind::Schedule, id, &Value::Object(fields))
                .await?;
            output::emit(&updated, format, None, None);
            Ok(0)
        }
        ScheduleAction::Delete { id, confirm } => {
            let result = project.delete(ResourceKind::Schedule, id, confirm).await?;
            output::emit(&result, format, None, None);
            Ok(0)
        }
    }
}

async fn env_command(
    project: &semops::api::ProjectApi<'_>,
    project_id: i64,
    action: EnvAction,
    format: OutputFormat,
) -> Result<i32> {
    match action {
        EnvAction::List => {
            list_resources(
                project,
                ResourceKind::Environment,
                format,
                &["id", "name", "json"],
                &["ID", "Name", "Variables"],
            )
            .await
        }
        EnvAction::Get { id } => {
            let environment = project.get(ResourceKind::Environment, id).await?;
            output::emit(&environment, format, None, None);
            Ok(0)
        }
        EnvAction::Create { name, json: vars } => {
            let payload = json!({
                "project_id": project_id,
                "name": name,
                "json": vars.as_deref().unwrap_or("{}"),
                "env": "{}",
            });
            let created = project.create(ResourceKind::Environment, &payload).await?;
            output::emit(&created, format, None, None);
            Ok(0)
        }
        EnvAction::Update { id, name, json: vars } => {
            let mut fields = Map::new();
            set_field(&mut fields, "name", name.map(Value::from));
            set_field(&mut fields, "json", vars.map(Value::from));
            let updated = project
                .update(ResourceKind::Environment, id, &Value::Object(fields))
                .await?;
            output::emit(&updated, format, None, None);
            Ok(0)
        }
        EnvAction::Delete { id, confirm } => {
            let result = project
                .delete(ResourceKind::Environment, id, confirm)
                .await?;
            output::emit(&result, format, None, None);
            Ok(0)
        }
    }
}

async fn integration_command(
    project: &semops::api::ProjectApi<'_>,
    project_id: i64,
    action: IntegrationAction,
    format: OutputFormat,
) -> Result<i32> {
    match action {
        IntegrationAction::List => {
            list_resources(
                project,
                ResourceKind::Integration,
                format,
                &["id", "name", "template_id"],
                &["ID", "Name", "Template"],
            )
            .await
        }
        IntegrationAction::Get { id } => {
            let integration = project.get(ResourceKind::Integration, id).await?;
            output::emit(&integration, format, None, None);
            Ok(0)
        }
        IntegrationAction::Create {
            name,
            template_id,
            auth_method,
            auth_secret,
            auth_header,
        } => {
            let mut payload = Map::new();
            payload.insert("project_id".to_string(), Value::from(project_id));
            payload.insert("name".to_string(), Value::from(name));
            payload.insert("template_id".to_string(), Value::from(template_id));
            set_field(&mut payload, "auth_method", auth_method.map(Value::from));
            // The server expects the secret wrapped in its own object.
            set_field(
                &mut payload,
                "auth_secret",
                auth_secret.map(|secret| json!({ "secret": secret })),
            );
            set_field(&mut payload, "auth_header", auth_header.map(Value::from));
            let created = project
                .create(ResourceKind::Integration, &Value::Object(payload))
                .await?;
            output::emit(&created, format, None, None);
            Ok(0)
        }
        IntegrationAction::Delete { id, confirm } => {
            let result = project
                .delete(ResourceKind::Integration, id, confirm)
                .await?;
            output::emit(&result, format, None, None);
            Ok(0)
        }
    }
}

async fn list_resources(
    project: &semops::api::ProjectApi<'_>,
    kind: ResourceKind,
    format: OutputFormat,
    columns: &[&str],
    headers: &[&str],
) -> Result<i32> {
    let items = project.list(kind).await?;
    output::emit(&Value::Array(items), format, Some(columns), Some(headers));
    Ok(0)
}

/// Prints naming-convention warnings to stderr; never fails the command.
fn warn_on_naming(name: &str, view_id: i64) {
    for warning in naming::validate_template_name(name, view_id) {
        eprintln!("Warning: {warning}");
    }
}

fn set_field(fields: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value);
    }
}
