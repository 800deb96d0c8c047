//! Project-scoped resource operations.
//!
//! Every remote entity lives under `/api/project/{id}/...` and is identified
//! by an integer id. Nothing is cached locally: each command re-fetches what
//! it needs. The resource families share one tagged descriptor
//! ([`ResourceKind`]) instead of per-family path plumbing.

use serde_json::{json, Value};

use super::client::ApiClient;
use super::task::{RunRequest, Task};
use crate::error::{Error, Result};

/// The CRUD-style resource families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Saved job definitions
    Template,
    /// Cron schedules attached to templates
    Schedule,
    /// Variable groups
    Environment,
    /// Host inventories
    Inventory,
    /// Template groupings
    View,
    /// Webhook integrations
    Integration,
}

impl ResourceKind {
    /// URL collection segment for this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Template => "templates",
            ResourceKind::Schedule => "schedules",
            // The server exposes these two as singular segments.
            ResourceKind::Environment => "environment",
            ResourceKind::Inventory => "inventory",
            ResourceKind::View => "views",
            ResourceKind::Integration => "integrations",
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Template => "Template",
            ResourceKind::Schedule => "Schedule",
            ResourceKind::Environment => "Environment",
            ResourceKind::Inventory => "Inventory",
            ResourceKind::View => "View",
            ResourceKind::Integration => "Integration",
        }
    }

    /// JSON key carrying the display name.
    fn name_key(&self) -> &'static str {
        match self {
            ResourceKind::View => "title",
            _ => "name",
        }
    }

    /// Key the list output is sorted by, if any.
    fn sort_key(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Template
            | ResourceKind::Environment
            | ResourceKind::Inventory => Some("name"),
            ResourceKind::View => Some("position"),
            ResourceKind::Schedule | ResourceKind::Integration => None,
        }
    }
}

/// All operations against one project.
#[derive(Debug, Clone)]
pub struct ProjectApi<'a> {
    client: &'a ApiClient,
    project: i64,
}

impl ApiClient {
    /// Scopes this client to a project id.
    pub fn project(&self, id: i64) -> ProjectApi<'_> {
        ProjectApi {
            client: self,
            project: id,
        }
    }
}

impl ProjectApi<'_> {
    fn path(&self, suffix: &str) -> String {
        format!("/api/project/{}/{suffix}", self.project)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Submits a run request and returns the created task.
    pub async fn run_task(&self, request: &RunRequest) -> Result<Task> {
        let body = serde_json::to_value(request)?;
        let value = self
            .client
            .post_slow(&self.path("tasks"), Some(&body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetches one task.
    pub async fn task(&self, id: i64) -> Result<Task> {
        let value = self.client.get(&self.path(&format!("tasks/{id}"))).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Most recent tasks, with optional client-side filters.
    pub async fn last_tasks(
        &self,
        count: Option<i64>,
        template: Option<i64>,
        status: Option<&str>,
    ) -> Result<Vec<Value>> {
        let path = match count {
            Some(count) => self.path(&format!("tasks/last?count={count}")),
            None => self.path("tasks/last"),
        };
        let value = self.client.get(&path).await?;
        let mut tasks = match value {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        if let Some(template) = template {
            tasks.retain(|t| t.get("template_id").and_then(Value::as_i64) == Some(template));
        }
        if let Some(status) = status {
            tasks.retain(|t| t.get("status").and_then(Value::as_str) == Some(status));
        }
        Ok(tasks)
    }

    /// Structured output entries of a task.
    pub async fn task_output(&self, id: i64) -> Result<Value> {
        self.client
            .get(&self.path(&format!("tasks/{id}/output")))
            .await
    }

    /// Raw log text of a task.
    pub async fn task_raw_output(&self, id: i64) -> Result<String> {
        self.client
            .get_raw(&self.path(&format!("tasks/{id}/raw_output")))
            .await
    }

    /// Requests a running task to stop.
    pub async fn stop_task(&self, id: i64) -> Result<()> {
        self.client
            .post(&self.path(&format!("tasks/{id}/stop")), None)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Project backup
    // ========================================================================

    /// Full project export.
    pub async fn backup(&self) -> Result<Value> {
        self.client.get_slow(&self.path("backup")).await
    }

    // ========================================================================
    // Generic resource CRUD
    // ========================================================================

    /// Lists a resource family, sorted the way each family is browsed.
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>> {
        let value = self.client.get(&self.path(kind.collection())).await?;
        let mut items = match value {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        match kind.sort_key() {
            Some("position") => {
                items.sort_by_key(|v| v.get("position").and_then(Value::as_i64).unwrap_or(0));
            }
            Some(key) => {
                items.sort_by(|a, b| {
                    let a = a.get(key).and_then(Value::as_str).unwrap_or("");
                    let b = b.get(key).and_then(Value::as_str).unwrap_or("");
                    a.cmp(b)
                });
            }
            None => {}
        }
        Ok(items)
    }

    /// Fetches one resource.
    pub async fn get(&self, kind: ResourceKind, id: i64) -> Result<Value> {
        self.client
            .get(&self.path(&format!("{}/{id}", kind.collection())))
            .await
    }

    /// Creates a resource from the given payload.
    pub async fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Value> {
        self.client
            .post(&self.path(kind.collection()), Some(payload))
            .await
    }

    /// Read-modify-write update: fetches the current representation, overlays
    /// only the supplied fields, PUTs the merged object back, then re-fetches
    /// for display. There is no optimistic-concurrency check; concurrent
    /// updates can race silently.
    pub async fn update(&self, kind: ResourceKind, id: i64, fields: &Value) -> Result<Value> {
        let mut current = self.get(kind, id).await?;
        let target = current.as_object_mut().ok_or_else(|| {
            Error::Request(format!("{} {id} is not a JSON object", kind.label()))
        })?;
        if let Some(fields) = fields.as_object() {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        self.client
            .put(&self.path(&format!("{}/{id}", kind.collection())), &current)
            .await?;
        self.get(kind, id).await
    }

    /// Deletes a resource, guarded by an explicit confirmation.
    ///
    /// Without `confirm` the target's current name is fetched for a clear
    /// error message and nothing is mutated.
    pub async fn delete(&self, kind: ResourceKind, id: i64, confirm: bool) -> Result<Value> {
        if !confirm {
            let current = self.get(kind, id).await?;
            let name = current
                .get(kind.name_key())
                .and_then(Value::as_str)
                .unwrap_or("?");
            return Err(Error::ConfirmationRequired {
                target: format!("{} {id} \"{name}\"", kind.label()),
            });
        }
        self.client
            .delete(&self.path(&format!("{}/{id}", kind.collection())))
            .await?;
        Ok(json!({
            "status": "ok",
            "deleted": kind.label().to_lowercase(),
            "id": id,
        }))
    }
}
