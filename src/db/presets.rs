//! Preset reports: fixed, named SQL queries exposed as their own commands.
//!
//! Each preset is one parameterized statement against one of the two schemas,
//! with a fixed column/header list for table rendering. Values are always
//! bound, never interpolated; the only templating is structural (an optional
//! WHERE clause).

use super::client::{DbTarget, SqlParam};

/// A preset report ready to execute.
#[derive(Debug, Clone)]
pub struct PresetQuery {
    /// Schema the statement runs against
    pub target: DbTarget,
    /// Parameterized SQL text
    pub sql: String,
    /// Bind parameters, in placeholder order
    pub params: Vec<SqlParam>,
    /// Column keys for table rendering
    pub columns: &'static [&'static str],
    /// Column headers for table rendering
    pub headers: &'static [&'static str],
}

/// Recent backups, optionally filtered by hostname.
pub fn backups(limit: i64, host: Option<&str>) -> PresetQuery {
    let (sql, params) = match host {
        Some(host) => (
            "SELECT hostname, application, file_name, \
                    ROUND(file_size, 2) as size_mb, timestamp \
             FROM backups WHERE hostname = ? \
             ORDER BY timestamp DESC LIMIT ?",
            vec![SqlParam::Str(host.to_string()), SqlParam::Int(limit)],
        ),
        None => (
            "SELECT hostname, application, file_name, \
                    ROUND(file_size, 2) as size_mb, timestamp \
             FROM backups ORDER BY timestamp DESC LIMIT ?",
            vec![SqlParam::Int(limit)],
        ),
    };
    PresetQuery {
        target: DbTarget::Logging,
        sql: sql.to_string(),
        params,
        columns: &["hostname", "application", "file_name", "size_mb", "timestamp"],
        headers: &["Host", "Application", "File", "Size MB", "Timestamp"],
    }
}

/// Backup series whose latest successful run is older than the threshold.
pub fn stale_backups(hours: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT hostname, application, backup_subtype, \
                     MAX(timestamp) as last_backup, \
                     TIMESTAMPDIFF(HOUR, MAX(timestamp), UTC_TIMESTAMP()) as hours_ago \
              FROM backups \
              WHERE file_name NOT LIKE 'FAILED_%' \
              GROUP BY hostname, application, backup_subtype \
              HAVING hours_ago > ? \
              ORDER BY hours_ago DESC"
            .to_string(),
        params: vec![SqlParam::Int(hours)],
        columns: &["hostname", "application", "backup_subtype", "last_backup", "hours_ago"],
        headers: &["Host", "Application", "Subtype", "Last Backup", "Hours Ago"],
    }
}

/// Latest health check per host/check, filtered to non-ok statuses.
pub fn health() -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT h.hostname, h.check_name, h.check_status, h.check_value, h.timestamp \
              FROM health_checks h \
              INNER JOIN ( \
                SELECT hostname, check_name, MAX(timestamp) as max_ts \
                FROM health_checks \
                GROUP BY hostname, check_name \
              ) latest ON h.hostname = latest.hostname \
                AND h.check_name = latest.check_name \
                AND h.timestamp = latest.max_ts \
              WHERE h.check_status != 'ok' \
              ORDER BY h.hostname, h.check_name"
            .to_string(),
        params: vec![],
        columns: &["hostname", "check_name", "check_status", "check_value", "timestamp"],
        headers: &["Host", "Check", "Status", "Value", "Timestamp"],
    }
}

/// Recent restore operations.
pub fn restores(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT application, hostname, source_file, operation, \
                     status, detail, timestamp \
              FROM restores ORDER BY timestamp DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["application", "hostname", "source_file", "operation", "status", "detail", "timestamp"],
        headers: &["App", "Host", "Source", "Op", "Status", "Detail", "Timestamp"],
    }
}

/// Recent application updates.
pub fn updates(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT hostname, application, version, status, timestamp \
              FROM updates ORDER BY timestamp DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["hostname", "application", "version", "status", "timestamp"],
        headers: &["Host", "Application", "Version", "Status", "Timestamp"],
    }
}

/// Recent playbook runs.
pub fn runs(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT playbook, hostname, run_vars, timestamp \
              FROM playbook_runs ORDER BY timestamp DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["playbook", "hostname", "run_vars", "timestamp"],
        headers: &["Playbook", "Host", "Vars", "Timestamp"],
    }
}

/// Row counts for all logging tables.
pub fn table_counts() -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT 'backups' as tbl, COUNT(*) as cnt FROM backups \
              UNION ALL SELECT 'updates', COUNT(*) FROM updates \
              UNION ALL SELECT 'maintenance', COUNT(*) FROM maintenance \
              UNION ALL SELECT 'health_checks', COUNT(*) FROM health_checks \
              UNION ALL SELECT 'restores', COUNT(*) FROM restores \
              UNION ALL SELECT 'docker_sizes', COUNT(*) FROM docker_sizes \
              UNION ALL SELECT 'playbook_runs', COUNT(*) FROM playbook_runs"
            .to_string(),
        params: vec![],
        columns: &["tbl", "cnt"],
        headers: &["Table", "Rows"],
    }
}

/// Recent docker size snapshots.
pub fn docker_sizes(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Logging,
        sql: "SELECT hostname, stack, service, size_mb, timestamp \
              FROM docker_sizes ORDER BY timestamp DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["hostname", "stack", "service", "size_mb", "timestamp"],
        headers: &["Host", "Stack", "Service", "Size MB", "Timestamp"],
    }
}

/// Recent Semaphore tasks joined with their template names.
pub fn tasks(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Semaphore,
        sql: "SELECT t.name as template, th.status, th.start, th.end \
              FROM task th \
              JOIN project__template t ON th.template_id = t.id \
              ORDER BY th.start DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["template", "status", "start", "end"],
        headers: &["Template", "Status", "Start", "End"],
    }
}

/// Failed or stopped Semaphore tasks.
pub fn failed_tasks(limit: i64) -> PresetQuery {
    PresetQuery {
        target: DbTarget::Semaphore,
        sql: "SELECT t.name, th.status, th.start, th.message \
              FROM task th \
              JOIN project__template t ON th.template_id = t.id \
              WHERE th.status IN ('error', 'stopped') \
              ORDER BY th.start DESC LIMIT ?"
            .to_string(),
        params: vec![SqlParam::Int(limit)],
        columns: &["name", "status", "start", "message"],
        headers: &["Template", "Status", "Start", "Message"],
    }
}

/// Semaphore environments, optionally searched by name or variable content.
pub fn environments(search: Option<&str>) -> PresetQuery {
    let (sql, params) = match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            (
                "SELECT id, name, json FROM project__environment \
                 WHERE project_id = 1 AND (name LIKE ? OR json LIKE ?) \
                 ORDER BY name",
                vec![SqlParam::Str(pattern.clone()), SqlParam::Str(pattern)],
            )
        }
        None => (
            "SELECT id, name, json FROM project__environment \
             WHERE project_id = 1 ORDER BY name",
            vec![],
        ),
    };
    PresetQuery {
        target: DbTarget::Semaphore,
        sql: sql.to_string(),
        params,
        columns: &["id", "name", "json"],
        headers: &["ID", "Name", "Variables"],
    }
}

/// All templates with environment and view names resolved.
pub fn templates() -> PresetQuery {
    PresetQuery {
        target: DbTarget::Semaphore,
        sql: "SELECT t.id, t.name, t.playbook, e.name as environment, v.title as view \
              FROM project__template t \
              LEFT JOIN project__environment e ON t.environment_id = e.id \
              LEFT JOIN project__view v ON t.view_id = v.id \
              WHERE t.project_id = 1 \
              ORDER BY v.title, t.name"
            .to_string(),
        params: vec![],
        columns: &["id", "name", "playbook", "environment", "view"],
        headers: &["ID", "Name", "Playbook", "Environment", "View"],
    }
}

/// All schedules with template names resolved.
pub fn schedules() -> PresetQuery {
    PresetQuery {
        target: DbTarget::Semaphore,
        sql: "SELECT t.name, s.cron_format, s.name as schedule_name, s.active \
              FROM project__schedule s \
              JOIN project__template t ON s.template_id = t.id \
              WHERE s.project_id = 1 \
              ORDER BY t.name"
            .to_string(),
        params: vec![],
        columns: &["name", "cron_format", "schedule_name", "active"],
        headers: &["Template", "Cron", "Schedule Name", "Active"],
    }
}
