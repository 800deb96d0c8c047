//! semctl end-to-end against a mock Semaphore server.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_server_config(dir: &TempDir, url: &str) -> String {
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!("[server]\nurl = \"{url}\"\ntoken = \"test-token\"\n"),
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test(flavor = "multi_thread")]
async fn integration_create_wraps_the_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/1/integrations"))
        .and(body_json(json!({
            "project_id": 1,
            "name": "gitea push",
            "template_id": 7,
            "auth_method": "token",
            "auth_secret": { "secret": "hook-secret" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_server_config(&dir, &server.uri());

    Command::cargo_bin("semctl")
        .unwrap()
        .args([
            "--config",
            &config,
            "integration",
            "create",
            "--name",
            "gitea push",
            "--template-id",
            "7",
            "--auth-method",
            "token",
            "--auth-secret",
            "hook-secret",
        ])
        .assert()
        .success();
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn template_update_warns_when_only_the_view_moves() {
    let server = MockServer::start().await;

    // Current template, fetched by the read-modify-write.
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Backup \u{2014} Vaultwarden",
            "view_id": 2
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/project/1/templates/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Backup \u{2014} Vaultwarden",
            "view_id": 9
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_server_config(&dir, &server.uri());

    // The name is untouched; the merged object still mismatches.
    Command::cargo_bin("semctl")
        .unwrap()
        .args([
            "--config", &config, "template", "update", "5", "--view-id", "9",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning:"))
        .stderr(predicate::str::contains("maps to view 2"))
        .stderr(predicate::str::contains("got 9"));
}

#[tokio::test(flavor = "multi_thread")]
async fn env_list_table_uses_human_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 4, "name": "smtp", "json": "{\"SMTP_HOST\":\"mail\"}" }
        ])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_server_config(&dir, &server.uri());

    Command::cargo_bin("semctl")
        .unwrap()
        .args(["--config", &config, "--format", "table", "env", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Variables"))
        .stdout(predicate::str::contains("SMTP_HOST"));
}

#[test]
fn schedule_create_requires_a_name() {
    Command::cargo_bin("semctl")
        .unwrap()
        .args([
            "--config",
            "/nonexistent/semops.toml",
            "schedule",
            "create",
            "--template-id",
            "1",
            "--cron",
            "0 3 * * *",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}
