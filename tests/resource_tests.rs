//! Resource CRUD behavior: list sorting, read-modify-write updates, and the
//! delete confirmation guard.

use semops::api::{ApiClient, ResourceKind};
use semops::config::ServerSettings;
use semops::error::Error;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ServerSettings {
        url: server.uri(),
        token: "test-token".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn unconfirmed_delete_fetches_name_and_never_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Backup \u{2014} Vaultwarden"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/project/1/templates/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let err = project
        .delete(ResourceKind::Template, 5, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfirmationRequired { .. }));
    let detail = err.detail().unwrap();
    assert!(detail.contains("Template 5"));
    assert!(detail.contains("Backup \u{2014} Vaultwarden"));
    server.verify().await;
}

#[tokio::test]
async fn confirmed_delete_issues_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/project/1/schedules/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let result = project
        .delete(ResourceKind::Schedule, 7, true)
        .await
        .unwrap();
    assert_eq!(result, json!({ "status": "ok", "deleted": "schedule", "id": 7 }));
    server.verify().await;
}

#[tokio::test]
async fn views_are_identified_by_title_in_the_guard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/views/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "title": "Backups",
            "position": 2
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let err = project
        .delete(ResourceKind::View, 2, false)
        .await
        .unwrap_err();
    assert!(err.detail().unwrap().contains("Backups"));
}

#[tokio::test]
async fn update_merges_fields_into_the_current_object() {
    let server = MockServer::start().await;

    // First GET returns the current object; after the PUT the re-fetch sees
    // the new name.
    Mock::given(method("GET"))
        .and(path("/api/project/1/environment/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "project_id": 1,
            "name": "old name",
            "json": "{}"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/project/1/environment/3"))
        .and(body_json(json!({
            "id": 3,
            "project_id": 1,
            "name": "new name",
            "json": "{}"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/environment/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "project_id": 1,
            "name": "new name",
            "json": "{}"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let updated = project
        .update(ResourceKind::Environment, 3, &json!({ "name": "new name" }))
        .await
        .unwrap();
    assert_eq!(updated["name"], "new name");
    // Untouched fields survived the merge.
    assert_eq!(updated["json"], "{}");
    server.verify().await;
}

#[tokio::test]
async fn template_list_is_sorted_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "name": "Update \u{2014} Portainer" },
            { "id": 1, "name": "Backup \u{2014} Gitea" }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let templates = project.list(ResourceKind::Template).await.unwrap();
    assert_eq!(templates[0]["name"], "Backup \u{2014} Gitea");
    assert_eq!(templates[1]["name"], "Update \u{2014} Portainer");
}

#[tokio::test]
async fn view_list_is_sorted_by_position() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/views"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "title": "Setup", "position": 9 },
            { "id": 2, "title": "Backups", "position": 2 }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let views = project.list(ResourceKind::View).await.unwrap();
    assert_eq!(views[0]["title"], "Backups");
    assert_eq!(views[1]["title"], "Setup");
}

#[tokio::test]
async fn last_tasks_filters_client_side() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/tasks/last"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "template_id": 5, "status": "success" },
            { "id": 2, "template_id": 6, "status": "error" },
            { "id": 3, "template_id": 5, "status": "error" }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let project = client.project(1);

    let tasks = project
        .last_tasks(Some(20), Some(5), Some("error"))
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], 3);
}
