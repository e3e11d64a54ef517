//! Integration tests for the project service client and the reconciler
//!
//! These tests run the real HTTP client against a mocked project service
//! and drive the reconciler through the same flows the console uses.

mod common;

use common::{project, repository, test_config};
use repobridge::reconcile::AlertVariant;
use repobridge::{HttpProjectService, ProjectService, Reconciler};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn service_for(server: &MockServer) -> HttpProjectService {
    HttpProjectService::new(&test_config(&server.uri())).expect("Failed to build client")
}

#[tokio::test]
async fn fetch_repositories_decodes_catalogue() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "1",
                "name": "alpha",
                "shortDescription": "First repository",
                "url": "https://github.com/acme/alpha",
                "projectId": null
            },
            {
                "id": "2",
                "name": "beta",
                "shortDescription": "Second repository",
                "url": "https://github.com/acme/beta",
                "projectId": "p2"
            }
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let repos = service.fetch_repositories().await.unwrap();

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].id, "1");
    assert!(!repos[0].is_linked());
    assert_eq!(repos[1].project_id, Some("p2".to_string()));
}

#[tokio::test]
async fn create_project_posts_the_repository() {
    let server = MockServer::start().await;
    let repo = repository("1", "alpha", None);

    Mock::given(method("POST"))
        .and(path("/project"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "id": "1",
            "name": "alpha",
            "shortDescription": "Description of alpha",
            "url": "https://github.com/acme/alpha",
            "projectId": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "title": "alpha",
            "repositoryId": "1"
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let created = service.create_project(&repo).await.unwrap();

    assert_eq!(created, project("p1", "alpha", "1"));
}

#[tokio::test]
async fn delete_project_addresses_the_project_id() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/project/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p2",
            "title": "beta",
            "repositoryId": "2"
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let deleted = service.delete_project("p2").await.unwrap();

    assert_eq!(deleted.repository_id, "2");
}

#[tokio::test]
async fn rejected_request_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let err = service.fetch_repositories().await.unwrap_err();

    assert!(format!("{:#}", err).contains("rejected"));
}

#[tokio::test]
async fn bulk_create_flow_links_every_selected_repository() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "1",
                "name": "alpha",
                "shortDescription": "",
                "url": "https://github.com/acme/alpha",
                "projectId": null
            },
            {
                "id": "2",
                "name": "beta",
                "shortDescription": "",
                "url": "https://github.com/acme/beta",
                "projectId": null
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "p1", "title": "alpha", "repositoryId": "1" },
            { "id": "p2", "title": "beta", "repositoryId": "2" }
        ])))
        .mount(&server)
        .await;

    let service: Arc<dyn ProjectService> = Arc::new(service_for(&server).await);
    let mut reconciler = Reconciler::new(service);

    reconciler.load().await;
    assert_eq!(reconciler.repos().len(), 2);

    reconciler.select_all(true);
    let batch = reconciler.pending_creates();
    reconciler.create_many(batch).await;

    assert_eq!(reconciler.repos()[0].project_id, Some("p1".to_string()));
    assert_eq!(reconciler.repos()[1].project_id, Some("p2".to_string()));
    assert!(reconciler.selection().is_empty());

    let alert = reconciler.alert().unwrap();
    assert_eq!(alert.variant, AlertVariant::Success);
    assert_eq!(alert.message, "Successfully created 2 projects");
}

#[tokio::test]
async fn bulk_delete_mismatch_keeps_links_and_reports_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "2",
                "name": "beta",
                "shortDescription": "",
                "url": "https://github.com/acme/beta",
                "projectId": "p2"
            }
        ])))
        .mount(&server)
        .await;

    // The service reports nothing deleted even though one was requested
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service: Arc<dyn ProjectService> = Arc::new(service_for(&server).await);
    let mut reconciler = Reconciler::new(service);

    reconciler.load().await;
    reconciler.toggle_select("2", true);

    let ids = reconciler.pending_delete_ids();
    assert_eq!(ids, vec!["p2".to_string()]);
    reconciler.delete_many(ids).await;

    assert_eq!(reconciler.repos()[0].project_id, Some("p2".to_string()));
    assert!(reconciler.selection().is_empty());

    let alert = reconciler.alert().unwrap();
    assert_eq!(alert.variant, AlertVariant::Danger);
    assert_eq!(alert.title, "Error deleting projects");
}

#[tokio::test]
async fn single_create_failure_leaves_repository_unlinked() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service: Arc<dyn ProjectService> = Arc::new(service_for(&server).await);
    let mut reconciler = Reconciler::new(service);
    reconciler.set_repos(vec![repository("1", "alpha", None)]);

    let target = reconciler.repos()[0].clone();
    reconciler.create_single(target).await;

    assert_eq!(reconciler.repos()[0].project_id, None);

    let alert = reconciler.alert().unwrap();
    assert_eq!(alert.variant, AlertVariant::Danger);
    assert!(alert.message.contains("alpha"));
}

#[tokio::test]
async fn unreachable_service_surfaces_transport_error() {
    // Port from a server that was shut down; nothing is listening
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let service = HttpProjectService::new(&test_config(&uri)).unwrap();
    let err = service.fetch_repositories().await.unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to reach the project service"));
}
