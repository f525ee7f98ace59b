//! Integration tests for the configuration API client
//!
//! Uses mockito to fake the backend and pin the wire shape: per-service
//! `{ compute, replicas }` objects, JSON nulls on disable, retry behavior.

use computectl::allocation::{ResourcePool, Service};
use computectl::api::{pool_from_remote, ResourcesClient, ResourcesConfig};
use computectl::error::ComputectlError;
use computectl::retry::{ExponentialBackoffPolicy, RetryPolicy};

fn resources_body() -> String {
    serde_json::json!({
        "config": {
            "postgres": { "resources": { "compute": { "cpu": 1000, "memory": 2048 }, "replicas": 1 } },
            "hasura": { "resources": { "compute": { "cpu": 500, "memory": 1536 }, "replicas": 1 } },
            "auth": { "resources": { "compute": { "cpu": 250, "memory": 256 }, "replicas": 1 } },
            "storage": { "resources": { "compute": { "cpu": 250, "memory": 256 }, "replicas": 1 } },
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_fetch_resources_builds_enabled_pool() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/apps/app-1/resources")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(resources_body())
        .create_async()
        .await;

    let client = ResourcesClient::new(server.url());
    let remote = client.fetch_resources("app-1").await.unwrap();
    let pool = pool_from_remote(&remote);

    mock.assert_async().await;
    assert!(pool.enabled);
    assert_eq!(pool.total_available_vcpu, 2000);
    assert_eq!(pool.total_available_memory, 4096);
    assert_eq!(pool.database.vcpu, 1000);
    assert!(pool.unallocated().is_fully_allocated());
}

#[tokio::test]
async fn test_fetch_resources_all_null_means_disabled() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/apps/app-1/resources")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "config": {
                    "postgres": { "resources": null },
                    "hasura": { "resources": null },
                    "auth": { "resources": null },
                    "storage": { "resources": null },
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ResourcesClient::new(server.url());
    let remote = client.fetch_resources("app-1").await.unwrap();
    let pool = pool_from_remote(&remote);

    assert!(!pool.enabled);
    // Defaults are seeded so re-enabling starts from a sane allocation.
    assert_eq!(pool.database.vcpu, 1000);
}

#[tokio::test]
async fn test_update_sends_batch_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/apps/app-1/resources")
        .match_header("x-admin-secret", "s3cret")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "appId": "app-1",
            "config": {
                "postgres": { "resources": { "compute": { "cpu": 1000, "memory": 2048 }, "replicas": 1 } },
                "storage": { "resources": { "compute": { "cpu": 250, "memory": 256 }, "replicas": 1 } },
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let client =
        ResourcesClient::new(server.url()).with_admin_secret("s3cret".to_string());
    let update = ResourcesConfig::from_pool(&ResourcePool::default());
    client.update_resources("app-1", &update).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_disable_sends_nulls_for_every_service() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/apps/app-1/resources")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "appId": "app-1",
            "config": {
                "postgres": { "resources": null },
                "hasura": { "resources": null },
                "auth": { "resources": null },
                "storage": { "resources": null },
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let client = ResourcesClient::new(server.url());
    let update = ResourcesConfig::from_pool(&ResourcePool::disabled());
    client.update_resources("app-1", &update).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/apps/app-1/resources")
        .with_status(503)
        .with_body("try later")
        .expect(2)
        .create_async()
        .await;

    let client = ResourcesClient::new(server.url());
    let policy = ExponentialBackoffPolicy::new(2);

    let err = policy
        .execute_with_retry(|| client.fetch_resources("app-1"))
        .await
        .unwrap_err();

    // Both attempts hit the backend before the policy gave up.
    mock.assert_async().await;
    assert!(matches!(err, ComputectlError::Retryable { .. }));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/apps/unknown/resources")
        .with_status(404)
        .with_body("app not found")
        .expect(1)
        .create_async()
        .await;

    let client = ResourcesClient::new(server.url());
    let policy = ExponentialBackoffPolicy::new(5);
    let update = ResourcesConfig::from_pool(&ResourcePool::default());

    let err = policy
        .execute_with_retry(|| client.update_resources("unknown", &update))
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        ComputectlError::Api {
            status, retryable, ..
        } => {
            assert_eq!(status, 404);
            assert!(!retryable);
        }
        other => panic!("expected Api error, got {other}"),
    }
}

#[test]
fn test_submission_blocked_before_any_request() {
    // The exact-use check runs before the client is ever involved.
    let mut pool = ResourcePool::default();
    pool.set_vcpu(Service::Database, 800).unwrap();
    let err = computectl::validation::check_fully_allocated(&pool).unwrap_err();
    assert!(err.to_string().contains("unused"));
}
