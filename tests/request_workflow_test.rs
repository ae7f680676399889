use httpmock::prelude::*;
use kinolist::{KinolistError, KinopoiskClient, ListOptions, ListPipeline, RequestRegistry};
use std::time::Duration;
use tempfile::TempDir;

fn mock_catalog(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/v2.2/films/328");
        then.status(200).json_body(serde_json::json!({
            "nameRu": "Зеленая миля", "year": 1999,
            "description": "x", "posterUrl": ""
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2.2/films/42");
        then.status(200).json_body(serde_json::json!({
            "nameRu": "Фильм", "year": 2010, "countries": [],
            "description": "Plot.", "posterUrl": ""
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/staff")
            .query_param("filmId", "42");
        then.status(200).json_body(serde_json::json!([]));
    });
}

#[tokio::test]
async fn run_request_stages_artifact_and_finish_cleans_up() {
    let server = MockServer::start();
    mock_catalog(&server);

    let provider = KinopoiskClient::with_base_url("test-key", server.base_url());
    let pipeline = ListPipeline::new(&provider).with_search_delay(Duration::ZERO);
    let base = TempDir::new().unwrap();
    let registry = RequestRegistry::new(base.path());

    let (guard, outcome) = pipeline
        .run_request(
            &registry,
            "chat-7",
            &["KP~42".to_string()],
            &ListOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.record_count, 1);
    assert_eq!(outcome.docx_path, guard.docx_path());
    assert!(guard.docx_path().is_file());

    let scratch = guard.dir().to_path_buf();
    guard.finish();
    assert!(!scratch.exists());
    assert!(!registry.is_active("chat-7"));
}

#[tokio::test]
async fn second_request_for_same_key_is_rejected() {
    let server = MockServer::start();
    mock_catalog(&server);

    let provider = KinopoiskClient::with_base_url("test-key", server.base_url());
    let pipeline = ListPipeline::new(&provider).with_search_delay(Duration::ZERO);
    let base = TempDir::new().unwrap();
    let registry = RequestRegistry::new(base.path());

    let (guard, _) = pipeline
        .run_request(
            &registry,
            "chat-8",
            &["KP~42".to_string()],
            &ListOptions::default(),
        )
        .await
        .unwrap();

    let err = pipeline
        .run_request(
            &registry,
            "chat-8",
            &["KP~42".to_string()],
            &ListOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KinolistError::RequestInProgress { .. }));
    // The in-flight request's artifact survives the rejection.
    assert!(guard.docx_path().is_file());
}

#[tokio::test]
async fn failed_request_releases_key_for_retry() {
    let server = MockServer::start();
    mock_catalog(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2.1/films/search-by-keyword")
            .query_param("keyword", "Unknown");
        then.status(200).json_body(serde_json::json!({
            "searchFilmsCountResult": 0, "films": []
        }));
    });

    let provider = KinopoiskClient::with_base_url("test-key", server.base_url());
    let pipeline = ListPipeline::new(&provider).with_search_delay(Duration::ZERO);
    let base = TempDir::new().unwrap();
    let registry = RequestRegistry::new(base.path());

    let err = pipeline
        .run_request(
            &registry,
            "chat-9",
            &["Unknown".to_string()],
            &ListOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KinolistError::NothingResolved));
    assert!(!registry.is_active("chat-9"));
    assert!(!base.path().join("chat-9").exists());

    // The key is free again after the failure.
    let (guard, _) = pipeline
        .run_request(
            &registry,
            "chat-9",
            &["KP~42".to_string()],
            &ListOptions::default(),
        )
        .await
        .unwrap();
    assert!(guard.docx_path().is_file());
}
