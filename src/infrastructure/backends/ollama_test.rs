use anyhow::Result;

use super::CompletionResponse;
use super::Model;
use super::ModelListResponse;
use super::Ollama;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::GenerateOptions;
use crate::domain::models::OrchestratorError;

impl Ollama {
    fn with_url(url: String) -> Ollama {
        return Ollama {
            url,
            health_check_timeout: "200".to_string(),
            generation_timeout: "5".to_string(),
        };
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(200).create_async().await;

    let backend = Ollama::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks_with_the_response_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(500).create_async().await;

    let backend = Ollama::with_url(server.url());
    let err = backend.health_check().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::BackendError { status: 500 })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_reports_unreachable_backends() {
    let backend = Ollama::with_url("http://127.0.0.1:1".to_string());
    let err = backend.health_check().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::BackendUnreachable { .. })
    ));
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let body = serde_json::to_string(&ModelListResponse {
        models: vec![
            Model {
                name: "second".to_string(),
            },
            Model {
                name: "first".to_string(),
            },
        ],
    })?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.list_models().await?;

    assert_eq!(res, vec!["first".to_string(), "second".to_string()]);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = serde_json::to_string(&CompletionResponse {
        response: "{\"a.js\": \"let a = 1;\"}".to_string(),
        done: true,
    })?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend
        .generate(
            BackendPrompt::new("add a file".to_string(), "system".to_string()),
            GenerateOptions {
                temperature: Some(0.7),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(res, "{\"a.js\": \"let a = 1;\"}");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_reports_backend_errors_with_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .with_status(500)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let err = backend
        .generate(
            BackendPrompt::new("prompt".to_string(), "system".to_string()),
            GenerateOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::BackendError { status: 500 })
    ));
    mock.assert_async().await;
}
