// src/services/fetch.rs

//! Raw document retrieval.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::WatcherConfig;
use crate::utils::http::create_async_client;

/// Retrieves the raw document behind a source URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &WatcherConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(url, e))?;

        response.text().await.map_err(|e| fetch_error(url, e))
    }
}

fn fetch_error(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::fetch(url, "request timed out")
    } else if let Some(status) = e.status() {
        AppError::fetch(url, format!("HTTP {status}"))
    } else {
        AppError::fetch(url, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/jdk/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ul></ul>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::from_config(&WatcherConfig::default()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/projects/jdk/", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<ul></ul>");
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::from_config(&WatcherConfig::default()).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        match err {
            AppError::Fetch { message, .. } => assert!(message.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let err = HttpFetcher::new(client)
            .fetch(&server.uri())
            .await
            .unwrap_err();
        match err {
            AppError::Fetch { message, .. } => assert_eq!(message, "request timed out"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
