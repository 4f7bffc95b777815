use crate::core::Source;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Downloads the compressed CSV over HTTP(S) in a single attempt.
pub struct HttpSource {
    client: Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::info!("Downloading CSV file from {}", self.url);

        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Download response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/data.csv.gz");
            then.status(200)
                .header("Content-Type", "application/gzip")
                .body(vec![0x1f, 0x8b, 0x08]);
        });

        let source = HttpSource::new(server.url("/data.csv.gz"));
        let body = source.fetch().await.unwrap();

        mock.assert();
        assert_eq!(body, vec![0x1f, 0x8b, 0x08]);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing.csv.gz");
            then.status(404);
        });

        let source = HttpSource::new(server.url("/missing.csv.gz"));
        let err = source.fetch().await.unwrap_err();

        mock.assert();
        assert!(matches!(err, EtlError::HttpStatusError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_api_error() {
        // 埠號 9 幾乎不會有服務在聽
        let source = HttpSource::new("http://127.0.0.1:9/data.csv.gz")
            .with_timeout(Some(Duration::from_secs(5)));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, EtlError::ApiError(_)));
    }
}
