//! Executes `HttpRequest` values for hosts that let the core do its own I/O.
//!
//! The trait is the seam the repository is generic over: production code
//! uses [`ReqwestTransport`], tests plug in scripted transports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip. Non-2xx statuses are returned as data; only
    /// failures to obtain a response are errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}

/// `Transport` backed by a shared `reqwest::Client`.
///
/// Only a connect timeout is applied; reads wait as long as the server
/// takes. Dropping the `execute` future cancels the request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn map_error(error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            return ApiError::Timeout;
        }
        // The query carries credentials; keep it out of the message.
        ApiError::Transport(error.without_url().to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let path = request
            .url
            .split_once('?')
            .map_or(request.url.as_str(), |(path, _)| path);
        tracing::debug!(%method, path, "sending request");

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Self::map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(Self::map_error)?;
        tracing::debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport
            .execute(HttpRequest {
                method: HttpMethod::Post,
                url: format!("http://127.0.0.1:{port}/live/api.php"),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_) | ApiError::Timeout));
    }

    #[tokio::test]
    async fn transport_error_hides_query_string() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport
            .execute(HttpRequest {
                method: HttpMethod::Post,
                url: format!(
                    "http://127.0.0.1:{port}/live/api.php?req=createOauthkey&login=jane%40example.com&pwd=hunter2"
                ),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("hunter2"), "{message}");
        assert!(!message.contains("example.com"), "{message}");
    }
}
