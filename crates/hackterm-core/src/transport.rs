use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

/// Decoded backend response. Every field is optional; which one carries the
/// answer depends on the [`Endpoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendReply {
    pub reply: Option<String>,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

impl BackendReply {
    /// The answer field for `endpoint`, if present.
    pub fn answer(&self, endpoint: Endpoint) -> Option<&str> {
        match endpoint {
            Endpoint::Chat => self.reply.as_deref(),
            Endpoint::Analyze => self.analysis.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Any transport-level fault. The conversation treats every variant the
/// same way; the distinction only matters for logs.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The network call that turns a user message into a backend response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BackendReply, TransportError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Probe `GET /health`; true when the backend reports `"ok"`.
    pub async fn health(&self) -> Result<bool, TransportError> {
        let url = self.url("health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(TransportError::Status { url, status: response.status() });
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|source| TransportError::Decode { url, source })?;
        Ok(health.status == "ok")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BackendReply, TransportError> {
        let url = self.url(endpoint.path());
        tracing::debug!(%url, len = message.len(), "sending message");

        let response = self
            .client
            .post(&url)
            .json(&MessageRequest { message })
            .send()
            .await
            .map_err(|source| TransportError::Request { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(TransportError::Status { url, status: response.status() });
        }

        response
            .json::<BackendReply>()
            .await
            .map_err(|source| TransportError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP request with a canned response and hand back the raw
    /// request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn test_send_posts_message_to_endpoint_path() {
        let (base_url, server) = serve_once("200 OK", r#"{"reply":"hi"}"#).await;
        let transport = HttpTransport::new(&format!("{}/", base_url));

        let reply = transport.send(Endpoint::Chat, "hello").await.unwrap();
        assert_eq!(reply.answer(Endpoint::Chat), Some("hi"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat "));
        assert!(request.ends_with(r#"{"message":"hello"}"#));
    }

    #[tokio::test]
    async fn test_send_reads_analysis_and_error_fields() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"analysis":"bug on line 2","error":null,"extra":1}"#).await;
        let transport = HttpTransport::new(&base_url);

        let reply = transport.send(Endpoint::Analyze, "let x = ;").await.unwrap();
        assert_eq!(reply.answer(Endpoint::Analyze), Some("bug on line 2"));
        assert_eq!(reply.answer(Endpoint::Chat), None);
        assert_eq!(reply.error, None);

        assert!(server.await.unwrap().starts_with("POST /analyze "));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (base_url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let transport = HttpTransport::new(&base_url);

        let err = transport.send(Endpoint::Chat, "x").await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_an_error() {
        let (base_url, _server) = serve_once("200 OK", "not json").await;
        let transport = HttpTransport::new(&base_url);

        let err = transport.send(Endpoint::Chat, "x").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(&base_url);
        let err = transport.send(Endpoint::Chat, "x").await.unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }));
    }

    #[tokio::test]
    async fn test_health_reports_ok_status() {
        let (base_url, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;
        let transport = HttpTransport::new(&base_url);

        assert!(transport.health().await.unwrap());
        assert!(server.await.unwrap().starts_with("GET /health "));
    }
}
