//! Metadata document fetcher.
//!
//! A plain `GET` with `accept: application/json`. The body is returned as raw
//! bytes; deciding whether it is usable JSON is the resolver's job.

use async_trait::async_trait;
use std::time::Duration;

use chainnft_core::error::TransportError;
use chainnft_core::metadata::MetadataSource;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub request_timeout: Duration,
    /// Bodies larger than this are rejected.
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

pub struct HttpMetadataSource {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpMetadataSource {
    pub fn new(config: GatewayConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.config.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Http(format!("HTTP {}: {url}", status.as_u16())));
        }
        if let Some(len) = resp.content_length() {
            if len > self.config.max_body_bytes as u64 {
                return Err(TransportError::Other(format!(
                    "metadata body of {len} bytes exceeds limit"
                )));
            }
        }

        // Chunked bodies carry no length up front; stop reading at the cap.
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.map_reqwest(e))? {
            if body.len() + chunk.len() > self.config.max_body_bytes {
                return Err(TransportError::Other(format!(
                    "metadata body exceeds limit of {} bytes",
                    self.config.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        tracing::trace!(url, bytes = body.len(), "fetched metadata");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ipfs/Qm123/1"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"Ape #1"}"#))
            .mount(&server)
            .await;

        let source = HttpMetadataSource::new(GatewayConfig::default()).unwrap();
        let body = source
            .fetch(&format!("{}/ipfs/Qm123/1", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, br#"{"name":"Ape #1"}"#);
    }

    #[tokio::test]
    async fn not_found_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpMetadataSource::new(GatewayConfig::default()).unwrap();
        let err = source.fetch(&format!("{}/missing", server.uri())).await.unwrap_err();
        assert!(matches!(err, TransportError::Http(ref m) if m.contains("404")));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&server)
            .await;

        let source = HttpMetadataSource::new(GatewayConfig {
            max_body_bytes: 1024,
            ..GatewayConfig::default()
        })
        .unwrap();
        assert!(source.fetch(&server.uri()).await.is_err());
    }

    #[tokio::test]
    async fn chunked_body_stops_at_the_cap() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let chunk = "y".repeat(512);
            let mut response =
                String::from("HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n");
            for _ in 0..8 {
                response.push_str(&format!("{:x}\r\n{chunk}\r\n", chunk.len()));
            }
            response.push_str("0\r\n\r\n");
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let source = HttpMetadataSource::new(GatewayConfig {
            max_body_bytes: 1024,
            ..GatewayConfig::default()
        })
        .unwrap();
        let err = source.fetch(&format!("http://{addr}/meta")).await.unwrap_err();
        assert!(matches!(err, TransportError::Other(ref m) if m.contains("exceeds limit")));
    }
}
