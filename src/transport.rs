use async_trait::async_trait;
use axum::http::{
    Method, StatusCode,
    header::{CONTENT_TYPE, USER_AGENT},
};
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use thiserror::Error;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One call to the resolution provider.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, String)>,
    pub json_body: Option<serde_json::Value>,
}

/// Buffered provider response. Provider payloads are small JSON documents.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Unbuffered media response handed straight to the client.
pub struct MediaStream {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self(error.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;

    /// GET `url` with a desktop browser user agent and stream the body.
    async fn fetch_media(&self, url: &str) -> Result<MediaStream, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }

    async fn fetch_media(&self, url: &str) -> Result<MediaStream, TransportError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(MediaStream {
            status,
            content_type,
            body,
        })
    }
}
