//! Scripted transport and server builder shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use futures::{StreamExt, stream};
use mediafetch::{
    AppState,
    config::Config,
    routes::router,
    transport::{MediaStream, Transport, TransportError, UpstreamRequest, UpstreamResponse},
};
use serde_json::Value;

pub const TEST_API_HOST: &str = "downloader.test.rapidapi.com";
pub const TEST_API_KEY: &str = "test-key";

pub type Reply = Result<UpstreamResponse, TransportError>;

pub enum MediaReply {
    Stream {
        status: StatusCode,
        content_type: Option<&'static str>,
        chunks: Vec<&'static str>,
    },
    Fail(&'static str),
}

/// Replays queued provider replies in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    media_reply: Mutex<Option<MediaReply>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    media_requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn with_media(reply: MediaReply) -> Arc<Self> {
        Arc::new(Self {
            media_reply: Mutex::new(Some(reply)),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn media_requests(&self) -> Vec<String> {
        self.media_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted reply left".to_string())))
    }

    async fn fetch_media(&self, url: &str) -> Result<MediaStream, TransportError> {
        self.media_requests.lock().unwrap().push(url.to_string());
        match self.media_reply.lock().unwrap().take() {
            Some(MediaReply::Stream {
                status,
                content_type,
                chunks,
            }) => Ok(MediaStream {
                status,
                content_type: content_type.map(ToString::to_string),
                body: stream::iter(
                    chunks
                        .into_iter()
                        .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes()))),
                )
                .boxed(),
            }),
            Some(MediaReply::Fail(message)) => Err(TransportError(message.to_string())),
            None => Err(TransportError("no scripted media reply".to_string())),
        }
    }
}

pub fn json_reply(status: u16, body: Value) -> Reply {
    Ok(UpstreamResponse {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
    })
}

pub fn text_reply(status: u16, body: &str) -> Reply {
    Ok(UpstreamResponse {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
    })
}

pub fn transport_failure(message: &str) -> Reply {
    Err(TransportError(message.to_string()))
}

pub fn test_server(transport: Arc<ScriptedTransport>, api_key: Option<&str>) -> TestServer {
    let api_key = api_key.map(ToString::to_string);
    let config = Config::from_lookup(|name| match name {
        "RAPID_API_KEY" => api_key.clone(),
        "RAPID_API_HOST" => Some(TEST_API_HOST.to_string()),
        _ => None,
    });

    let state = AppState::new(transport, &config);
    TestServer::new(router(state)).unwrap()
}

pub fn header<'a>(request: &'a UpstreamRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}
