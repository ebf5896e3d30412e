use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    error::ResolveError,
    media::{MediaResult, normalize, truthy_text},
    platform::{Platform, instagram_shortcode},
    transport::{Transport, UpstreamRequest},
};

pub const TIKTOK_ENDPOINT: &str = "/tiktok/v3/post/details";
pub const INSTAGRAM_ENDPOINT: &str = "/instagram/v3/media/post/details";
pub const FACEBOOK_ENDPOINT: &str = "/facebook/v3/post/details";

const ALL_ENDPOINTS: [&str; 3] = [TIKTOK_ENDPOINT, INSTAGRAM_ENDPOINT, FACEBOOK_ENDPOINT];

const ATTEMPT_METHODS: [Method; 2] = [Method::GET, Method::POST];

/// Payload messages meaning "wrong endpoint" rather than a real failure.
const MISSING_ENDPOINT_MARKERS: [&str; 2] = ["does not exist", "not found"];

const ERROR_MESSAGE_FIELDS: [&str; 3] = ["message", "error", "errorMessage"];

const RAW_BODY_LOG_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    source_url: String,
}

impl MediaRequest {
    /// Accepts a raw query value. The link must be an absolute http(s) URL.
    pub fn parse(raw: Option<&str>) -> Result<Self, ResolveError> {
        let source_url = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ResolveError::Validation("URL is required".to_string()))?;

        let has_allowed_scheme = Url::parse(source_url)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !has_allowed_scheme {
            return Err(ResolveError::Validation(
                "Invalid URL. Paste the full http(s) link of a TikTok, Instagram or Facebook post."
                    .to_string(),
            ));
        }

        Ok(Self {
            source_url: source_url.to_string(),
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub endpoint: &'static str,
    pub method: Method,
}

/// Ordered endpoints plus the single parameter every attempt carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePlan {
    pub platform: Platform,
    pub endpoints: Vec<&'static str>,
    pub param: (&'static str, String),
}

impl CandidatePlan {
    pub fn for_url(source_url: &str) -> Result<Self, ResolveError> {
        let platform = Platform::classify(source_url);
        let url_param = ("url", source_url.to_string());

        let (endpoints, param) = match platform {
            Platform::TikTok => (vec![TIKTOK_ENDPOINT], url_param),
            Platform::Instagram => {
                let shortcode = instagram_shortcode(source_url).ok_or_else(|| {
                    ResolveError::Validation(
                        "Invalid Instagram URL. Please provide a valid Instagram post/reel URL."
                            .to_string(),
                    )
                })?;
                (vec![INSTAGRAM_ENDPOINT], ("shortcode", shortcode.to_string()))
            }
            Platform::Facebook => (vec![FACEBOOK_ENDPOINT], url_param),
            Platform::Unknown => (ALL_ENDPOINTS.to_vec(), url_param),
        };

        Ok(Self {
            platform,
            endpoints,
            param,
        })
    }

    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.endpoints.iter().flat_map(|&endpoint| {
            ATTEMPT_METHODS
                .into_iter()
                .map(move |method| Candidate { endpoint, method })
        })
    }
}

/// What the attempts left behind, used to explain an overall failure.
#[derive(Debug, Default)]
struct AttemptLog {
    last_status: Option<StatusCode>,
    last_payload: Option<Value>,
    last_error: Option<Value>,
    last_transport_error: Option<String>,
}

impl AttemptLog {
    fn into_error(self) -> ResolveError {
        let Some(status) = self.last_status else {
            return ResolveError::Network(
                self.last_transport_error
                    .unwrap_or_else(|| "no response from provider".to_string()),
            );
        };

        let message = self
            .last_error
            .as_ref()
            .and_then(error_message)
            .or_else(|| self.last_payload.as_ref().and_then(error_message))
            .unwrap_or_else(|| format!("API returned status {}", status.as_u16()));
        let status = if status.is_client_error() || status.is_server_error() {
            status
        } else {
            StatusCode::BAD_GATEWAY
        };

        ResolveError::UpstreamUnavailable { message, status }
    }
}

pub struct Resolver {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    api_host: String,
}

impl Resolver {
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>, api_host: String) -> Self {
        Self {
            transport,
            api_key,
            api_host,
        }
    }

    pub async fn resolve(&self, request: &MediaRequest) -> Result<MediaResult, ResolveError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("RAPID_API_KEY is not configured");
            ResolveError::MissingApiKey
        })?;
        let plan = CandidatePlan::for_url(request.source_url())?;

        let span = info_span!(
            "resolve",
            request_id = %Uuid::new_v4(),
            platform = ?plan.platform
        );

        async move {
            let data = self.first_success(api_key, &plan).await?;

            if let Some(upstream_error) = data.get("error").and_then(truthy_text) {
                warn!("Provider reported an error: {upstream_error}");
                return Err(ResolveError::Upstream(upstream_error));
            }

            Ok(normalize(&data, plan.platform))
        }
        .instrument(span)
        .await
    }

    async fn first_success(
        &self,
        api_key: &str,
        plan: &CandidatePlan,
    ) -> Result<Value, ResolveError> {
        let mut log = AttemptLog::default();

        for candidate in plan.candidates() {
            let request = self.build_request(api_key, &candidate, &plan.param);

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(
                        "Request to {} ({}) failed: {error}",
                        candidate.endpoint, candidate.method
                    );
                    log.last_transport_error = Some(error.to_string());
                    continue;
                }
            };

            info!(
                "Endpoint {} ({}) answered with status {}",
                candidate.endpoint, candidate.method, response.status
            );
            debug!(
                "Raw response: {}",
                response.body.chars().take(RAW_BODY_LOG_LIMIT).collect::<String>()
            );
            log.last_status = Some(response.status);

            let data: Value = match serde_json::from_str(&response.body) {
                Ok(data) => data,
                Err(error) => {
                    warn!(
                        "Could not parse JSON from {} ({}): {error}",
                        candidate.endpoint, candidate.method
                    );
                    continue;
                }
            };

            if response.status.is_success() {
                info!("Resolved with {} using {}", candidate.endpoint, candidate.method);
                return Ok(data);
            }

            if reports_missing_endpoint(&data) {
                info!(
                    "Endpoint {} ({}) does not exist, trying next",
                    candidate.endpoint, candidate.method
                );
            } else if response.status != StatusCode::NOT_FOUND
                && response.status != StatusCode::BAD_REQUEST
            {
                log.last_error = Some(data.clone());
            }
            log.last_payload = Some(data);
        }

        let failure = log.into_error();
        error!("All endpoints failed: {failure}");
        Err(failure)
    }

    fn build_request(
        &self,
        api_key: &str,
        candidate: &Candidate,
        param: &(&'static str, String),
    ) -> UpstreamRequest {
        let headers = vec![
            ("x-rapidapi-key", api_key.to_string()),
            ("x-rapidapi-host", self.api_host.clone()),
            ("content-type", "application/json".to_string()),
        ];
        let url = format!("https://{}{}", self.api_host, candidate.endpoint);

        if candidate.method == Method::GET {
            UpstreamRequest {
                method: Method::GET,
                url,
                headers,
                query: vec![param.clone()],
                json_body: None,
            }
        } else {
            let mut body = Map::new();
            body.insert(param.0.to_string(), Value::String(param.1.clone()));
            UpstreamRequest {
                method: candidate.method.clone(),
                url,
                headers,
                query: Vec::new(),
                json_body: Some(Value::Object(body)),
            }
        }
    }
}

fn reports_missing_endpoint(data: &Value) -> bool {
    let message = data
        .get("message")
        .and_then(truthy_text)
        .or_else(|| data.get("error").and_then(truthy_text))
        .unwrap_or_default()
        .to_lowercase();

    MISSING_ENDPOINT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

fn error_message(data: &Value) -> Option<String> {
    ERROR_MESSAGE_FIELDS
        .iter()
        .find_map(|field| data.get(*field).and_then(truthy_text))
}
