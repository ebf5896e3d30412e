//! The provider publishes no schema. Each output field is filled from the
//! first populated location in a priority table, and the tables may need new
//! entries as the payload shapes change.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::platform::Platform;

/// Fallback locations for the media URL, tried after `contents[0].videos`.
const MEDIA_URL_PATHS: [&str; 9] = [
    "/links/0/link",
    "/links/0/url",
    "/links/0/download",
    "/video/url",
    "/video/link",
    "/video/download",
    "/download/url",
    "/download/link",
    "/url",
];

const THUMBNAIL_PATHS: [&str; 5] = [
    "/contents/0/thumbnail",
    "/contents/0/image",
    "/contents/0/cover",
    "/thumbnail",
    "/image",
];

const TITLE_PATHS: [&str; 3] = ["/contents/0/title", "/contents/0/description", "/title"];

const QUALITY_FIELDS: [&str; 2] = ["label", "repId"];

const KNOWN_EXTENSIONS: [&str; 8] = ["mp4", "webm", "mov", "jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Image,
    Carousel,
}

impl MediaKind {
    fn from_upstream(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("image") => MediaKind::Image,
            Some("carousel") => MediaKind::Carousel,
            _ => MediaKind::Video,
        }
    }

    fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video | MediaKind::Carousel => "mp4",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "thumbnail", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(rename = "platform", skip_serializing_if = "Option::is_none")]
    pub platform_label: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Proxy path that saves `media_url` as an attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
}

pub fn normalize(data: &Value, platform: Platform) -> MediaResult {
    let (media_url, quality) = match featured_video(data) {
        Some((url, quality)) => (Some(url), quality),
        None => (first_text(data, &MEDIA_URL_PATHS, is_https), None),
    };

    let platform_label = data
        .get("platform")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .or_else(|| platform.label().map(ToString::to_string));
    let kind = MediaKind::from_upstream(data.get("type").and_then(Value::as_str));

    let download_path = media_url.as_deref().map(|url| {
        download_path(
            url,
            platform_label.as_deref(),
            kind,
            Utc::now().timestamp_millis(),
        )
    });

    MediaResult {
        title: first_text(data, &TITLE_PATHS, |_| true),
        thumbnail_url: first_text(data, &THUMBNAIL_PATHS, |_| true),
        media_url,
        quality,
        platform_label,
        kind,
        download_path,
    }
}

/// URL and quality label of the preferred entry in `contents[0].videos`.
///
/// The provider lists renditions from lowest to highest quality, so the last
/// entry wins; the first is only used when the last one is null.
fn featured_video(data: &Value) -> Option<(String, Option<String>)> {
    let videos = data.pointer("/contents/0/videos")?.as_array()?;
    let video = videos
        .last()
        .filter(|video| !video.is_null())
        .or_else(|| videos.first())?;

    let url = video
        .get("url")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .filter(|url| is_https(url))?;
    let quality = QUALITY_FIELDS
        .iter()
        .find_map(|field| video.get(*field).and_then(truthy_text));

    Some((url, quality))
}

fn first_text(data: &Value, paths: &[&str], accept: impl Fn(&str) -> bool) -> Option<String> {
    paths.iter().find_map(|path| {
        data.pointer(path)
            .and_then(Value::as_str)
            .and_then(non_empty)
            .filter(|value| accept(value.as_str()))
    })
}

fn is_https(value: &str) -> bool {
    value.starts_with("https://")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Text form of a JSON value the way a loosely typed client would read it:
/// null, false, zero and empty strings count as absent. Whitespace is
/// content.
pub fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Path on this service that streams `media_url` back as an attachment.
pub fn download_path(
    media_url: &str,
    platform_label: Option<&str>,
    kind: MediaKind,
    timestamp_millis: i64,
) -> String {
    let prefix = platform_label
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "media".to_string());
    let extension =
        media_extension(media_url).unwrap_or_else(|| kind.default_extension().to_string());
    let filename = format!("{prefix}_{timestamp_millis}.{extension}");

    format!(
        "/api/download-file?url={}&filename={}",
        urlencoding::encode(media_url),
        urlencoding::encode(&filename)
    )
}

fn media_extension(media_url: &str) -> Option<String> {
    let parsed = Url::parse(media_url).ok()?;
    let extension = Path::new(parsed.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())?;

    KNOWN_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
