use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use wreq::multipart::{Form, Part};
use wreq::Client;

pub const MAX_VIDEO_BYTES: usize = 200 * 1024 * 1024;
pub const ALLOWED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-msvideo",
    "video/x-matroska",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedVideo {
    pub uid: String,
    pub playback_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<StreamMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamVideo {
    uid: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    playback: Option<StreamPlayback>,
}

#[derive(Debug, Deserialize)]
struct StreamPlayback {
    #[serde(default)]
    hls: Option<String>,
}

impl<T> StreamEnvelope<T> {
    fn error_message(&self) -> String {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        if messages.is_empty() {
            "unknown error".to_string()
        } else {
            messages.join("; ")
        }
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_display_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}

/// Client for the hosted video streaming service.
pub struct StreamClient {
    client: Client,
    api_url: String,
    account_id: String,
    api_token: String,
}

impl StreamClient {
    pub fn new(api_url: &str, account_id: &str, api_token: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            account_id: account_id.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn stream_url(&self) -> String {
        format!("{}/accounts/{}/stream", self.api_url, self.account_id)
    }

    pub async fn upload(&self, data: Vec<u8>, display_name: &str, content_type: &str) -> Result<UploadedVideo> {
        let part = Part::bytes(data)
            .file_name(display_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.stream_url())
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let envelope: StreamEnvelope<StreamVideo> = response.json().await?;
        if !status.is_success() || !envelope.success {
            return Err(anyhow!("Video upload failed: {}", envelope.error_message()));
        }

        let video = envelope
            .result
            .ok_or_else(|| anyhow!("Video upload returned no result"))?;
        info!("Uploaded video {} as {}", display_name, video.uid);

        Ok(UploadedVideo {
            uid: video.uid,
            playback_url: video.playback.and_then(|p| p.hls),
            thumbnail_url: video.thumbnail,
        })
    }

    pub async fn delete(&self, uid: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.stream_url(), uid))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if response.status().is_success() {
            info!("Deleted video {}", uid);
            Ok(())
        } else {
            Err(anyhow!("Video delete failed: HTTP {}", response.status().as_u16()))
        }
    }
}
