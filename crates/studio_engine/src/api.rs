use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use studio_logging::studio_debug;
use url::Url;

use crate::{ApiError, ChatTurn, JobId, JobStatusReport, RemoteJobStatus, VideoUpload};

const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Bound for chat completions and status polls.
    pub request_timeout: Duration,
    /// Bound for uploads and result downloads.
    pub transfer_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            transfer_timeout: Duration::from_secs(600),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }
}

/// The three backend operations plus result download. Implementations keep no
/// per-request state.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn complete_chat(&self, turns: &[ChatTurn]) -> Result<String, ApiError>;

    async fn submit_video_job(&self, upload: &VideoUpload, prompt: &str) -> Result<JobId, ApiError>;

    async fn fetch_job_status(&self, job_id: &str) -> Result<JobStatusReport, ApiError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    video_url: Option<String>,
    error: Option<String>,
    message: Option<String>,
    elapsed_sec: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::InvalidBaseUrl(format!("{}: {err}", settings.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::unavailable(err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ApiClient for ReqwestApiClient {
    async fn complete_chat(&self, turns: &[ChatTurn]) -> Result<String, ApiError> {
        let url = self.endpoint(&["v1", "chat", "completions"])?;
        studio_debug!("POST {} with {} turn(s)", url, turns.len());
        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .json(&ChatRequest { messages: turns })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: ChatResponse = decode(check_status(response).await?).await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ApiError::InvalidResponse("completion has no choices".to_string()))
    }

    async fn submit_video_job(&self, upload: &VideoUpload, prompt: &str) -> Result<JobId, ApiError> {
        let bytes = tokio::fs::read(&upload.path)
            .await
            .map_err(|err| ApiError::LocalFile {
                path: upload.path.display().to_string(),
                message: err.to_string(),
            })?;
        let byte_len = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|err| ApiError::LocalFile {
                path: upload.path.display().to_string(),
                message: err.to_string(),
            })?;
        let form = Form::new()
            .part("video", part)
            .text("prompt", prompt.to_string());

        let url = self.endpoint(&["video", "edit"])?;
        studio_debug!("POST {} ({} bytes)", url, byte_len);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.transfer_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: SubmitResponse = decode(check_status(response).await?).await?;
        if body.job_id.trim().is_empty() {
            return Err(ApiError::InvalidResponse("empty job_id".to_string()));
        }
        Ok(body.job_id)
    }

    async fn fetch_job_status(&self, job_id: &str) -> Result<JobStatusReport, ApiError> {
        let url = self.endpoint(&["video", "status", job_id])?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: StatusResponse = decode(check_status(response).await?).await?;
        let status = RemoteJobStatus::parse(&body.status).ok_or_else(|| {
            ApiError::InvalidResponse(format!("unknown job status {:?}", body.status))
        })?;
        Ok(JobStatusReport {
            status,
            video_url: body.video_url.filter(|url| !url.trim().is_empty()),
            error: body.error,
            message: body.message,
            elapsed_sec: body.elapsed_sec.map(|secs| secs.max(0.0) as u64),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let parsed = Url::parse(url).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        let max_bytes = self.settings.max_download_bytes;
        let response = self
            .client
            .get(parsed)
            .timeout(self.settings.transfer_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = describe_failure(status, &body);
    if status.is_client_error() {
        Err(ApiError::ValidationRejected {
            status: status.as_u16(),
            detail,
        })
    } else {
        Err(ApiError::RemoteUnavailable {
            status: Some(status.as_u16()),
            message: detail,
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

/// Best human-readable detail for a failed response: the JSON `detail`
/// (string or list of `msg`s), then `error`/`message`, then the raw body.
fn describe_failure(status: StatusCode, body: &str) -> String {
    if let Some(detail) = extract_detail(body) {
        return detail;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.to_string();
    }
    truncate_chars(trimmed, MAX_DETAIL_CHARS)
}

fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key))?;
    match detail {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &input[..idx]),
        None => input.to_string(),
    }
}

fn too_large(max_bytes: u64, actual: u64) -> ApiError {
    ApiError::InvalidResponse(format!(
        "result too large (max {max_bytes} bytes, got at least {actual})"
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::unavailable(format!("request timed out: {err}"));
    }
    if err.is_connect() {
        return ApiError::unavailable(format!("connection failed: {err}"));
    }
    ApiError::unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{describe_failure, extract_detail, truncate_chars};
    use reqwest::StatusCode;

    #[test]
    fn detail_string_is_used_verbatim() {
        assert_eq!(
            extract_detail(r#"{"detail":"Only video files are accepted"}"#).as_deref(),
            Some("Only video files are accepted")
        );
    }

    #[test]
    fn validation_error_list_is_joined() {
        let body = r#"{"detail":[{"loc":["body","prompt"],"msg":"field required"},{"msg":"bad video"}]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("field required; bad video")
        );
    }

    #[test]
    fn falls_back_to_body_then_status() {
        assert_eq!(
            describe_failure(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(
            describe_failure(StatusCode::SERVICE_UNAVAILABLE, ""),
            "503 Service Unavailable"
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("əəəə", 2), "əə…");
        assert_eq!(truncate_chars("ok", 2), "ok");
    }
}
