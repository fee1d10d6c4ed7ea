use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

/// Image responses whose declared length is below this are thumbnails,
/// tracking pixels or error placeholders.
pub const DEFAULT_MIN_IMAGE_BYTES: u64 = 2048;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub min_image_bytes: u64,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            max_bytes: 20 * 1024 * 1024,
            user_agent: concat!("image_harvester/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Size constraints applied while streaming one response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BodyLimits {
    /// When set, the response must declare a `Content-Length` of at least this.
    pub min_declared: Option<u64>,
    pub max_bytes: u64,
}

pub(crate) fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .user_agent(settings.user_agent.as_str())
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

/// Streaming GET of `url`, enforcing `limits` before and during the download.
pub(crate) async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    limits: BodyLimits,
) -> Result<FetchOutput, FetchError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }

    let declared_len = response.content_length();
    if let Some(min_bytes) = limits.min_declared {
        if declared_len.is_none_or(|len| len < min_bytes) {
            return Err(FetchError::new(
                FailureKind::TooSmall {
                    min_bytes,
                    declared: declared_len,
                },
                "declared content length below minimum",
            ));
        }
    }
    if let Some(content_len) = declared_len {
        if content_len > limits.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: limits.max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let mut bytes = Vec::with_capacity(declared_len.unwrap_or(0).min(limits.max_bytes) as usize);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > limits.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: limits.max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    let metadata = FetchMetadata {
        original_url: url.to_string(),
        final_url,
        content_type,
        declared_len,
        byte_len: bytes.len() as u64,
    };

    Ok(FetchOutput { bytes, metadata })
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
