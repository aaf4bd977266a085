//! Bria API client.

use crate::download::DownloadedImage;
use crate::error::{BriaError, Result};
use crate::normalize::{normalize_response, Normalized, OperationResult};
use crate::poll::{poll_until_ready, PollPolicy, PollState, ReadinessCheck};
use crate::request::{BodyKind, OperationRequest};
use async_trait::async_trait;
use std::time::Duration;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://engine.prod.bria-api.com/v1";

const API_KEY_ENV: &str = "BRIA_API_KEY";
const BASE_URL_ENV: &str = "BRIA_BASE_URL";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const HEAD_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for [`BriaClient`].
#[derive(Debug, Clone, Default)]
pub struct BriaClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    poll_policy: PollPolicy,
    http: Option<reqwest::Client>,
}

impl BriaClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `BRIA_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `BRIA_BASE_URL`, then
    /// [`DEFAULT_BASE_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the polling policy used by [`BriaClient::wait_for_results`].
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Uses a preconfigured HTTP client (proxies, custom TLS).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Builds the client, resolving credentials.
    pub fn build(self) -> Result<BriaClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BriaError::Auth(format!("{API_KEY_ENV} not set and no API key provided"))
            })?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(BriaClient {
            http: self.http.unwrap_or_default(),
            api_key,
            base_url,
            poll_policy: self.poll_policy,
        })
    }
}

/// Client for the Bria image editing API.
///
/// Stateless apart from configuration: every call owns its request and
/// result, and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct BriaClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_policy: PollPolicy,
}

impl BriaClient {
    /// Creates a new [`BriaClientBuilder`].
    pub fn builder() -> BriaClientBuilder {
        BriaClientBuilder::new()
    }

    /// The API base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The polling policy for asynchronous results.
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    /// Sends one request and returns the normalized outcome.
    ///
    /// Transport failures are returned as [`BriaError::Network`]; every
    /// answered request, successful or not, becomes an [`OperationResult`].
    pub async fn execute(&self, request: &OperationRequest) -> Result<OperationResult> {
        Ok(self.execute_detailed(request).await?.result)
    }

    /// Like [`Self::execute`], also returning dropped-variant diagnostics.
    pub async fn execute_detailed(&self, request: &OperationRequest) -> Result<Normalized> {
        let capability = request.capability();
        let url = format!("{}{}", self.base_url, capability.path());

        tracing::debug!(
            capability = %capability,
            url = %url,
            timeout_secs = capability.timeout().as_secs(),
            input = %request.input_ref(),
            "sending request"
        );

        let builder = self
            .http
            .post(&url)
            .header("api_token", &self.api_key)
            .header("Accept", "application/json")
            .timeout(capability.timeout());
        let builder = match capability.body_kind() {
            BodyKind::Json => builder.json(&request.json_body()),
            BodyKind::Multipart => builder.multipart(request.multipart_form()?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        let mut normalized = normalize_response(status, &body, capability, &request.input_ref());

        for diagnostic in &normalized.diagnostics {
            tracing::warn!(capability = %capability, "{diagnostic}");
        }
        if let Some(failure) = normalized.result.failure() {
            tracing::warn!(capability = %capability, status, "{} failed: {failure}", capability.display_name());
        }

        if request.is_async() {
            normalized.result = normalized.result.into_pending();
        }
        Ok(normalized)
    }

    /// Posts a JSON body to `path` and returns the raw status and body.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<(u16, Vec<u8>)> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, timeout_secs = timeout.as_secs(), "sending request");

        let response = self
            .http
            .post(&url)
            .header("api_token", &self.api_key)
            .header("Accept", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }

    /// Polls pending result URLs with this client's policy.
    pub async fn wait_for_results<I, S>(&self, urls: I) -> PollState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = PollState::new(urls, &self.poll_policy);
        poll_until_ready(self, state, &self.poll_policy).await
    }

    /// Downloads a result image.
    pub async fn download(&self, url: &str) -> Result<DownloadedImage> {
        let response = self.http.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 403 || status.as_u16() == 410 {
                return Err(BriaError::UrlExpired);
            }
            return Err(BriaError::Api {
                status: status.as_u16(),
                message: "Failed to download result image".into(),
            });
        }

        let data = response.bytes().await?.to_vec();
        Ok(DownloadedImage::new(data, url))
    }
}

#[async_trait]
impl ReadinessCheck for BriaClient {
    async fn is_ready(&self, url: &str) -> bool {
        match self.http.head(url).timeout(HEAD_CHECK_TIMEOUT).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!(url = %url, "readiness check failed: {e}");
                false
            }
        }
    }
}
