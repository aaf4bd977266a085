//! Foreground erase and masked generative fill.

use super::{request_with_image, require_text};
use crate::client::BriaClient;
use crate::error::{BriaError, Result};
use crate::normalize::OperationResult;
use crate::request::{Capability, OperationRequest};
use base64::Engine;

/// Removes the foreground subject and fills in the background behind it.
#[derive(Debug, Clone)]
pub struct EraseForegroundRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Keep the alpha channel.
    pub preserve_alpha: bool,
    /// Wait for the result instead of returning a pending URL.
    pub sync: bool,
}

impl Default for EraseForegroundRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            preserve_alpha: true,
            sync: true,
        }
    }
}

impl EraseForegroundRequest {
    /// Creates a request for the image at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Creates a request for uploaded image bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            image_bytes: Some(data),
            ..Self::default()
        }
    }

    /// Sets whether the alpha channel is kept.
    pub fn with_preserve_alpha(mut self, preserve: bool) -> Self {
        self.preserve_alpha = preserve;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        request_with_image(Capability::EraseForeground, &self.image_bytes, &self.image_url)
            .option("preserve_alpha", self.preserve_alpha)
            .sync(self.sync)
            .build()
    }
}

/// Mask marking the region to regenerate. White pixels are filled.
#[derive(Clone, PartialEq, Eq)]
pub enum MaskSource {
    /// Mask image bytes, sent base64-encoded as `mask_file`.
    Bytes(Vec<u8>),
    /// Publicly reachable mask URL, sent as `mask_url`.
    Url(String),
}

impl std::fmt::Debug for MaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Regenerates a masked region from a prompt.
#[derive(Debug, Clone)]
pub struct GenerativeFillRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Region to fill.
    pub mask: Option<MaskSource>,
    /// What to generate inside the mask.
    pub prompt: String,
    /// What to avoid.
    pub negative_prompt: Option<String>,
    /// Number of variants.
    pub num_results: u32,
    /// Wait for results instead of returning pending URLs.
    pub sync: bool,
    /// Seed for reproducible output.
    pub seed: Option<u64>,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl GenerativeFillRequest {
    /// Creates a request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            mask: None,
            prompt: prompt.into(),
            negative_prompt: None,
            num_results: 1,
            sync: false,
            seed: None,
            content_moderation: false,
        }
    }

    /// Sets the input image URL.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Sets the input image bytes.
    pub fn with_image_bytes(mut self, data: Vec<u8>) -> Self {
        self.image_bytes = Some(data);
        self
    }

    /// Sets the mask.
    pub fn with_mask(mut self, mask: MaskSource) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    /// Sets the number of variants.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let capability = Capability::GenerativeFill;
        require_text(capability, "prompt", &self.prompt)?;

        let builder = request_with_image(capability, &self.image_bytes, &self.image_url);
        let builder = match &self.mask {
            Some(MaskSource::Bytes(data)) if !data.is_empty() => builder.option(
                "mask_file",
                base64::engine::general_purpose::STANDARD.encode(data),
            ),
            Some(MaskSource::Url(url)) if !url.trim().is_empty() => {
                builder.option("mask_url", url.as_str())
            }
            _ => {
                return Err(BriaError::InvalidRequest(format!(
                    "{}: a mask image or mask URL is required",
                    capability.display_name()
                )))
            }
        };

        builder
            .option("mask_type", "manual")
            .option("prompt", self.prompt.as_str())
            .option_if_some("negative_prompt", self.negative_prompt.as_deref())
            .option("num_results", self.num_results)
            .option_if_some("seed", self.seed)
            .sync(self.sync)
            .content_moderation(self.content_moderation)
            .build()
    }
}

impl BriaClient {
    /// Erases the foreground subject.
    pub async fn erase_foreground(&self, request: &EraseForegroundRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Fills the masked region from a prompt. Asynchronous by default.
    pub async fn generative_fill(&self, request: &GenerativeFillRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }
}
