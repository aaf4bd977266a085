//! Background replace, remove and blur.

use super::{request_with_image, require_text};
use crate::client::BriaClient;
use crate::error::Result;
use crate::normalize::OperationResult;
use crate::request::{Capability, OperationRequest};

/// Generates a new background from a text prompt.
#[derive(Debug, Clone)]
pub struct BackgroundReplaceRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Description of the new background.
    pub bg_prompt: String,
    /// Number of variants (1-4).
    pub num_results: u32,
    /// Wait for results instead of returning pending URLs.
    pub sync: bool,
    /// Use the fast generation mode.
    pub fast: bool,
    /// Enable content moderation.
    pub content_moderation: Option<bool>,
}

impl BackgroundReplaceRequest {
    /// Creates a request with the given background prompt.
    pub fn new(bg_prompt: impl Into<String>) -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            bg_prompt: bg_prompt.into(),
            num_results: 1,
            sync: true,
            fast: true,
            content_moderation: None,
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

    /// Sets fast mode.
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = Some(enabled);
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let capability = Capability::BackgroundReplace;
        require_text(capability, "bg_prompt", &self.bg_prompt)?;

        let mut builder = request_with_image(capability, &self.image_bytes, &self.image_url)
            .option("bg_prompt", self.bg_prompt.as_str())
            .option("num_results", self.num_results)
            .option("fast", self.fast)
            .sync(self.sync);
        if let Some(enabled) = self.content_moderation {
            builder = builder.content_moderation(enabled);
        }
        builder.build()
    }
}

/// Removes the background. Sent as a multipart form.
#[derive(Debug, Clone)]
pub struct BackgroundRemoveRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Keep partially transparent areas.
    pub preserve_partial_alpha: bool,
    /// Wait for the result instead of returning a pending URL.
    pub sync: bool,
    /// Enable content moderation.
    pub content_moderation: Option<bool>,
}

impl Default for BackgroundRemoveRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            preserve_partial_alpha: true,
            sync: true,
            content_moderation: None,
        }
    }
}

impl BackgroundRemoveRequest {
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

    /// Sets whether partially transparent areas are kept.
    pub fn with_preserve_partial_alpha(mut self, preserve: bool) -> Self {
        self.preserve_partial_alpha = preserve;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = Some(enabled);
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let mut builder =
            request_with_image(Capability::BackgroundRemove, &self.image_bytes, &self.image_url)
                .option("preserve_partial_alpha", self.preserve_partial_alpha)
                .sync(self.sync);
        if let Some(enabled) = self.content_moderation {
            builder = builder.content_moderation(enabled);
        }
        builder.build()
    }
}

/// Blurs the background.
#[derive(Debug, Clone)]
pub struct BackgroundBlurRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Blur strength (1-5).
    pub scale: u8,
    /// Keep the alpha channel.
    pub preserve_alpha: bool,
    /// Wait for the result instead of returning a pending URL.
    pub sync: bool,
}

impl Default for BackgroundBlurRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            scale: 5,
            preserve_alpha: true,
            sync: true,
        }
    }
}

impl BackgroundBlurRequest {
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

    /// Sets the blur strength.
    pub fn with_scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
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
        request_with_image(Capability::BackgroundBlur, &self.image_bytes, &self.image_url)
            .option("scale", self.scale)
            .option("preserve_alpha", self.preserve_alpha)
            .sync(self.sync)
            .build()
    }
}

impl BriaClient {
    /// Replaces the background with one generated from `bg_prompt`.
    pub async fn generate_background(
        &self,
        request: &BackgroundReplaceRequest,
    ) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Removes the background.
    pub async fn remove_image_background(
        &self,
        request: &BackgroundRemoveRequest,
    ) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Blurs the background.
    pub async fn blur_background(&self, request: &BackgroundBlurRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }
}
