//! Text-to-image generation and prompt enhancement.

use super::{require_text, AspectRatio};
use crate::client::BriaClient;
use crate::error::{BriaError, Result};
use crate::normalize::OperationResult;
use crate::request::{Capability, OperationRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const PROMPT_ENHANCER_PATH: &str = "/prompt_enhancer";
const PROMPT_ENHANCER_TIMEOUT: Duration = Duration::from_secs(60);

/// Response fields that may carry the enhanced prompt, in lookup order.
const ENHANCED_PROMPT_FIELDS: [&str; 4] = [
    "prompt variations",
    "prompt_variations",
    "enhanced_prompt",
    "result",
];

/// Most variants one generation call may request.
const MAX_RESULTS: u32 = 4;

/// Visual medium the generator aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    /// Photorealistic output.
    Photography,
    /// Illustrative or painterly output.
    Art,
}

impl Medium {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photography => "photography",
            Self::Art => "art",
        }
    }
}

/// Generates images from a text prompt.
#[derive(Debug, Clone)]
pub struct TextToImageRequest {
    /// What to generate.
    pub prompt: String,
    /// What to avoid.
    pub negative_prompt: Option<String>,
    /// Number of variants (1-4).
    pub num_results: u32,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Wait for results instead of returning pending URLs.
    pub sync: bool,
    /// Seed for reproducible output.
    pub seed: Option<u64>,
    /// Photography or art.
    pub medium: Option<Medium>,
    /// Let the service rewrite the prompt before generating.
    pub prompt_enhancement: bool,
    /// Apply the service's quality enhancement to the output.
    pub enhance_image: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl TextToImageRequest {
    /// Creates a request for one square image.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            num_results: 1,
            aspect_ratio: AspectRatio::Square,
            sync: true,
            seed: None,
            medium: None,
            prompt_enhancement: false,
            enhance_image: false,
            content_moderation: false,
        }
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

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
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

    /// Sets the medium.
    pub fn with_medium(mut self, medium: Medium) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Enables server-side prompt enhancement.
    pub fn with_prompt_enhancement(mut self, enabled: bool) -> Self {
        self.prompt_enhancement = enabled;
        self
    }

    /// Enables output quality enhancement.
    pub fn with_enhance_image(mut self, enabled: bool) -> Self {
        self.enhance_image = enabled;
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let capability = Capability::TextToImage;
        require_text(capability, "prompt", &self.prompt)?;
        if !(1..=MAX_RESULTS).contains(&self.num_results) {
            return Err(BriaError::InvalidRequest(format!(
                "{}: 'num_results' must be between 1 and {MAX_RESULTS}, got {}",
                capability.display_name(),
                self.num_results
            )));
        }

        OperationRequest::builder(capability)
            .option("prompt", self.prompt.as_str())
            .option_if_some("negative_prompt", self.negative_prompt.as_deref())
            .option("num_results", self.num_results)
            .option("aspect_ratio", self.aspect_ratio.as_str())
            .option_if_some("seed", self.seed)
            .option_if_some("medium", self.medium.map(|m| m.as_str()))
            .option("prompt_enhancement", self.prompt_enhancement)
            .option("enhance_image", self.enhance_image)
            .sync(self.sync)
            .content_moderation(self.content_moderation)
            .build()
    }
}

/// Pulls the enhanced prompt out of a prompt-enhancer response body.
fn enhanced_prompt(body: &Value) -> Option<String> {
    ENHANCED_PROMPT_FIELDS
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|value| match value {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .map(str::to_string)
}

impl BriaClient {
    /// Generates images from a text prompt.
    pub async fn generate_image(&self, request: &TextToImageRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Rewrites a short prompt into a more detailed one.
    ///
    /// Unlike the image operations this returns text, so remote failures
    /// surface as [`BriaError::Api`] rather than an [`OperationResult`].
    pub async fn enhance_prompt(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(BriaError::InvalidRequest(
                "Prompt Enhancement: 'prompt' is required".into(),
            ));
        }

        let (status, body) = self
            .post_json(
                PROMPT_ENHANCER_PATH,
                &json!({ "prompt": prompt }),
                PROMPT_ENHANCER_TIMEOUT,
            )
            .await?;

        if !(200..300).contains(&status) {
            let message = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(status, "prompt enhancement failed: {message}");
            return Err(BriaError::Api { status, message });
        }

        let value: Value = serde_json::from_slice(&body)?;
        enhanced_prompt(&value).ok_or_else(|| {
            BriaError::Decode(format!("no enhanced prompt in response: {value}"))
        })
    }
}
