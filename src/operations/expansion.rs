//! Outpainting an image onto a larger canvas.

use super::AspectRatio;
use super::request_with_image;
use crate::client::BriaClient;
use crate::error::{BriaError, Result};
use crate::normalize::OperationResult;
use crate::request::{Capability, OperationRequest};
use serde_json::json;

/// Accepted range for a numeric aspect ratio.
const FACTOR_RANGE: std::ops::RangeInclusive<f64> = 0.5..=3.0;

/// How the output canvas is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionTarget {
    /// Expand to a named aspect ratio, keeping the image centered.
    AspectRatio(AspectRatio),
    /// Expand to a width/height ratio between 0.5 and 3.0.
    Factor(f64),
    /// Explicit canvas geometry.
    Canvas {
        /// `[width, height]` of the output.
        canvas_size: [u32; 2],
        /// `[width, height]` of the original within the canvas.
        original_image_size: [u32; 2],
        /// `[x, y]` of the original's top-left corner.
        original_image_location: [i32; 2],
    },
}

/// Expands an image beyond its borders.
#[derive(Debug, Clone)]
pub struct ImageExpansionRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Output canvas. Required.
    pub target: Option<ExpansionTarget>,
    /// Guides the generated surroundings.
    pub prompt: Option<String>,
    /// What to avoid.
    pub negative_prompt: Option<String>,
    /// Seed for reproducible output.
    pub seed: Option<u64>,
    /// Keep the alpha channel.
    pub preserve_alpha: bool,
    /// Wait for the result instead of returning a pending URL.
    pub sync: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl Default for ImageExpansionRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            target: None,
            prompt: None,
            negative_prompt: None,
            seed: None,
            preserve_alpha: true,
            sync: true,
            content_moderation: false,
        }
    }
}

impl ImageExpansionRequest {
    /// Creates a request for the image at `url` expanded to `target`.
    pub fn new(url: impl Into<String>, target: ExpansionTarget) -> Self {
        Self {
            image_url: Some(url.into()),
            target: Some(target),
            ..Self::default()
        }
    }

    /// Creates a request for uploaded image bytes expanded to `target`.
    pub fn from_bytes(data: Vec<u8>, target: ExpansionTarget) -> Self {
        Self {
            image_bytes: Some(data),
            target: Some(target),
            ..Self::default()
        }
    }

    /// Sets the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
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

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let capability = Capability::ImageExpansion;
        let builder = request_with_image(capability, &self.image_bytes, &self.image_url);

        let builder = match &self.target {
            Some(ExpansionTarget::AspectRatio(ratio)) => builder.option("aspect_ratio", ratio.as_str()),
            Some(ExpansionTarget::Factor(factor)) => {
                if !FACTOR_RANGE.contains(factor) {
                    return Err(BriaError::InvalidRequest(format!(
                        "{}: aspect ratio {factor} is outside 0.5-3.0",
                        capability.display_name()
                    )));
                }
                builder.option("aspect_ratio", *factor)
            }
            Some(ExpansionTarget::Canvas {
                canvas_size,
                original_image_size,
                original_image_location,
            }) => builder
                .option("canvas_size", json!(canvas_size))
                .option("original_image_size", json!(original_image_size))
                .option("original_image_location", json!(original_image_location)),
            None => {
                return Err(BriaError::InvalidRequest(format!(
                    "{}: provide 'aspect_ratio', or all of 'canvas_size', \
                     'original_image_size' and 'original_image_location'",
                    capability.display_name()
                )))
            }
        };

        builder
            .option_if_some("prompt", self.prompt.as_deref())
            .option_if_some("negative_prompt", self.negative_prompt.as_deref())
            .option_if_some("seed", self.seed)
            .option("preserve_alpha", self.preserve_alpha)
            .sync(self.sync)
            .content_moderation(self.content_moderation)
            .build()
    }
}

impl BriaClient {
    /// Expands an image onto a larger canvas.
    pub async fn expand_image(&self, request: &ImageExpansionRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_aspect_ratio_body() {
        let op = ImageExpansionRequest::new(
            "https://example.com/photo.jpg",
            ExpansionTarget::AspectRatio(AspectRatio::Landscape),
        )
        .to_operation()
        .unwrap();

        assert_eq!(
            Value::Object(op.json_body()),
            json!({
                "image_url": "https://example.com/photo.jpg",
                "aspect_ratio": "16:9",
                "preserve_alpha": true,
                "sync": true,
                "content_moderation": false
            })
        );
    }

    #[test]
    fn test_canvas_body_with_prompt() {
        let op = ImageExpansionRequest::new(
            "https://example.com/photo.jpg",
            ExpansionTarget::Canvas {
                canvas_size: [1500, 1000],
                original_image_size: [800, 600],
                original_image_location: [350, 200],
            },
        )
        .with_prompt("a sunny meadow")
        .with_seed(7)
        .to_operation()
        .unwrap();
        let body = op.json_body();

        assert_eq!(body["canvas_size"], json!([1500, 1000]));
        assert_eq!(body["original_image_size"], json!([800, 600]));
        assert_eq!(body["original_image_location"], json!([350, 200]));
        assert_eq!(body["prompt"], json!("a sunny meadow"));
        assert_eq!(body["seed"], json!(7));
        assert!(!body.contains_key("aspect_ratio"));
        assert!(!body.contains_key("negative_prompt"));
    }

    #[test]
    fn test_factor_range() {
        let ok = ImageExpansionRequest::new("https://example.com/p.jpg", ExpansionTarget::Factor(1.5))
            .to_operation()
            .unwrap();
        assert_eq!(ok.json_body()["aspect_ratio"], json!(1.5));

        let err = ImageExpansionRequest::new("https://example.com/p.jpg", ExpansionTarget::Factor(4.0))
            .to_operation()
            .unwrap_err();
        assert!(matches!(err, BriaError::InvalidRequest(_)));
    }

    #[test]
    fn test_struct_update_keeps_documented_defaults() {
        let op = ImageExpansionRequest {
            image_url: Some("https://example.com/p.jpg".into()),
            target: Some(ExpansionTarget::AspectRatio(AspectRatio::Square)),
            ..ImageExpansionRequest::default()
        }
        .to_operation()
        .unwrap();

        assert_eq!(
            Value::Object(op.json_body()),
            json!({
                "image_url": "https://example.com/p.jpg",
                "aspect_ratio": "1:1",
                "preserve_alpha": true,
                "sync": true,
                "content_moderation": false
            })
        );
        assert!(!op.is_async());
    }

    #[test]
    fn test_missing_target_rejected() {
        let request = ImageExpansionRequest {
            image_url: Some("https://example.com/p.jpg".into()),
            ..ImageExpansionRequest::default()
        };
        let err = request.to_operation().unwrap_err();
        assert!(err.to_string().contains("canvas_size"));
    }
}
