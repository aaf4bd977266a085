//! Capability catalog and the request type shared by every operation.

use crate::download::ImageFormat;
use crate::error::{BriaError, Result};
use base64::Engine;
use serde_json::{Map, Value};
use std::time::Duration;

/// Timeout for single-image transforms.
const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for generation and expansion operations.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Body keys owned by [`OperationRequest`] itself rather than its options.
const RESERVED_KEYS: [&str; 4] = ["file", "image_url", "sync", "content_moderation"];

/// One remote image-transform operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Generate a new background from a text prompt.
    BackgroundReplace,
    /// Remove the background, keeping the foreground subject.
    BackgroundRemove,
    /// Blur the background.
    BackgroundBlur,
    /// Professional product packshot on a solid background.
    ProductPackshot,
    /// Add a drop or floating shadow to a product cutout.
    ProductShadow,
    /// Place a product into a scene described by text.
    LifestyleShot,
    /// Generate content inside a masked region.
    GenerativeFill,
    /// Extend the canvas and fill the new area.
    ImageExpansion,
    /// Erase the foreground and reconstruct the background.
    EraseForeground,
    /// Cut the product out of its background.
    ProductCutout,
    /// Background removal that may return the image inline.
    ProductRemoveBackground,
    /// Generate images from a text prompt. Takes no input image.
    TextToImage,
}

/// How a capability's request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `application/json`.
    Json,
    /// `multipart/form-data` with text fields.
    Multipart,
}

impl Capability {
    /// Every capability, in catalog order.
    pub const ALL: [Capability; 12] = [
        Self::BackgroundReplace,
        Self::BackgroundRemove,
        Self::BackgroundBlur,
        Self::ProductPackshot,
        Self::ProductShadow,
        Self::LifestyleShot,
        Self::GenerativeFill,
        Self::ImageExpansion,
        Self::EraseForeground,
        Self::ProductCutout,
        Self::ProductRemoveBackground,
        Self::TextToImage,
    ];

    /// Path under the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::BackgroundReplace => "/background/replace",
            Self::BackgroundRemove => "/background/remove",
            Self::BackgroundBlur => "/background/blur",
            Self::ProductPackshot => "/product/packshot",
            Self::ProductShadow => "/product/shadow",
            Self::LifestyleShot => "/product/lifestyle_shot_by_text",
            Self::GenerativeFill => "/gen_fill",
            Self::ImageExpansion => "/image_expansion",
            Self::EraseForeground => "/erase_foreground",
            Self::ProductCutout => "/product/cutout",
            Self::ProductRemoveBackground => "/product/remove_background",
            Self::TextToImage => "/text-to-image/hd/2.2",
        }
    }

    /// Human-readable name used in log lines and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BackgroundReplace => "Generate Background",
            Self::BackgroundRemove => "Remove Background",
            Self::BackgroundBlur => "Blur Background",
            Self::ProductPackshot => "Product Packshot",
            Self::ProductShadow => "Product Shadow",
            Self::LifestyleShot => "Lifestyle Shot",
            Self::GenerativeFill => "Generative Fill",
            Self::ImageExpansion => "Image Expansion",
            Self::EraseForeground => "Erase Foreground",
            Self::ProductCutout => "Product Cutout",
            Self::ProductRemoveBackground => "Product Background Removal",
            Self::TextToImage => "Generate Image",
        }
    }

    /// Transport timeout for a single call.
    pub fn timeout(&self) -> Duration {
        match self {
            Self::BackgroundReplace
            | Self::LifestyleShot
            | Self::GenerativeFill
            | Self::ImageExpansion
            | Self::TextToImage => GENERATION_TIMEOUT,
            _ => TRANSFORM_TIMEOUT,
        }
    }

    /// Request body encoding.
    pub fn body_kind(&self) -> BodyKind {
        match self {
            Self::BackgroundRemove => BodyKind::Multipart,
            _ => BodyKind::Json,
        }
    }

    /// False for capabilities that generate from text alone.
    pub fn takes_image(&self) -> bool {
        !matches!(self, Self::TextToImage)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::BackgroundReplace => "background_replace",
            Self::BackgroundRemove => "background_remove",
            Self::BackgroundBlur => "background_blur",
            Self::ProductPackshot => "product_packshot",
            Self::ProductShadow => "product_shadow",
            Self::LifestyleShot => "lifestyle_shot",
            Self::GenerativeFill => "generative_fill",
            Self::ImageExpansion => "image_expansion",
            Self::EraseForeground => "erase_foreground",
            Self::ProductCutout => "product_cutout",
            Self::ProductRemoveBackground => "product_remove_background",
            Self::TextToImage => "text_to_image",
        };
        f.write_str(id)
    }
}

/// The input image: inline bytes or a URL the remote service fetches.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Raw image bytes, sent base64-encoded as `file`.
    Bytes(Vec<u8>),
    /// Publicly reachable URL, sent as `image_url`.
    Url(String),
}

impl ImageSource {
    /// Short description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(data) => format!("<uploaded image, {} bytes>", data.len()),
            Self::Url(url) => url.clone(),
        }
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// A validated request for one capability.
///
/// Built through [`OperationRequest::builder`]. For capabilities that take an
/// image it is always exactly one of bytes or URL; text-only capabilities
/// carry none. Options never carry nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    capability: Capability,
    image: Option<ImageSource>,
    options: Map<String, Value>,
    synchronous: Option<bool>,
    content_moderation: Option<bool>,
}

impl OperationRequest {
    /// Starts a request for the given capability.
    pub fn builder(capability: Capability) -> OperationRequestBuilder {
        OperationRequestBuilder::new(capability)
    }

    /// Target capability.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Input image, absent for text-only capabilities.
    pub fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    /// Capability-specific options, excluding image, sync and moderation.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// The `sync` flag, if this capability carries one.
    pub fn synchronous(&self) -> Option<bool> {
        self.synchronous
    }

    /// The `content_moderation` flag, if set.
    pub fn content_moderation(&self) -> Option<bool> {
        self.content_moderation
    }

    /// True when the caller asked for asynchronous results.
    pub fn is_async(&self) -> bool {
        self.synchronous == Some(false)
    }

    /// Reference to the input used in error messages.
    pub fn input_ref(&self) -> String {
        match &self.image {
            Some(image) => image.describe(),
            None => "<text prompt>".to_string(),
        }
    }

    /// JSON body: image field, options, then the sync and moderation flags.
    pub fn json_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        match &self.image {
            Some(ImageSource::Url(url)) => {
                body.insert("image_url".into(), Value::String(url.clone()));
            }
            Some(ImageSource::Bytes(data)) => {
                body.insert(
                    "file".into(),
                    Value::String(base64::engine::general_purpose::STANDARD.encode(data)),
                );
            }
            None => {}
        }
        for (key, value) in &self.options {
            body.insert(key.clone(), value.clone());
        }
        if let Some(sync) = self.synchronous {
            body.insert("sync".into(), Value::Bool(sync));
        }
        if let Some(moderation) = self.content_moderation {
            body.insert("content_moderation".into(), Value::Bool(moderation));
        }
        body
    }

    /// Text fields for a multipart body. Inline image bytes are not included;
    /// they travel as a binary `file` part (see [`Self::multipart_form`]).
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(ImageSource::Url(url)) = &self.image {
            fields.push(("image_url".to_string(), url.clone()));
        }
        for (key, value) in &self.options {
            fields.push((key.clone(), form_text(value)));
        }
        if let Some(sync) = self.synchronous {
            fields.push(("sync".to_string(), sync.to_string()));
        }
        if let Some(moderation) = self.content_moderation {
            fields.push(("content_moderation".to_string(), moderation.to_string()));
        }
        fields
    }

    /// Multipart body with text fields and, for inline images, a `file` part.
    pub(crate) fn multipart_form(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (key, value) in self.form_fields() {
            form = form.text(key, value);
        }
        if let Some(ImageSource::Bytes(data)) = &self.image {
            let format = ImageFormat::from_magic_bytes(data).unwrap_or_default();
            let part = reqwest::multipart::Part::bytes(data.clone())
                .file_name(format!("image.{}", format.extension()))
                .mime_str(format.mime_type())?;
            form = form.part("file", part);
        }
        Ok(form)
    }
}

/// Multipart fields are text; booleans become `"true"`/`"false"`.
fn form_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builder for [`OperationRequest`].
#[derive(Debug, Clone)]
pub struct OperationRequestBuilder {
    capability: Capability,
    image_bytes: Option<Vec<u8>>,
    image_url: Option<String>,
    options: Map<String, Value>,
    synchronous: Option<bool>,
    content_moderation: Option<bool>,
}

impl OperationRequestBuilder {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            image_bytes: None,
            image_url: None,
            options: Map::new(),
            synchronous: None,
            content_moderation: None,
        }
    }

    /// Sets the input image as raw bytes.
    pub fn image_bytes(mut self, data: Vec<u8>) -> Self {
        self.image_bytes = Some(data);
        self
    }

    /// Sets the input image as a URL.
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Sets a capability-specific option. Null values are dropped.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.options.insert(key.into(), value);
        }
        self
    }

    /// Sets an option only when a value is present.
    pub fn option_if_some<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.option(key, value),
            None => self,
        }
    }

    /// Sets the `sync` flag.
    pub fn sync(mut self, synchronous: bool) -> Self {
        self.synchronous = Some(synchronous);
        self
    }

    /// Sets the `content_moderation` flag.
    pub fn content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = Some(enabled);
        self
    }

    /// Validates and builds the request.
    pub fn build(self) -> Result<OperationRequest> {
        let image_bytes = self.image_bytes.filter(|data| !data.is_empty());
        let image_url = self.image_url.filter(|url| !url.trim().is_empty());

        let name = self.capability.display_name();
        let image = match (image_bytes, image_url) {
            (Some(_), _) | (_, Some(_)) if !self.capability.takes_image() => {
                return Err(BriaError::InvalidRequest(format!(
                    "{name}: does not take an input image"
                )));
            }
            (None, None) if !self.capability.takes_image() => None,
            (Some(_), Some(_)) => {
                return Err(BriaError::InvalidRequest(format!(
                    "{name}: provide either image bytes or an image URL, not both"
                )));
            }
            (None, None) => {
                return Err(BriaError::InvalidRequest(format!(
                    "{name}: either image bytes or an image URL must be provided"
                )));
            }
            (Some(data), None) => Some(ImageSource::Bytes(data)),
            (None, Some(url)) => Some(ImageSource::Url(url)),
        };

        if let Some(key) = RESERVED_KEYS
            .iter()
            .find(|key| self.options.contains_key(**key))
        {
            return Err(BriaError::InvalidRequest(format!(
                "'{key}' cannot be passed as an option"
            )));
        }

        Ok(OperationRequest {
            capability: self.capability,
            image,
            options: self.options,
            synchronous: self.synchronous,
            content_moderation: self.content_moderation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_paths_and_timeouts() {
        assert_eq!(Capability::ProductPackshot.path(), "/product/packshot");
        assert_eq!(
            Capability::LifestyleShot.path(),
            "/product/lifestyle_shot_by_text"
        );
        assert_eq!(Capability::ImageExpansion.timeout(), Duration::from_secs(120));
        assert_eq!(Capability::BackgroundBlur.timeout(), Duration::from_secs(60));
        assert_eq!(Capability::BackgroundRemove.body_kind(), BodyKind::Multipart);

        let multipart: Vec<_> = Capability::ALL
            .iter()
            .filter(|c| c.body_kind() == BodyKind::Multipart)
            .collect();
        assert_eq!(multipart, vec![&Capability::BackgroundRemove]);
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::GenerativeFill.to_string(), "generative_fill");
        assert_eq!(Capability::EraseForeground.to_string(), "erase_foreground");
    }

    #[test]
    fn test_build_requires_an_image() {
        let err = OperationRequest::builder(Capability::BackgroundBlur)
            .option("scale", 3)
            .build()
            .unwrap_err();
        assert!(matches!(err, BriaError::InvalidRequest(_)));
    }

    #[test]
    fn test_build_rejects_both_image_forms() {
        let err = OperationRequest::builder(Capability::ProductPackshot)
            .image_bytes(vec![1, 2, 3])
            .image_url("https://example.com/a.png")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_empty_inputs_count_as_absent() {
        let request = OperationRequest::builder(Capability::ProductPackshot)
            .image_bytes(Vec::new())
            .image_url("https://example.com/a.png")
            .build()
            .unwrap();
        assert_eq!(
            request.image(),
            Some(&ImageSource::Url("https://example.com/a.png".into()))
        );

        let err = OperationRequest::builder(Capability::ProductPackshot)
            .image_url("  ")
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_reserved_option_keys_rejected() {
        let err = OperationRequest::builder(Capability::BackgroundBlur)
            .image_url("https://example.com/a.png")
            .option("sync", true)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'sync'"));
    }

    #[test]
    fn test_json_body_with_url() {
        let request = OperationRequest::builder(Capability::BackgroundBlur)
            .image_url("https://example.com/a.png")
            .option("scale", 5)
            .option("preserve_alpha", true)
            .option("sku", Value::Null)
            .sync(true)
            .build()
            .unwrap();

        assert_eq!(
            Value::Object(request.json_body()),
            json!({
                "image_url": "https://example.com/a.png",
                "scale": 5,
                "preserve_alpha": true,
                "sync": true
            })
        );
    }

    #[test]
    fn test_json_body_with_bytes_uses_file_field() {
        let request = OperationRequest::builder(Capability::ProductPackshot)
            .image_bytes(vec![0x01, 0x02, 0x03])
            .content_moderation(false)
            .build()
            .unwrap();
        let body = request.json_body();

        assert_eq!(body.get("file"), Some(&json!("AQID")));
        assert!(body.get("image_url").is_none());
        assert!(body.get("sync").is_none());
        assert_eq!(body.get("content_moderation"), Some(&json!(false)));
    }

    #[test]
    fn test_form_fields_are_text() {
        let request = OperationRequest::builder(Capability::BackgroundRemove)
            .image_url("https://example.com/a.png")
            .option("preserve_partial_alpha", true)
            .sync(false)
            .build()
            .unwrap();

        let fields = request.form_fields();
        assert!(fields.contains(&("image_url".into(), "https://example.com/a.png".into())));
        assert!(fields.contains(&("preserve_partial_alpha".into(), "true".into())));
        assert!(fields.contains(&("sync".into(), "false".into())));
        assert!(request.is_async());
    }

    #[test]
    fn test_form_fields_omit_inline_bytes() {
        let request = OperationRequest::builder(Capability::BackgroundRemove)
            .image_bytes(vec![0xFF, 0xD8, 0xFF])
            .build()
            .unwrap();
        assert!(request.form_fields().iter().all(|(key, _)| key != "file"));
        assert!(request.multipart_form().is_ok());
    }

    #[test]
    fn test_text_only_capability_takes_no_image() {
        let request = OperationRequest::builder(Capability::TextToImage)
            .option("prompt", "a lighthouse at dusk")
            .sync(true)
            .build()
            .unwrap();
        assert_eq!(request.image(), None);
        assert_eq!(request.input_ref(), "<text prompt>");
        assert_eq!(
            Value::Object(request.json_body()),
            json!({"prompt": "a lighthouse at dusk", "sync": true})
        );

        let err = OperationRequest::builder(Capability::TextToImage)
            .image_url("https://example.com/a.png")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not take an input image"));
    }

    #[test]
    fn test_image_source_debug_hides_bytes() {
        let source = ImageSource::Bytes(vec![0; 2048]);
        assert_eq!(format!("{source:?}"), "Bytes(2048)");
        assert_eq!(source.describe(), "<uploaded image, 2048 bytes>");
    }
}
