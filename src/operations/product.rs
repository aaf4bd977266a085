//! Product shot tools: packshot, shadow, lifestyle shot, cutout and
//! background removal with inline results.

use super::{request_with_image, require_text, AspectRatio};
use crate::client::BriaClient;
use crate::error::Result;
use crate::normalize::OperationResult;
use crate::request::{Capability, OperationRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Professional packshot on a solid background.
#[derive(Debug, Clone)]
pub struct PackshotRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Stock keeping unit, echoed back by the service.
    pub sku: Option<String>,
    /// Hex background color.
    pub background_color: String,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl Default for PackshotRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            sku: None,
            background_color: "#FFFFFF".into(),
            force_rmbg: false,
            content_moderation: false,
        }
    }
}

impl PackshotRequest {
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

    /// Sets the SKU.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Sets the background color.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Forces background removal.
    pub fn with_force_rmbg(mut self, force: bool) -> Self {
        self.force_rmbg = force;
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        request_with_image(Capability::ProductPackshot, &self.image_bytes, &self.image_url)
            .option_if_some("sku", self.sku.as_deref())
            .option("background_color", self.background_color.as_str())
            .option("force_rmbg", self.force_rmbg)
            .content_moderation(self.content_moderation)
            .build()
    }
}

/// Shadow style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowType {
    /// Drop shadow under the product.
    #[default]
    Regular,
    /// Shadow for a product floating above the ground.
    Float,
}

impl ShadowType {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Float => "float",
        }
    }
}

/// Adds a shadow to a product cutout.
#[derive(Debug, Clone)]
pub struct ShadowRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Shadow style.
    pub shadow_type: ShadowType,
    /// Background color; unset keeps the background transparent.
    pub background_color: Option<String>,
    /// Hex shadow color.
    pub shadow_color: String,
    /// Shadow offset `[x, y]`.
    pub shadow_offset: Option<[i32; 2]>,
    /// Shadow intensity (0-100).
    pub shadow_intensity: u32,
    /// Shadow blur.
    pub shadow_blur: Option<u32>,
    /// Shadow width.
    pub shadow_width: Option<i32>,
    /// Shadow height.
    pub shadow_height: i32,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Keep the alpha channel.
    pub preserve_alpha: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl Default for ShadowRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            sku: None,
            shadow_type: ShadowType::Regular,
            background_color: None,
            shadow_color: "#000000".into(),
            shadow_offset: None,
            shadow_intensity: 60,
            shadow_blur: None,
            shadow_width: None,
            shadow_height: 70,
            force_rmbg: false,
            preserve_alpha: true,
            content_moderation: false,
        }
    }
}

impl ShadowRequest {
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

    /// Sets the shadow style.
    pub fn with_shadow_type(mut self, shadow_type: ShadowType) -> Self {
        self.shadow_type = shadow_type;
        self
    }

    /// Sets an opaque background color.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Sets the shadow color.
    pub fn with_shadow_color(mut self, color: impl Into<String>) -> Self {
        self.shadow_color = color.into();
        self
    }

    /// Sets the shadow offset.
    pub fn with_shadow_offset(mut self, x: i32, y: i32) -> Self {
        self.shadow_offset = Some([x, y]);
        self
    }

    /// Sets the shadow intensity.
    pub fn with_shadow_intensity(mut self, intensity: u32) -> Self {
        self.shadow_intensity = intensity;
        self
    }

    /// Sets the shadow blur.
    pub fn with_shadow_blur(mut self, blur: u32) -> Self {
        self.shadow_blur = Some(blur);
        self
    }

    /// Sets the shadow width and height.
    pub fn with_shadow_size(mut self, width: i32, height: i32) -> Self {
        self.shadow_width = Some(width);
        self.shadow_height = height;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        request_with_image(Capability::ProductShadow, &self.image_bytes, &self.image_url)
            .option_if_some("sku", self.sku.as_deref())
            .option("type", self.shadow_type.as_str())
            .option_if_some("background_color", self.background_color.as_deref())
            .option("shadow_color", self.shadow_color.as_str())
            .option_if_some("shadow_offset", self.shadow_offset.map(|o| json!(o)))
            .option("shadow_intensity", self.shadow_intensity)
            .option_if_some("shadow_blur", self.shadow_blur)
            .option_if_some("shadow_width", self.shadow_width)
            .option("shadow_height", self.shadow_height)
            .option("force_rmbg", self.force_rmbg)
            .option("preserve_alpha", self.preserve_alpha)
            .content_moderation(self.content_moderation)
            .build()
    }
}

/// Predefined positions for manual placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualPlacement {
    /// Upper left.
    UpperLeft,
    /// Upper right.
    UpperRight,
    /// Bottom left.
    BottomLeft,
    /// Bottom right.
    BottomRight,
    /// Right center.
    RightCenter,
    /// Left center.
    LeftCenter,
    /// Upper center.
    UpperCenter,
    /// Bottom center.
    BottomCenter,
    /// Center vertical.
    CenterVertical,
    /// Center horizontal.
    CenterHorizontal,
}

/// Where the product goes in a lifestyle shot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Placement {
    /// Keep the product's original position.
    #[default]
    Original,
    /// Let the service choose placements (generates several variants).
    Automatic,
    /// One variant per selected position.
    Manual(Vec<ManualPlacement>),
    /// Explicit foreground size and top-left location.
    CustomCoordinates {
        /// `[width, height]` of the product.
        foreground_image_size: [u32; 2],
        /// `[x, y]` of the product's top-left corner.
        foreground_image_location: [i32; 2],
    },
    /// Padding `[left, right, top, bottom]` around the product.
    ManualPadding([i32; 4]),
    /// Automatic placement in a shot of the given ratio.
    AutomaticAspectRatio(AspectRatio),
}

impl Placement {
    /// Wire value for `placement_type`.
    pub fn placement_type(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Automatic => "automatic",
            Self::Manual(_) => "manual_placement",
            Self::CustomCoordinates { .. } => "custom_coordinates",
            Self::ManualPadding(_) => "manual_padding",
            Self::AutomaticAspectRatio(_) => "automatic_aspect_ratio",
        }
    }

    /// Placement-specific body fields.
    fn fields(&self) -> Vec<(&'static str, Value)> {
        match self {
            Self::Original | Self::Automatic => Vec::new(),
            Self::Manual(selection) => vec![("manual_placement_selection", json!(selection))],
            Self::CustomCoordinates {
                foreground_image_size,
                foreground_image_location,
            } => vec![
                ("foreground_image_size", json!(foreground_image_size)),
                ("foreground_image_location", json!(foreground_image_location)),
            ],
            Self::ManualPadding(padding) => vec![("padding_values", json!(padding))],
            Self::AutomaticAspectRatio(ratio) => vec![("aspect_ratio", json!(ratio.as_str()))],
        }
    }
}

/// Places a product into a scene described by text.
#[derive(Debug, Clone)]
pub struct LifestyleShotRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Description of the scene.
    pub scene_description: String,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Wait for results instead of returning pending URLs.
    pub sync: bool,
    /// Use the fast generation mode.
    pub fast: bool,
    /// Let the service refine the scene description.
    pub optimize_description: bool,
    /// Number of variants.
    pub num_results: u32,
    /// Elements to keep out of the scene.
    pub exclude_elements: Option<String>,
    /// Product placement.
    pub placement: Placement,
    /// Retain the original input size (original placement only).
    pub original_quality: bool,
    /// Output `[width, height]`.
    pub shot_size: Option<[u32; 2]>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl LifestyleShotRequest {
    /// Creates a request with the given scene description.
    pub fn new(scene_description: impl Into<String>) -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            scene_description: scene_description.into(),
            sku: None,
            sync: false,
            fast: true,
            optimize_description: true,
            num_results: 4,
            exclude_elements: None,
            placement: Placement::Original,
            original_quality: false,
            shot_size: None,
            force_rmbg: false,
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

    /// Sets the SKU.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
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

    /// Sets whether the scene description is optimized.
    pub fn with_optimize_description(mut self, optimize: bool) -> Self {
        self.optimize_description = optimize;
        self
    }

    /// Sets the number of variants.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets elements to exclude.
    pub fn with_exclude_elements(mut self, elements: impl Into<String>) -> Self {
        self.exclude_elements = Some(elements.into());
        self
    }

    /// Sets the placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Keeps the original input size.
    pub fn with_original_quality(mut self, original_quality: bool) -> Self {
        self.original_quality = original_quality;
        self
    }

    /// Sets the output size.
    pub fn with_shot_size(mut self, width: u32, height: u32) -> Self {
        self.shot_size = Some([width, height]);
        self
    }

    /// Forces background removal.
    pub fn with_force_rmbg(mut self, force: bool) -> Self {
        self.force_rmbg = force;
        self
    }

    /// Enables or disables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    ///
    /// `sync` is passed through as given; the service itself decides
    /// whether a synchronous multi-variant request is acceptable.
    pub fn to_operation(&self) -> Result<OperationRequest> {
        let capability = Capability::LifestyleShot;
        require_text(capability, "scene_description", &self.scene_description)?;

        let mut builder = request_with_image(capability, &self.image_bytes, &self.image_url)
            .option("scene_description", self.scene_description.as_str())
            .option_if_some("sku", self.sku.as_deref())
            .option("fast", self.fast)
            .option("optimize_description", self.optimize_description)
            .option("num_results", self.num_results)
            .option_if_some("exclude_elements", self.exclude_elements.as_deref())
            .option("placement_type", self.placement.placement_type())
            .option("original_quality", self.original_quality)
            .option_if_some("shot_size", self.shot_size.map(|s| json!(s)))
            .option("force_rmbg", self.force_rmbg)
            .sync(self.sync)
            .content_moderation(self.content_moderation);
        for (key, value) in self.placement.fields() {
            builder = builder.option(key, value);
        }
        builder.build()
    }
}

/// Cuts the product out of its background.
#[derive(Debug, Clone)]
pub struct CutoutRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Keep the alpha channel.
    pub preserve_alpha: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl Default for CutoutRequest {
    fn default() -> Self {
        Self {
            image_bytes: None,
            image_url: None,
            sku: None,
            force_rmbg: false,
            preserve_alpha: true,
            content_moderation: false,
        }
    }
}

impl CutoutRequest {
    /// Creates a request for the image at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Sets the SKU.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        request_with_image(Capability::ProductCutout, &self.image_bytes, &self.image_url)
            .option_if_some("sku", self.sku.as_deref())
            .option("force_rmbg", self.force_rmbg)
            .option("preserve_alpha", self.preserve_alpha)
            .content_moderation(self.content_moderation)
            .build()
    }
}

/// Product background removal; the service may answer with the image inline.
#[derive(Debug, Clone, Default)]
pub struct ProductBackgroundRemovalRequest {
    /// Input image bytes.
    pub image_bytes: Option<Vec<u8>>,
    /// Input image URL.
    pub image_url: Option<String>,
    /// Remove the background even if an alpha channel exists.
    pub force: bool,
    /// Enable content moderation.
    pub content_moderation: bool,
}

impl ProductBackgroundRemovalRequest {
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

    /// Validates and lowers into an [`OperationRequest`].
    pub fn to_operation(&self) -> Result<OperationRequest> {
        request_with_image(
            Capability::ProductRemoveBackground,
            &self.image_bytes,
            &self.image_url,
        )
        .option("force", self.force)
        .content_moderation(self.content_moderation)
        .build()
    }
}

impl BriaClient {
    /// Creates a packshot.
    pub async fn create_product_packshot(&self, request: &PackshotRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Adds a shadow to a product.
    pub async fn add_product_shadow(&self, request: &ShadowRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Creates lifestyle shots from a scene description.
    pub async fn create_lifestyle_shot_by_text(
        &self,
        request: &LifestyleShotRequest,
    ) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Cuts out a product.
    pub async fn product_cutout(&self, request: &CutoutRequest) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }

    /// Removes a product's background; the result may be inline bytes.
    pub async fn remove_product_background(
        &self,
        request: &ProductBackgroundRemovalRequest,
    ) -> Result<OperationResult> {
        self.execute(&request.to_operation()?).await
    }
}
