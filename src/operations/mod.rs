//! Typed requests and caller-facing functions, one per capability.
//!
//! Each request type validates its capability-specific fields, lowers
//! itself into an [`OperationRequest`], and is sent by the matching
//! [`crate::BriaClient`] method. Options the caller leaves unset are
//! omitted from the body.

mod background;
mod editing;
mod expansion;
mod generation;
mod product;

pub use background::{BackgroundBlurRequest, BackgroundRemoveRequest, BackgroundReplaceRequest};
pub use editing::{EraseForegroundRequest, GenerativeFillRequest, MaskSource};
pub use expansion::{ExpansionTarget, ImageExpansionRequest};
pub use generation::{Medium, TextToImageRequest};
pub use product::{
    CutoutRequest, LifestyleShotRequest, ManualPlacement, PackshotRequest, Placement,
    ProductBackgroundRemovalRequest, ShadowRequest, ShadowType,
};

use crate::error::{BriaError, Result};
use crate::request::{Capability, OperationRequest, OperationRequestBuilder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Aspect ratios accepted by text-to-image, lifestyle shots and image expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 2:3 portrait.
    #[serde(rename = "2:3")]
    TwoThree,
    /// 3:2 landscape.
    #[serde(rename = "3:2")]
    ThreeTwo,
    /// 3:4 portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 4:3 landscape.
    #[serde(rename = "4:3")]
    Standard,
    /// 4:5 portrait.
    #[serde(rename = "4:5")]
    FourFive,
    /// 5:4 landscape.
    #[serde(rename = "5:4")]
    FiveFour,
    /// 9:16 tall portrait.
    #[serde(rename = "9:16")]
    Portrait,
    /// 16:9 widescreen.
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// Every supported ratio.
    pub const ALL: [AspectRatio; 9] = [
        Self::Square,
        Self::TwoThree,
        Self::ThreeTwo,
        Self::StandardPortrait,
        Self::Standard,
        Self::FourFive,
        Self::FiveFour,
        Self::Portrait,
        Self::Landscape,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::TwoThree => "2:3",
            Self::ThreeTwo => "3:2",
            Self::StandardPortrait => "3:4",
            Self::Standard => "4:3",
            Self::FourFive => "4:5",
            Self::FiveFour => "5:4",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio '{s}'"))
    }
}

/// Starts an [`OperationRequest`] with whichever image inputs the caller set.
fn request_with_image(
    capability: Capability,
    image_bytes: &Option<Vec<u8>>,
    image_url: &Option<String>,
) -> OperationRequestBuilder {
    let mut builder = OperationRequest::builder(capability);
    if let Some(data) = image_bytes {
        builder = builder.image_bytes(data.clone());
    }
    if let Some(url) = image_url {
        builder = builder.image_url(url.clone());
    }
    builder
}

/// Fails with [`BriaError::InvalidRequest`] when a required text field is blank.
fn require_text(capability: Capability, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BriaError::InvalidRequest(format!(
            "{}: '{field}' is required",
            capability.display_name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_round_trips_through_str() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>(), Ok(ratio));
        }
        assert!("7:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_aspect_ratio_serializes_as_ratio_string() {
        assert_eq!(
            serde_json::to_value(AspectRatio::Landscape).unwrap(),
            serde_json::json!("16:9")
        );
    }

    #[test]
    fn test_require_text() {
        assert!(require_text(Capability::LifestyleShot, "scene_description", "a kitchen").is_ok());
        let err = require_text(Capability::LifestyleShot, "scene_description", " ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid request: Lifestyle Shot: 'scene_description' is required"
        );
    }
}
