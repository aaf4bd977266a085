#![warn(missing_docs)]
//! Briakit - typed client for the Bria image editing API.
//!
//! Each remote capability (text-to-image, background replace/remove/blur,
//! product packshots, shadows, lifestyle shots, generative fill, image
//! expansion, foreground erase) has a request type and a [`BriaClient`] method. Every
//! answered call comes back as an [`OperationResult`]: ready result URLs or
//! inline bytes, URLs still being rendered, or a classified [`Failure`].
//!
//! # Quick Start
//!
//! ```no_run
//! use briakit::{BriaClient, OperationResult, PackshotRequest};
//!
//! #[tokio::main]
//! async fn main() -> briakit::Result<()> {
//!     let client = BriaClient::builder().build()?;
//!     let request = PackshotRequest::from_url("https://example.com/shoe.png");
//!     match client.create_product_packshot(&request).await? {
//!         OperationResult::Ready(payload) => println!("{payload:?}"),
//!         other => eprintln!("not ready: {other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Asynchronous results
//!
//! ```no_run
//! use briakit::{BriaClient, LifestyleShotRequest};
//!
//! #[tokio::main]
//! async fn main() -> briakit::Result<()> {
//!     let client = BriaClient::builder().build()?;
//!     let request = LifestyleShotRequest::new("on a marble kitchen counter")
//!         .with_image_url("https://example.com/mug.png");
//!     let result = client.create_lifestyle_shot_by_text(&request).await?;
//!     let state = client.wait_for_results(result.urls().to_vec()).await;
//!     for url in state.ready() {
//!         client.download(url).await?.save("shot.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli`: the `briakit` command-line tool

mod error;

pub mod client;
pub mod download;
pub mod normalize;
pub mod operations;
pub mod poll;
pub mod request;

// Re-export error types at crate root
pub use error::{BriaError, Result};

pub use client::{BriaClient, BriaClientBuilder, DEFAULT_BASE_URL};
pub use download::{DownloadedImage, ImageFormat};
pub use normalize::{
    normalize_response, Failure, Normalized, OperationResult, ResultPayload, VariantDiagnostic,
};
pub use operations::{
    AspectRatio, BackgroundBlurRequest, BackgroundRemoveRequest, BackgroundReplaceRequest,
    CutoutRequest, EraseForegroundRequest, ExpansionTarget, GenerativeFillRequest,
    ImageExpansionRequest, LifestyleShotRequest, ManualPlacement, MaskSource, Medium,
    PackshotRequest, Placement, ProductBackgroundRemovalRequest, ShadowRequest, ShadowType,
    TextToImageRequest,
};
pub use poll::{poll_once, poll_until_ready, PollPolicy, PollState, ReadinessCheck};
pub use request::{Capability, ImageSource, OperationRequest, OperationRequestBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::BriaClient;
    pub use crate::error::{BriaError, Result};
    pub use crate::normalize::{Failure, OperationResult, ResultPayload};
    pub use crate::operations::*;
    pub use crate::poll::{PollPolicy, PollState};
}
