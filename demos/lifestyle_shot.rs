//! Lifestyle shot example - places a product in a generated scene and waits
//! for the asynchronous results.
//!
//! Run with: `cargo run --example lifestyle_shot -- <image_url> "<scene description>"`
//!
//! Requires `BRIA_API_KEY` environment variable.

use briakit::{BriaClient, LifestyleShotRequest, PollPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> briakit::Result<()> {
    let mut args = std::env::args().skip(1);
    let image_url = args
        .next()
        .expect("Usage: lifestyle_shot <image_url> <scene>");
    let scene = args
        .next()
        .unwrap_or_else(|| "on a marble kitchen counter, morning light".to_string());

    let client = BriaClient::builder()
        .poll_policy(PollPolicy::new(10, Duration::from_secs(3)))
        .build()?;

    let request = LifestyleShotRequest::new(scene)
        .with_image_url(image_url)
        .with_num_results(2);
    let result = client.create_lifestyle_shot_by_text(&request).await?;

    if let Some(failure) = result.failure() {
        eprintln!("Lifestyle shot failed: {failure}");
        return Ok(());
    }

    let state = client.wait_for_results(result.urls().to_vec()).await;
    for (i, url) in state.ready().iter().enumerate() {
        let image = client.download(url).await?;
        let path = format!("lifestyle_{i}.{}", image.format.unwrap_or_default().extension());
        image.save(&path)?;
        println!("Saved {path} ({} bytes)", image.size());
    }
    for url in state.pending() {
        println!("Not ready after polling: {url}");
    }

    Ok(())
}
