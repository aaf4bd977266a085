//! Packshot example - puts a product photo on a clean white background.
//!
//! Run with: `cargo run --example packshot -- <image_url>`
//!
//! Requires `BRIA_API_KEY` environment variable.

use briakit::{BriaClient, OperationResult, PackshotRequest, ResultPayload};

#[tokio::main]
async fn main() -> briakit::Result<()> {
    let image_url = std::env::args()
        .nth(1)
        .expect("Usage: packshot <image_url>");

    let client = BriaClient::builder().build()?;
    let request = PackshotRequest::from_url(image_url).with_background_color("#FFFFFF");

    match client.create_product_packshot(&request).await? {
        OperationResult::Ready(ResultPayload::Urls(urls)) => {
            let image = client.download(&urls[0]).await?;
            image.save("packshot.png")?;
            println!("Packshot saved to packshot.png ({} bytes)", image.size());
        }
        OperationResult::Ready(ResultPayload::Bytes(data)) => {
            std::fs::write("packshot.png", &data)?;
            println!("Packshot saved to packshot.png ({} bytes)", data.len());
        }
        OperationResult::Pending(urls) => println!("Still rendering: {urls:?}"),
        OperationResult::Failed(failure) => eprintln!("Packshot failed: {failure}"),
    }

    Ok(())
}
