//! CLI for Briakit - Bria image editing from the terminal.

use anyhow::Context;
use briakit::{
    AspectRatio, BackgroundBlurRequest, BackgroundRemoveRequest, BackgroundReplaceRequest,
    BriaClient, Capability, CutoutRequest, EraseForegroundRequest, ExpansionTarget,
    GenerativeFillRequest, ImageExpansionRequest, LifestyleShotRequest, MaskSource, Medium,
    OperationResult, PackshotRequest, Placement, ProductBackgroundRemovalRequest, ResultPayload,
    ShadowRequest, ShadowType, TextToImageRequest,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "briakit")]
#[command(about = "Edit product and lifestyle images via the Bria API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Poll pending results until they are ready
    #[arg(long, global = true)]
    wait: bool,

    /// Download results into this directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images from a text prompt
    Generate(GenerateArgs),

    /// Rewrite a short prompt into a detailed one
    EnhancePrompt(EnhancePromptArgs),

    /// Replace the background with one generated from a prompt
    ReplaceBg(ReplaceBgArgs),

    /// Remove the background
    RemoveBg(InputArgs),

    /// Blur the background
    BlurBg(BlurArgs),

    /// Create a product packshot on a solid background
    Packshot(PackshotArgs),

    /// Add a shadow to a product
    Shadow(ShadowArgs),

    /// Place a product in a scene described by text
    Lifestyle(LifestyleArgs),

    /// Fill a masked region from a prompt
    GenFill(GenFillArgs),

    /// Expand an image onto a larger canvas
    Expand(ExpandArgs),

    /// Erase the foreground subject
    Erase(InputArgs),

    /// Cut a product out of its background
    Cutout(InputArgs),

    /// Remove a product's background (result may be returned inline)
    ProductRmbg(InputArgs),

    /// Check whether result URLs are ready
    Poll(PollArgs),

    /// List supported capabilities
    Capabilities,
}

#[derive(Args)]
struct InputArgs {
    /// Input image: an http(s) URL or a local file path
    input: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MediumArg {
    Photography,
    Art,
}

impl From<MediumArg> for Medium {
    fn from(arg: MediumArg) -> Self {
        match arg {
            MediumArg::Photography => Medium::Photography,
            MediumArg::Art => Medium::Art,
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// What to generate
    prompt: String,

    /// Number of variants (1-4)
    #[arg(short, long, default_value_t = 1)]
    num_results: u32,

    /// Output aspect ratio (e.g., 16:9)
    #[arg(short, long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    /// Photography or art
    #[arg(long, value_enum)]
    medium: Option<MediumArg>,

    /// What to avoid
    #[arg(long)]
    negative_prompt: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Let the service rewrite the prompt first
    #[arg(long)]
    prompt_enhancement: bool,

    /// Apply quality enhancement to the output
    #[arg(long)]
    enhance_image: bool,

    /// Return pending URLs instead of waiting server-side
    #[arg(long)]
    no_sync: bool,
}

#[derive(Args)]
struct EnhancePromptArgs {
    /// Prompt to enhance
    prompt: String,
}

#[derive(Args)]
struct ReplaceBgArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Description of the new background
    #[arg(short, long)]
    prompt: String,

    /// Number of variants
    #[arg(short, long, default_value_t = 1)]
    num_results: u32,

    /// Return pending URLs instead of waiting server-side
    #[arg(long)]
    no_sync: bool,
}

#[derive(Args)]
struct BlurArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Blur strength (1-5)
    #[arg(long, default_value_t = 5)]
    scale: u8,
}

#[derive(Args)]
struct PackshotArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Hex background color
    #[arg(long, default_value = "#FFFFFF")]
    background_color: String,

    /// Remove the background even if the image has alpha
    #[arg(long)]
    force_rmbg: bool,

    /// Stock keeping unit
    #[arg(long)]
    sku: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShadowTypeArg {
    Regular,
    Float,
}

impl From<ShadowTypeArg> for ShadowType {
    fn from(arg: ShadowTypeArg) -> Self {
        match arg {
            ShadowTypeArg::Regular => ShadowType::Regular,
            ShadowTypeArg::Float => ShadowType::Float,
        }
    }
}

#[derive(Args)]
struct ShadowArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Shadow style
    #[arg(long, value_enum, default_value = "regular")]
    shadow_type: ShadowTypeArg,

    /// Opaque background color (transparent when unset)
    #[arg(long)]
    background_color: Option<String>,

    /// Shadow intensity (0-100)
    #[arg(long, default_value_t = 60)]
    intensity: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlacementArg {
    Original,
    Automatic,
}

#[derive(Args)]
struct LifestyleArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Description of the scene
    #[arg(short, long)]
    scene: String,

    /// Number of variants
    #[arg(short, long, default_value_t = 4)]
    num_results: u32,

    /// Product placement
    #[arg(long, value_enum, default_value = "original")]
    placement: PlacementArg,

    /// Automatic placement in a shot of this ratio (e.g., 1:1)
    #[arg(long)]
    aspect_ratio: Option<AspectRatio>,

    /// Elements to keep out of the scene
    #[arg(long)]
    exclude: Option<String>,

    /// Ask the service to wait for results
    #[arg(long)]
    sync: bool,
}

#[derive(Args)]
struct GenFillArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Mask image: an http(s) URL or a local file path
    #[arg(short, long)]
    mask: String,

    /// What to generate inside the mask
    #[arg(short, long)]
    prompt: String,

    /// What to avoid
    #[arg(long)]
    negative_prompt: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct ExpandArgs {
    #[command(flatten)]
    image: InputArgs,

    /// Target aspect ratio (e.g., 16:9)
    #[arg(long, conflicts_with = "factor")]
    aspect_ratio: Option<AspectRatio>,

    /// Target width/height ratio between 0.5 and 3.0
    #[arg(long)]
    factor: Option<f64>,

    /// Prompt guiding the generated surroundings
    #[arg(short, long)]
    prompt: Option<String>,
}

#[derive(Args)]
struct PollArgs {
    /// Result URLs to check
    #[arg(required = true)]
    urls: Vec<String>,
}

/// An input given on the command line, resolved to bytes or a URL.
enum Input {
    Bytes(Vec<u8>),
    Url(String),
}

impl Input {
    fn load(value: &str) -> anyhow::Result<Self> {
        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(Self::Url(value.to_string()));
        }
        let data = std::fs::read(value).with_context(|| format!("failed to read {value}"))?;
        Ok(Self::Bytes(data))
    }

    fn split(self) -> (Option<Vec<u8>>, Option<String>) {
        match self {
            Self::Bytes(data) => (Some(data), None),
            Self::Url(url) => (None, Some(url)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("briakit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Capabilities = cli.command {
        return list_capabilities(cli.json);
    }

    let client = BriaClient::builder().build()?;
    let (capability, result) = match &cli.command {
        Commands::Generate(args) => {
            let mut request = TextToImageRequest::new(&args.prompt)
                .with_num_results(args.num_results)
                .with_aspect_ratio(args.aspect_ratio)
                .with_prompt_enhancement(args.prompt_enhancement)
                .with_enhance_image(args.enhance_image)
                .with_sync(!args.no_sync);
            if let Some(medium) = args.medium {
                request = request.with_medium(medium.into());
            }
            if let Some(negative) = &args.negative_prompt {
                request = request.with_negative_prompt(negative);
            }
            if let Some(seed) = args.seed {
                request = request.with_seed(seed);
            }
            (
                Capability::TextToImage,
                client.generate_image(&request).await?,
            )
        }
        Commands::EnhancePrompt(args) => {
            let enhanced = client.enhance_prompt(&args.prompt).await?;
            if cli.json {
                let out = serde_json::json!({
                    "prompt": args.prompt,
                    "enhanced_prompt": enhanced,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{enhanced}");
            }
            return Ok(());
        }
        Commands::ReplaceBg(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let request = BackgroundReplaceRequest {
                image_bytes,
                image_url,
                ..BackgroundReplaceRequest::new(&args.prompt)
            }
            .with_num_results(args.num_results)
            .with_sync(!args.no_sync);
            (
                Capability::BackgroundReplace,
                client.generate_background(&request).await?,
            )
        }
        Commands::RemoveBg(args) => {
            let (image_bytes, image_url) = Input::load(&args.input)?.split();
            let request = BackgroundRemoveRequest {
                image_bytes,
                image_url,
                ..BackgroundRemoveRequest::default()
            };
            (
                Capability::BackgroundRemove,
                client.remove_image_background(&request).await?,
            )
        }
        Commands::BlurBg(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let request = BackgroundBlurRequest {
                image_bytes,
                image_url,
                ..BackgroundBlurRequest::default()
            }
            .with_scale(args.scale);
            (
                Capability::BackgroundBlur,
                client.blur_background(&request).await?,
            )
        }
        Commands::Packshot(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let mut request = PackshotRequest {
                image_bytes,
                image_url,
                ..PackshotRequest::default()
            }
            .with_background_color(&args.background_color)
            .with_force_rmbg(args.force_rmbg);
            if let Some(sku) = &args.sku {
                request = request.with_sku(sku);
            }
            (
                Capability::ProductPackshot,
                client.create_product_packshot(&request).await?,
            )
        }
        Commands::Shadow(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let mut request = ShadowRequest {
                image_bytes,
                image_url,
                ..ShadowRequest::default()
            }
            .with_shadow_type(args.shadow_type.into())
            .with_shadow_intensity(args.intensity);
            if let Some(color) = &args.background_color {
                request = request.with_background_color(color);
            }
            (
                Capability::ProductShadow,
                client.add_product_shadow(&request).await?,
            )
        }
        Commands::Lifestyle(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let placement = match (args.placement, args.aspect_ratio) {
                (_, Some(ratio)) => Placement::AutomaticAspectRatio(ratio),
                (PlacementArg::Automatic, None) => Placement::Automatic,
                (PlacementArg::Original, None) => Placement::Original,
            };
            let mut request = LifestyleShotRequest {
                image_bytes,
                image_url,
                ..LifestyleShotRequest::new(&args.scene)
            }
            .with_num_results(args.num_results)
            .with_placement(placement)
            .with_sync(args.sync);
            if let Some(exclude) = &args.exclude {
                request = request.with_exclude_elements(exclude);
            }
            (
                Capability::LifestyleShot,
                client.create_lifestyle_shot_by_text(&request).await?,
            )
        }
        Commands::GenFill(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let mask = match Input::load(&args.mask)? {
                Input::Bytes(data) => MaskSource::Bytes(data),
                Input::Url(url) => MaskSource::Url(url),
            };
            let mut request = GenerativeFillRequest {
                image_bytes,
                image_url,
                ..GenerativeFillRequest::new(&args.prompt)
            }
            .with_mask(mask);
            if let Some(negative) = &args.negative_prompt {
                request = request.with_negative_prompt(negative);
            }
            if let Some(seed) = args.seed {
                request = request.with_seed(seed);
            }
            (
                Capability::GenerativeFill,
                client.generative_fill(&request).await?,
            )
        }
        Commands::Expand(args) => {
            let (image_bytes, image_url) = Input::load(&args.image.input)?.split();
            let target = match (args.aspect_ratio, args.factor) {
                (Some(ratio), _) => ExpansionTarget::AspectRatio(ratio),
                (None, Some(factor)) => ExpansionTarget::Factor(factor),
                (None, None) => anyhow::bail!("expand needs --aspect-ratio or --factor"),
            };
            let mut request = ImageExpansionRequest {
                image_bytes,
                image_url,
                target: Some(target),
                ..ImageExpansionRequest::default()
            };
            if let Some(prompt) = &args.prompt {
                request = request.with_prompt(prompt);
            }
            (
                Capability::ImageExpansion,
                client.expand_image(&request).await?,
            )
        }
        Commands::Erase(args) => {
            let (image_bytes, image_url) = Input::load(&args.input)?.split();
            let request = EraseForegroundRequest {
                image_bytes,
                image_url,
                ..EraseForegroundRequest::default()
            };
            (
                Capability::EraseForeground,
                client.erase_foreground(&request).await?,
            )
        }
        Commands::Cutout(args) => {
            let (image_bytes, image_url) = Input::load(&args.input)?.split();
            let request = CutoutRequest {
                image_bytes,
                image_url,
                ..CutoutRequest::default()
            };
            (
                Capability::ProductCutout,
                client.product_cutout(&request).await?,
            )
        }
        Commands::ProductRmbg(args) => {
            let (image_bytes, image_url) = Input::load(&args.input)?.split();
            let request = ProductBackgroundRemovalRequest {
                image_bytes,
                image_url,
                ..ProductBackgroundRemovalRequest::default()
            };
            (
                Capability::ProductRemoveBackground,
                client.remove_product_background(&request).await?,
            )
        }
        Commands::Poll(args) => {
            return poll_urls(&client, &args.urls, cli.output.as_deref(), cli.json).await;
        }
        Commands::Capabilities => return list_capabilities(cli.json),
    };

    report(&client, capability, result, &cli).await
}

async fn report(
    client: &BriaClient,
    capability: Capability,
    result: OperationResult,
    cli: &Cli,
) -> anyhow::Result<()> {
    match result {
        OperationResult::Failed(failure) => {
            if cli.json {
                let out = serde_json::json!({
                    "capability": capability.to_string(),
                    "status": "failed",
                    "error": failure.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            anyhow::bail!("{} failed: {failure}", capability.display_name());
        }
        OperationResult::Ready(ResultPayload::Bytes(data)) => {
            let image = briakit::DownloadedImage::new(data, "");
            let saved = match &cli.output {
                Some(dir) => Some(save_into(dir, &image.file_name(&capability.to_string()), &image)?),
                None => None,
            };
            if cli.json {
                let out = serde_json::json!({
                    "capability": capability.to_string(),
                    "status": "ready",
                    "size_bytes": image.size(),
                    "saved": saved.map(|p| p.display().to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}: inline image ({} bytes)", capability.display_name(), image.size());
                if let Some(path) = saved {
                    println!("Saved: {}", path.display());
                }
            }
            Ok(())
        }
        OperationResult::Ready(ResultPayload::Urls(urls)) => {
            finish_urls(client, capability, urls, Vec::new(), cli).await
        }
        OperationResult::Pending(urls) => {
            if cli.wait {
                let state = client.wait_for_results(urls).await;
                finish_urls(
                    client,
                    capability,
                    state.ready().to_vec(),
                    state.pending().to_vec(),
                    cli,
                )
                .await
            } else {
                finish_urls(client, capability, Vec::new(), urls, cli).await
            }
        }
    }
}

async fn finish_urls(
    client: &BriaClient,
    capability: Capability,
    ready: Vec<String>,
    pending: Vec<String>,
    cli: &Cli,
) -> anyhow::Result<()> {
    let saved = match &cli.output {
        Some(dir) => download_all(client, &ready, dir, &capability.to_string()).await?,
        None => Vec::new(),
    };

    if cli.json {
        let out = serde_json::json!({
            "capability": capability.to_string(),
            "status": if pending.is_empty() { "ready" } else { "pending" },
            "ready": ready,
            "pending": pending,
            "saved": saved.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for url in &ready {
            println!("Ready: {url}");
        }
        for url in &pending {
            println!("Pending: {url}");
        }
        for path in &saved {
            println!("Saved: {}", path.display());
        }
        if !pending.is_empty() && !cli.wait {
            println!("Run `briakit poll <urls>` or pass --wait to check again.");
        }
    }
    Ok(())
}

async fn poll_urls(
    client: &BriaClient,
    urls: &[String],
    output: Option<&Path>,
    json_output: bool,
) -> anyhow::Result<()> {
    let state = client.wait_for_results(urls.iter().cloned()).await;
    let saved = match output {
        Some(dir) => download_all(client, state.ready(), dir, "result").await?,
        None => Vec::new(),
    };

    if json_output {
        let out = serde_json::json!({
            "ready": state.ready(),
            "pending": state.pending(),
            "saved": saved.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} ready, {} still pending",
            state.ready().len(),
            state.pending().len()
        );
        for url in state.pending() {
            println!("Pending: {url}");
        }
        for path in &saved {
            println!("Saved: {}", path.display());
        }
    }
    Ok(())
}

async fn download_all(
    client: &BriaClient,
    urls: &[String],
    dir: &Path,
    stem: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut saved = Vec::with_capacity(urls.len());
    let mut used = HashSet::new();
    for (i, url) in urls.iter().enumerate() {
        let image = client
            .download(url)
            .await
            .with_context(|| format!("failed to download {url}"))?;
        let name = unique_name(image.file_name(&format!("{stem}_{i}")), i, &mut used);
        saved.push(save_into(dir, &name, &image)?);
    }
    Ok(saved)
}

/// Prefixes `name` with the result index when an earlier result took it.
fn unique_name(name: String, index: usize, used: &mut HashSet<String>) -> String {
    let name = if used.contains(&name) {
        format!("{index}_{name}")
    } else {
        name
    };
    used.insert(name.clone());
    name
}

fn save_into(dir: &Path, name: &str, image: &briakit::DownloadedImage) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    image.save(&path)?;
    Ok(path)
}

fn list_capabilities(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct CapabilityInfo {
        id: String,
        name: &'static str,
        path: &'static str,
        timeout_secs: u64,
    }

    let capabilities: Vec<CapabilityInfo> = Capability::ALL
        .iter()
        .map(|c| CapabilityInfo {
            id: c.to_string(),
            name: c.display_name(),
            path: c.path(),
            timeout_secs: c.timeout().as_secs(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&capabilities)?);
    } else {
        println!("Capabilities:");
        for c in &capabilities {
            println!("  {:<26} {:<34} {}s", c.name, c.path, c.timeout_secs);
        }
    }
    Ok(())
}
