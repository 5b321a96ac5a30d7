use std::env;

use cloudinary_client::{ClientBuilder, Config, FileInput, Options, UploadOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(env::var("RUST_LOG").unwrap_or_else(
            |_| "demo_basic=debug,cloudinary_client=debug".into(),
        )))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    // Reads CLOUDINARY_URL, or CLOUDINARY_CLOUD_NAME / _API_KEY / _API_SECRET.
    let client = ClientBuilder::new(Config::from_env()?).build();

    // Upload whatever was passed on the command line: a local path or a URL.
    let source = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.rustacean.net/assets/rustacean-orig-noshadow.png".into());
    let uploaded = client
        .upload(
            FileInput::parse(&source),
            UploadOptions::new().public_id("ferris").tag("demo"),
        )
        .await?;
    tracing::info!(public_id = %uploaded.public_id, url = %uploaded.url, "uploaded");

    // URL construction.
    let thumbnail = client.build_url(
        &format!("{}.png", uploaded.public_id),
        &Options::new().width(150).height(100).crop("fill"),
    )?;
    tracing::info!(%thumbnail, "Open this link in your browser to view the transformed image");

    Ok(())
}
