use std::env;

use artshare_store::{
    app_state::AppState,
    config::{Config, StorageBackend},
    data_seeder::{seed_sample_data, SAMPLE_PASSWORD},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🚀 Generating sample data for ArtShare");

    let mut config = Config::from_env()?;
    config.storage.backend = StorageBackend::File;
    if let Some(dir) = env::args().nth(1) {
        config.storage.data_dir = dir.into();
    }
    println!("Using data directory {}", config.storage.data_dir.display());

    let app_state = AppState::new(config).await?;
    if seed_sample_data(&app_state).await? {
        println!("✅ Sample users, artworks and comments written");
        println!("   Log in as ArtisticSoul, PixelMaster or ColorVibe with password '{}'", SAMPLE_PASSWORD);
    } else {
        println!("⚠️  Store already has users, nothing written");
    }

    Ok(())
}
