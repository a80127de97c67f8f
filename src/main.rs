// ArtShare Store - opens the configured store and reports on the gallery

use tracing_subscriber::EnvFilter;

use artshare_store::{
    app_state::AppState,
    config::Config,
    data_seeder::seed_sample_data,
    domains::SortOrder,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if config.seed_sample_data {
        seed_sample_data(&app_state).await?;
    }

    let community = app_state.auth.community_stats().await;
    let artworks = app_state.artworks.artwork_stats().await;
    let comments = app_state.comments.comment_stats().await;

    println!("🎨 ArtShare gallery ({:?} storage)", config.storage.backend);
    println!(
        "  Users:     {} ({} active)",
        community.total_users, community.active_users
    );
    println!(
        "  Artworks:  {} ({} likes, {} views, {:.1} likes/artwork)",
        artworks.total_artworks,
        artworks.total_likes,
        artworks.total_views,
        artworks.average_likes_per_artwork
    );
    println!(
        "  Comments:  {} ({} replies)",
        comments.total_comments, comments.total_replies
    );
    for (category, count) in &artworks.category_counts {
        println!("    {:<12} {}", category, count);
    }

    let popular = app_state.artworks.all_artworks(SortOrder::Popular).await;
    if let Some(top) = popular.first() {
        println!("  Most popular: \"{}\" by {} ({} likes)", top.title, top.artist, top.likes);
    }
    if let Some(user) = app_state.auth.current_user().await {
        println!("  Signed in as {}", user.username);
    }

    Ok(())
}
