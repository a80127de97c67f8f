use std::sync::Arc;

use artshare_store::{
    app_state::AppState,
    config::{Config, StorageBackend},
    core::{ArtworkId, Category, UserId},
    data_seeder::seed_sample_data,
    domains::{ArtworkQuery, NewArtwork, SortOrder},
    infrastructure::{FileStore, KeyValueStore},
    AppError,
};

async fn memory_state() -> AppState {
    AppState::new(Config::in_memory()).await.unwrap()
}

fn artwork_by(user_id: &UserId, artist: &str, title: &str, description: &str, category: &str) -> NewArtwork {
    NewArtwork {
        title: title.to_string(),
        description: description.to_string(),
        category: Some(category.to_string()),
        image_url: "https://example.com/image.png".to_string(),
        artist: artist.to_string(),
        artist_id: user_id.clone(),
    }
}

#[tokio::test]
async fn test_registration_starts_session_and_rejects_duplicates() {
    let state = memory_state().await;

    let user = state.auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();
    assert_eq!(state.auth.current_user().await, Some(user));

    let err = state
        .auth
        .register("artfan1", "other@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_like_example_walkthrough() {
    let state = memory_state().await;
    let owner = state.auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();
    let artwork = state
        .artworks
        .create_artwork(artwork_by(&owner.id, &owner.username, "Sunset Glow", "", "digital"))
        .await
        .unwrap();

    let fan = state.auth.register("SecondFan", "second@example.com", "secret2").await.unwrap();
    assert!(state.artworks.toggle_like(&artwork.id, &fan.id).await.unwrap());

    let liked = state.artworks.find_artwork(&artwork.id).await.unwrap();
    assert_eq!(liked.likes, 1);
    assert!(state.artworks.is_liked_by_user(&artwork.id, &fan.id).await);
    assert!(!state.artworks.is_liked_by_user(&artwork.id, &owner.id).await);
    assert_eq!(state.auth.user_by_id(&owner.id).await.unwrap().stats.likes, 1);

    // second toggle restores the original state
    assert!(state.artworks.toggle_like(&artwork.id, &fan.id).await.unwrap());
    assert_eq!(state.artworks.find_artwork(&artwork.id).await.unwrap().likes, 0);
    assert!(!state.artworks.is_liked_by_user(&artwork.id, &fan.id).await);
    assert_eq!(state.auth.user_by_id(&owner.id).await.unwrap().stats.likes, 0);
}

#[tokio::test]
async fn test_deleting_artwork_cascades_only_its_comments() {
    let state = memory_state().await;
    let owner = state.auth.register("Painter", "painter@example.com", "secret1").await.unwrap();

    let doomed = state
        .artworks
        .create_artwork(artwork_by(&owner.id, "Painter", "First Piece", "", "traditional"))
        .await
        .unwrap();
    let kept = state
        .artworks
        .create_artwork(artwork_by(&owner.id, "Painter", "Second Piece", "", "traditional"))
        .await
        .unwrap();

    state.post_comment(&doomed.id, &owner.id, "Going away").await.unwrap();
    state.post_comment(&doomed.id, &owner.id, "Also going").await.unwrap();
    state.post_comment(&kept.id, &owner.id, "Staying").await.unwrap();

    assert!(state.artworks.delete_artwork(&doomed.id, &owner.id).await.unwrap());
    assert!(state.comments.comments_by_artwork(&doomed.id).await.is_empty());
    assert_eq!(state.comments.comments_by_artwork(&kept.id).await.len(), 1);
    assert_eq!(state.auth.user_by_id(&owner.id).await.unwrap().stats.artworks, 1);
}

#[tokio::test]
async fn test_other_users_cannot_delete_or_edit() {
    let state = memory_state().await;
    let owner = state.auth.register("Owner", "owner@example.com", "secret1").await.unwrap();
    let other = state.auth.register("Other", "other@example.com", "secret2").await.unwrap();
    let artwork = state
        .artworks
        .create_artwork(artwork_by(&owner.id, "Owner", "Protected", "", "other"))
        .await
        .unwrap();

    assert!(!state.artworks.delete_artwork(&artwork.id, &other.id).await.unwrap());
    assert!(!state
        .artworks
        .update_artwork(&artwork.id, Default::default(), &other.id)
        .await
        .unwrap());
    assert!(state.artworks.find_artwork(&artwork.id).await.is_some());
}

#[tokio::test]
async fn test_artwork_reads_count_views() {
    let state = memory_state().await;
    let owner = state.auth.register("Viewer", "viewer@example.com", "secret1").await.unwrap();
    let artwork = state
        .artworks
        .create_artwork(artwork_by(&owner.id, "Viewer", "Watched", "", "photography"))
        .await
        .unwrap();

    let before = state.artworks.find_artwork(&artwork.id).await.unwrap().views;
    state.artworks.artwork_by_id(&artwork.id).await.unwrap();
    let after = state.artworks.artwork_by_id(&artwork.id).await.unwrap().unwrap();
    assert_eq!(after.views, before + 2);
}

#[tokio::test]
async fn test_category_and_search_filter_on_sample_data() {
    let state = memory_state().await;
    assert!(seed_sample_data(&state).await.unwrap());

    let results = state
        .artworks
        .filtered_artworks(&ArtworkQuery {
            category: Some(Category::Digital),
            search: "CYBERPUNK".to_string(),
            sort: SortOrder::Newest,
        })
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, ArtworkId::from("art1"));
    assert!(results.iter().all(|a| a.category == Category::Digital));
}

#[tokio::test]
async fn test_profile_reflects_sample_data() {
    let state = memory_state().await;
    seed_sample_data(&state).await.unwrap();

    let user = UserId::from("user1");
    let stats = state.profiles.profile_stats(&user).await.unwrap();
    assert_eq!(stats.artwork_count, 2);
    assert_eq!(stats.total_likes, 66);
    assert_eq!(stats.average_likes_per_artwork, 33.0);
    assert_eq!(
        stats.most_popular_artwork.map(|a| a.id),
        Some(ArtworkId::from("art4"))
    );

    let titles: Vec<&str> = state
        .profiles
        .achievements(&user)
        .await
        .iter()
        .map(|a| a.title)
        .collect();
    assert!(titles.contains(&"First Creation"));
    assert!(titles.contains(&"Popular Artist"));
    assert!(titles.contains(&"Annual Member"));
    assert!(!titles.contains(&"Active Artist"));
}

#[tokio::test]
async fn test_file_store_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::in_memory();
    config.storage.backend = StorageBackend::File;
    config.storage.data_dir = dir.path().to_path_buf();

    let (owner_id, artwork_id) = {
        let state = AppState::new(config.clone()).await.unwrap();
        let owner = state.auth.register("Keeper", "keeper@example.com", "secret1").await.unwrap();
        let artwork = state
            .artworks
            .create_artwork(artwork_by(&owner.id, "Keeper", "Persistent Piece", "", "3d"))
            .await
            .unwrap();
        let fan = state.auth.register("Fan", "fan@example.com", "secret2").await.unwrap();
        state.artworks.toggle_like(&artwork.id, &fan.id).await.unwrap();
        (owner.id, artwork.id)
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let reloaded = AppState::with_store(store, config).await.unwrap();

    let artwork = reloaded.artworks.find_artwork(&artwork_id).await.unwrap();
    assert_eq!(artwork.likes, 1);
    assert_eq!(artwork.category, Category::ThreeD);
    assert_eq!(reloaded.auth.user_by_id(&owner_id).await.unwrap().stats.artworks, 1);
    assert_eq!(
        reloaded.auth.current_user().await.map(|u| u.username),
        Some("Fan".to_string())
    );
    assert!(reloaded.auth.login("Keeper", "secret1").await.is_ok());
}
