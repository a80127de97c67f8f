use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::{Config, StorageBackend},
    core::strong_types::{ArtworkId, CommentId, UserId},
    domains::{ArtworkManager, AuthManager, Comment, CommentManager, ProfileService, Reply},
    error::{AppError, AppResult},
    infrastructure::{
        file_storage::FileStore,
        image_upload::read_image_as_data_uri,
        security::CredentialHasher,
        storage::{KeyValueStore, MemoryStore},
    },
};

/// Dependency injection root: every manager gets its collaborators here
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub artworks: Arc<ArtworkManager>,
    pub comments: Arc<CommentManager>,
    pub profiles: Arc<ProfileService>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(FileStore::open(&config.storage.data_dir).await?),
        };
        info!("Opened {:?} store", config.storage.backend);

        Ok(Self::with_store(store, config).await?)
    }

    /// Build the managers over an already opened store
    pub async fn with_store(store: Arc<dyn KeyValueStore>, config: Config) -> AppResult<Self> {
        let hasher = CredentialHasher::new(&config.security)?;

        let auth = Arc::new(AuthManager::load(store.clone(), hasher).await?);
        let comments = Arc::new(CommentManager::load(store.clone()).await?);
        let artworks =
            Arc::new(ArtworkManager::load(store, auth.clone(), comments.clone()).await?);
        let profiles = Arc::new(ProfileService::new(auth.clone(), artworks.clone()));

        Ok(Self {
            auth,
            artworks,
            comments,
            profiles,
            config,
        })
    }

    /// Comment on an artwork and bump its comment count
    pub async fn post_comment(
        &self,
        artwork_id: &ArtworkId,
        user_id: &UserId,
        text: &str,
    ) -> AppResult<Comment> {
        let user = self
            .auth
            .user_by_id(user_id)
            .await
            .ok_or_else(|| AppError::Unauthorized("Please log in to comment".to_string()))?;
        if self.artworks.find_artwork(artwork_id).await.is_none() {
            return Err(AppError::NotFound(format!("Artwork {} not found", artwork_id)));
        }

        let comment = self
            .comments
            .add_comment(artwork_id, user_id, &user.username, text)
            .await?;
        self.artworks.increment_comment_count(artwork_id).await?;
        Ok(comment)
    }

    /// Author-only delete; the artwork count follows the comment
    pub async fn remove_comment(&self, comment_id: &CommentId, user_id: &UserId) -> AppResult<bool> {
        let Some(comment) = self.comments.comment_by_id(comment_id).await else {
            return Ok(false);
        };
        if !self.comments.delete_comment(comment_id, user_id).await? {
            return Ok(false);
        }
        self.artworks.decrement_comment_count(&comment.artwork_id).await?;
        Ok(true)
    }

    pub async fn reply_to_comment(
        &self,
        parent_id: &CommentId,
        user_id: &UserId,
        text: &str,
    ) -> AppResult<Option<Reply>> {
        let user = self
            .auth
            .user_by_id(user_id)
            .await
            .ok_or_else(|| AppError::Unauthorized("Please log in to reply".to_string()))?;
        self.comments
            .add_reply(parent_id, user_id, &user.username, text)
            .await
    }

    /// Replies never count towards the artwork's comment total
    pub async fn remove_reply(
        &self,
        parent_id: &CommentId,
        reply_id: &CommentId,
        user_id: &UserId,
    ) -> AppResult<bool> {
        self.comments.delete_reply(parent_id, reply_id, user_id).await
    }

    /// Read a local image into a data URI under the configured size ceiling
    pub async fn upload_image(&self, path: impl AsRef<Path>) -> AppResult<String> {
        read_image_as_data_uri(path, self.config.uploads.max_bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::NewArtwork;

    async fn state_with_artwork() -> (AppState, UserId, ArtworkId) {
        let state = AppState::new(Config::in_memory()).await.unwrap();
        let user = state.auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();
        let artwork = state
            .artworks
            .create_artwork(NewArtwork {
                title: "Sunset Glow".to_string(),
                image_url: "https://example.com/sunset.png".to_string(),
                artist: user.username.clone(),
                artist_id: user.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        (state, user.id, artwork.id)
    }

    #[tokio::test]
    async fn test_post_and_remove_comment_tracks_count() {
        let (state, user, artwork) = state_with_artwork().await;

        let comment = state.post_comment(&artwork, &user, "Lovely colors").await.unwrap();
        assert_eq!(comment.username, "ArtFan1");
        assert_eq!(state.artworks.find_artwork(&artwork).await.unwrap().comments, 1);

        assert!(state.remove_comment(&comment.id, &user).await.unwrap());
        assert_eq!(state.artworks.find_artwork(&artwork).await.unwrap().comments, 0);
        assert!(!state.remove_comment(&comment.id, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_comment_by_other_user_is_refused() {
        let (state, user, artwork) = state_with_artwork().await;
        let other = state.auth.register("Critic", "critic@example.com", "secret2").await.unwrap();

        let comment = state.post_comment(&artwork, &user, "Mine").await.unwrap();
        assert!(!state.remove_comment(&comment.id, &other.id).await.unwrap());
        assert_eq!(state.artworks.find_artwork(&artwork).await.unwrap().comments, 1);
    }

    #[tokio::test]
    async fn test_post_comment_rejects_unknown_targets() {
        let (state, user, artwork) = state_with_artwork().await;

        let err = state
            .post_comment(&ArtworkId::from("missing"), &user, "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = state
            .post_comment(&artwork, &UserId::from("ghost"), "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_replies_leave_comment_count_alone() {
        let (state, user, artwork) = state_with_artwork().await;
        let comment = state.post_comment(&artwork, &user, "Parent").await.unwrap();

        let reply = state
            .reply_to_comment(&comment.id, &user, "Child")
            .await
            .unwrap()
            .unwrap();
        assert!(state.remove_reply(&comment.id, &reply.id, &user).await.unwrap());
        assert_eq!(state.artworks.find_artwork(&artwork).await.unwrap().comments, 1);
    }

    #[tokio::test]
    async fn test_upload_image_uses_configured_ceiling() {
        let mut config = Config::in_memory();
        config.uploads.max_bytes = 8;
        let state = AppState::new(config).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("dot.gif");
        let large = dir.path().join("big.gif");
        tokio::fs::write(&small, b"GIF89a").await.unwrap();
        tokio::fs::write(&large, vec![0u8; 16]).await.unwrap();

        let uri = state.upload_image(&small).await.unwrap();
        assert!(uri.starts_with("data:image/gif;base64,"));
        assert!(matches!(
            state.upload_image(&large).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
