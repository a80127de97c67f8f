// Artwork - artwork records, the like-relation, feeds, search and view counting

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::auth::{AuthManager, StatKind};
use super::comments::CommentManager;
use super::{contains_ignore_case, toggle_like_entry};
use crate::core::strong_types::{ArtworkId, Category, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::{
    load_collection, save_collection, KeyValueStore, ARTWORKS_KEY, USER_LIKES_KEY,
};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;
pub const MAX_TAGS: usize = 5;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should",
    ]
    .into_iter()
    .collect()
});

/// Artwork id -> users who liked it
pub type LikeRelation = BTreeMap<ArtworkId, Vec<UserId>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Owner's username at posting time
    pub artist: String,
    pub artist_id: UserId,
    #[serde(default)]
    pub category: Category,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
}

impl Artwork {
    /// likes + 2 x comments
    pub fn engagement(&self) -> u64 {
        self.likes + self.comments * 2
    }

    fn popularity(&self) -> f64 {
        self.engagement() as f64 + self.views as f64 * 0.1
    }

    fn matches_term(&self, lowered_term: &str) -> bool {
        contains_ignore_case(&self.title, lowered_term)
            || contains_ignore_case(&self.description, lowered_term)
            || contains_ignore_case(&self.artist, lowered_term)
            || self.tags.iter().any(|tag| contains_ignore_case(tag, lowered_term))
    }
}

/// Form input for a new artwork. `category` is the raw form value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtwork {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub image_url: String,
    pub artist: String,
    pub artist_id: UserId,
}

/// Owner-editable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    /// likes + 2 x comments, descending
    Popular,
}

impl std::str::FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "popular" => Ok(SortOrder::Popular),
            other => Err(AppError::Validation(format!("Unknown sort order '{}'", other))),
        }
    }
}

/// Gallery filter: `None` category means all categories
#[derive(Debug, Clone, Default)]
pub struct ArtworkQuery {
    pub category: Option<Category>,
    pub search: String,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkStats {
    pub total_artworks: usize,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_views: u64,
    pub category_counts: BTreeMap<Category, usize>,
    /// Rounded to one decimal
    pub average_likes_per_artwork: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkExport {
    pub artworks: Vec<Artwork>,
    pub user_likes: LikeRelation,
    pub export_date: DateTime<Utc>,
}

/// Lower-cased title/description words longer than two characters, minus stop words, at most five
pub fn extract_tags(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(*word))
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn sort_artworks(artworks: &mut [Artwork], order: SortOrder) {
    match order {
        SortOrder::Newest => artworks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => {
            // mirror of newest, ties included
            artworks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            artworks.reverse();
        }
        SortOrder::Popular => artworks.sort_by(|a, b| b.engagement().cmp(&a.engagement())),
    }
}

fn validate_title(title: &str) -> Option<String> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN_LEN {
        Some(format!("Title must be at least {} characters long", TITLE_MIN_LEN))
    } else if title.chars().count() > TITLE_MAX_LEN {
        Some(format!("Title must be less than {} characters", TITLE_MAX_LEN))
    } else {
        None
    }
}

fn validate_description(description: &str) -> Option<String> {
    (description.chars().count() > DESCRIPTION_MAX_LEN)
        .then(|| format!("Description must be less than {} characters", DESCRIPTION_MAX_LEN))
}

#[derive(Debug, Default)]
struct ArtworkState {
    /// Newest insertion first
    artworks: Vec<Artwork>,
    user_likes: LikeRelation,
}

/// Owns artworks and the like-relation; both live under one lock so a like
/// toggle moves the relation and the counter together
pub struct ArtworkManager {
    store: Arc<dyn KeyValueStore>,
    auth: Arc<AuthManager>,
    comments: Arc<CommentManager>,
    state: RwLock<ArtworkState>,
}

impl ArtworkManager {
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        auth: Arc<AuthManager>,
        comments: Arc<CommentManager>,
    ) -> AppResult<Self> {
        let artworks: Vec<Artwork> = load_collection(store.as_ref(), ARTWORKS_KEY).await?;
        let user_likes: LikeRelation = load_collection(store.as_ref(), USER_LIKES_KEY).await?;
        debug!(
            "Loaded {} artworks and likes for {} of them",
            artworks.len(),
            user_likes.len()
        );

        Ok(Self {
            store,
            auth,
            comments,
            state: RwLock::new(ArtworkState { artworks, user_likes }),
        })
    }

    async fn save_artworks(&self, state: &ArtworkState) -> AppResult<()> {
        save_collection(self.store.as_ref(), ARTWORKS_KEY, &state.artworks).await
    }

    async fn save_all(&self, state: &ArtworkState) -> AppResult<()> {
        self.save_artworks(state).await?;
        save_collection(self.store.as_ref(), USER_LIKES_KEY, &state.user_likes).await
    }

    /// Every problem with the form, in display order
    pub fn validate_artwork_data(data: &NewArtwork) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(msg) = validate_title(&data.title) {
            errors.push(msg);
        }
        if let Some(msg) = validate_description(&data.description) {
            errors.push(msg);
        }
        if data.image_url.is_empty() {
            errors.push("Image is required".to_string());
        }
        if let Some(category) = data.category.as_deref().filter(|c| !c.is_empty()) {
            if category.parse::<Category>().is_err() {
                errors.push("Invalid category selected".to_string());
            }
        }

        errors
    }

    #[instrument(skip(self, data), fields(title = %data.title, artist = %data.artist))]
    pub async fn create_artwork(&self, data: NewArtwork) -> AppResult<Artwork> {
        if data.title.is_empty()
            || data.image_url.is_empty()
            || data.artist.is_empty()
            || data.artist_id.as_str().is_empty()
        {
            return Err(AppError::Validation("Required fields missing".to_string()));
        }
        if let Some(msg) = validate_title(&data.title) {
            return Err(AppError::Validation(msg));
        }
        if let Some(msg) = validate_description(&data.description) {
            return Err(AppError::Validation(msg));
        }
        let category = match data.category.as_deref() {
            None | Some("") => Category::Other,
            Some(raw) => raw.parse()?,
        };

        let artwork = Artwork {
            id: ArtworkId::generate(),
            tags: extract_tags(&format!("{} {}", data.title, data.description)),
            title: data.title.trim().to_string(),
            description: data.description.trim().to_string(),
            artist: data.artist,
            artist_id: data.artist_id,
            category,
            image_url: data.image_url,
            created_at: Utc::now(),
            updated_at: None,
            likes: 0,
            comments: 0,
            views: 0,
        };

        {
            let mut state = self.state.write().await;
            state.artworks.insert(0, artwork.clone());
            self.save_artworks(&state).await?;
        }

        self.auth
            .increment_user_stats(&artwork.artist_id, StatKind::Artworks)
            .await?;

        info!("Artwork {} created", artwork.id);
        Ok(artwork)
    }

    pub async fn all_artworks(&self, sort: SortOrder) -> Vec<Artwork> {
        let mut artworks = self.state.read().await.artworks.clone();
        sort_artworks(&mut artworks, sort);
        artworks
    }

    /// Category filter plus case-insensitive search over title, description, artist and tags
    pub async fn filtered_artworks(&self, query: &ArtworkQuery) -> Vec<Artwork> {
        let term = query.search.trim().to_lowercase();
        let mut filtered: Vec<Artwork> = self
            .state
            .read()
            .await
            .artworks
            .iter()
            .filter(|a| query.category.map_or(true, |c| a.category == c))
            .filter(|a| term.is_empty() || a.matches_term(&term))
            .cloned()
            .collect();
        sort_artworks(&mut filtered, query.sort);
        filtered
    }

    /// Fetch an artwork for display. Every call counts as a view and is persisted.
    pub async fn artwork_by_id(&self, artwork_id: &ArtworkId) -> AppResult<Option<Artwork>> {
        let mut state = self.state.write().await;
        let Some(artwork) = state.artworks.iter_mut().find(|a| &a.id == artwork_id) else {
            return Ok(None);
        };

        artwork.views += 1;
        let snapshot = artwork.clone();
        self.save_artworks(&state).await?;
        Ok(Some(snapshot))
    }

    /// Read without counting a view
    pub async fn find_artwork(&self, artwork_id: &ArtworkId) -> Option<Artwork> {
        self.state
            .read()
            .await
            .artworks
            .iter()
            .find(|a| &a.id == artwork_id)
            .cloned()
    }

    pub async fn artworks_by_user(&self, user_id: &UserId) -> Vec<Artwork> {
        let mut artworks: Vec<Artwork> = self
            .state
            .read()
            .await
            .artworks
            .iter()
            .filter(|a| &a.artist_id == user_id)
            .cloned()
            .collect();
        sort_artworks(&mut artworks, SortOrder::Newest);
        artworks
    }

    pub async fn artworks_by_category(&self, category: Category) -> Vec<Artwork> {
        self.filtered_artworks(&ArtworkQuery {
            category: Some(category),
            ..ArtworkQuery::default()
        })
        .await
    }

    /// Newest-first search; an empty query finds nothing
    pub async fn search_artworks(&self, query: &str) -> Vec<Artwork> {
        if query.is_empty() {
            return Vec::new();
        }
        self.filtered_artworks(&ArtworkQuery {
            search: query.to_string(),
            ..ArtworkQuery::default()
        })
        .await
    }

    pub async fn liked_artworks(&self, user_id: &UserId) -> Vec<Artwork> {
        let state = self.state.read().await;
        let mut liked: Vec<Artwork> = state
            .artworks
            .iter()
            .filter(|a| {
                state
                    .user_likes
                    .get(&a.id)
                    .is_some_and(|users| users.contains(user_id))
            })
            .cloned()
            .collect();
        sort_artworks(&mut liked, SortOrder::Newest);
        liked
    }

    /// Flip the user's like. The artwork's count and the owner's like stat move with it.
    /// `Ok(false)` when there is no user or the artwork does not exist.
    pub async fn toggle_like(&self, artwork_id: &ArtworkId, user_id: &UserId) -> AppResult<bool> {
        if user_id.is_empty() {
            return Ok(false);
        }

        let mut state = self.state.write().await;
        let ArtworkState { artworks, user_likes } = &mut *state;

        let Some(artwork) = artworks.iter_mut().find(|a| &a.id == artwork_id) else {
            return Ok(false);
        };
        let liked_by = user_likes.entry(artwork_id.clone()).or_default();
        let now_liked = toggle_like_entry(liked_by, &mut artwork.likes, user_id);
        let owner = artwork.artist_id.clone();

        self.save_all(&state).await?;

        if now_liked {
            self.auth.increment_user_stats(&owner, StatKind::Likes).await?;
        } else {
            self.auth.decrement_user_stats(&owner, StatKind::Likes).await?;
        }

        debug!(
            "{} {} artwork {}",
            user_id,
            if now_liked { "liked" } else { "unliked" },
            artwork_id
        );
        Ok(true)
    }

    pub async fn is_liked_by_user(&self, artwork_id: &ArtworkId, user_id: &UserId) -> bool {
        self.state
            .read()
            .await
            .user_likes
            .get(artwork_id)
            .is_some_and(|users| users.contains(user_id))
    }

    /// Owner-only delete. Cascades to likes, comments and the owner's stats.
    pub async fn delete_artwork(&self, artwork_id: &ArtworkId, user_id: &UserId) -> AppResult<bool> {
        let removed = {
            let mut state = self.state.write().await;
            let Some(pos) = state.artworks.iter().position(|a| &a.id == artwork_id) else {
                return Ok(false);
            };
            if &state.artworks[pos].artist_id != user_id {
                return Ok(false);
            }

            let removed = state.artworks.remove(pos);
            state.user_likes.remove(artwork_id);
            self.save_all(&state).await?;
            removed
        };

        let dropped_comments = self.comments.delete_comments_by_artwork(artwork_id).await?;
        self.auth
            .decrement_user_stats(user_id, StatKind::Artworks)
            .await?;
        self.auth
            .adjust_user_stats(user_id, StatKind::Likes, -(removed.likes as i64))
            .await?;

        info!(
            "Artwork {} deleted with {} comments",
            artwork_id, dropped_comments
        );
        Ok(true)
    }

    /// Owner-only edit of title, description, category and tags
    pub async fn update_artwork(
        &self,
        artwork_id: &ArtworkId,
        update: ArtworkUpdate,
        user_id: &UserId,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(artwork) = state.artworks.iter_mut().find(|a| &a.id == artwork_id) else {
            return Ok(false);
        };
        if &artwork.artist_id != user_id {
            return Ok(false);
        }

        if let Some(msg) = update.title.as_deref().and_then(validate_title) {
            return Err(AppError::Validation(msg));
        }
        if let Some(msg) = update.description.as_deref().and_then(validate_description) {
            return Err(AppError::Validation(msg));
        }

        if let Some(title) = update.title {
            artwork.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            artwork.description = description.trim().to_string();
        }
        if let Some(category) = update.category {
            artwork.category = category;
        }
        if let Some(mut tags) = update.tags {
            tags.truncate(MAX_TAGS);
            artwork.tags = tags;
        }
        artwork.updated_at = Some(Utc::now());

        self.save_artworks(&state).await?;
        Ok(true)
    }

    pub async fn increment_comment_count(&self, artwork_id: &ArtworkId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(artwork) = state.artworks.iter_mut().find(|a| &a.id == artwork_id) else {
            return Ok(false);
        };
        artwork.comments += 1;
        self.save_artworks(&state).await?;
        Ok(true)
    }

    /// `Ok(false)` when missing or already at zero
    pub async fn decrement_comment_count(&self, artwork_id: &ArtworkId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(artwork) = state
            .artworks
            .iter_mut()
            .find(|a| &a.id == artwork_id && a.comments > 0)
        else {
            return Ok(false);
        };
        artwork.comments -= 1;
        self.save_artworks(&state).await?;
        Ok(true)
    }

    /// Top `limit` by likes + 2 x comments + 0.1 x views
    pub async fn popular_artworks(&self, limit: usize) -> Vec<Artwork> {
        let mut artworks = self.state.read().await.artworks.clone();
        artworks.sort_by(|a, b| b.popularity().total_cmp(&a.popularity()));
        artworks.truncate(limit);
        artworks
    }

    pub async fn recent_artworks(&self, limit: usize) -> Vec<Artwork> {
        let mut artworks = self.all_artworks(SortOrder::Newest).await;
        artworks.truncate(limit);
        artworks
    }

    pub async fn random_artworks(&self, limit: usize) -> Vec<Artwork> {
        let mut artworks = self.state.read().await.artworks.clone();
        artworks.shuffle(&mut rand::rng());
        artworks.truncate(limit);
        artworks
    }

    pub async fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for artwork in self.state.read().await.artworks.iter() {
            *counts.entry(artwork.category).or_insert(0) += 1;
        }
        counts
    }

    pub async fn artwork_stats(&self) -> ArtworkStats {
        let category_counts = self.category_counts().await;
        let state = self.state.read().await;
        let artworks = &state.artworks;

        let total_likes: u64 = artworks.iter().map(|a| a.likes).sum();
        let average = if artworks.is_empty() {
            0.0
        } else {
            round_one_decimal(total_likes as f64 / artworks.len() as f64)
        };

        ArtworkStats {
            total_artworks: artworks.len(),
            total_likes,
            total_comments: artworks.iter().map(|a| a.comments).sum(),
            total_views: artworks.iter().map(|a| a.views).sum(),
            category_counts,
            average_likes_per_artwork: average,
        }
    }

    pub async fn export_artworks(&self) -> ArtworkExport {
        let state = self.state.read().await;
        ArtworkExport {
            artworks: state.artworks.clone(),
            user_likes: state.user_likes.clone(),
            export_date: Utc::now(),
        }
    }

    /// Replace artworks and the like-relation wholesale
    pub async fn import_artworks(&self, export: ArtworkExport) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.artworks = export.artworks;
        state.user_likes = export.user_likes;
        self.save_all(&state).await?;
        info!("Imported {} artworks", state.artworks.len());
        Ok(())
    }

    pub async fn clear_all_artworks(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        *state = ArtworkState::default();
        self.save_all(&state).await
    }
}
