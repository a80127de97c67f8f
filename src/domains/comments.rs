// Comments - comment and reply records scoped to an artwork

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{contains_ignore_case, toggle_like_entry};
use crate::core::strong_types::{ArtworkId, CommentId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::{load_collection, save_collection, KeyValueStore, COMMENTS_KEY};

pub const COMMENT_MAX_LEN: usize = 1000;
pub const REPLY_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub artwork_id: ArtworkId,
    pub user_id: UserId,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by: Vec<UserId>,
    /// Newest first
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<CommentFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: CommentId,
    pub user_id: UserId,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by: Vec<UserId>,
}

/// Moderation report against a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFlag {
    pub user_id: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
    pub total_comments: usize,
    pub total_replies: usize,
    pub total_likes: u64,
    pub active_commenters: usize,
}

fn validate_text(text: &str, max_len: usize, noun: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", noun)));
    }
    if text.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be less than {} characters",
            noun, max_len
        )));
    }
    Ok(())
}

fn newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub struct CommentManager {
    store: Arc<dyn KeyValueStore>,
    comments: RwLock<Vec<Comment>>,
}

impl CommentManager {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let comments: Vec<Comment> = load_collection(store.as_ref(), COMMENTS_KEY).await?;
        debug!("Loaded {} comments", comments.len());

        Ok(Self {
            store,
            comments: RwLock::new(comments),
        })
    }

    async fn save_comments(&self, comments: &[Comment]) -> AppResult<()> {
        save_collection(self.store.as_ref(), COMMENTS_KEY, comments).await
    }

    pub async fn add_comment(
        &self,
        artwork_id: &ArtworkId,
        user_id: &UserId,
        username: &str,
        text: &str,
    ) -> AppResult<Comment> {
        if artwork_id.is_empty() || user_id.is_empty() || username.is_empty() {
            return Err(AppError::Validation("Required fields missing".to_string()));
        }
        validate_text(text, COMMENT_MAX_LEN, "Comment")?;

        let comment = Comment {
            id: CommentId::generate(),
            artwork_id: artwork_id.clone(),
            user_id: user_id.clone(),
            username: username.to_string(),
            text: text.trim().to_string(),
            created_at: Utc::now(),
            updated_at: None,
            likes: 0,
            liked_by: Vec::new(),
            replies: Vec::new(),
            flags: Vec::new(),
        };

        let mut comments = self.comments.write().await;
        comments.insert(0, comment.clone());
        self.save_comments(&comments).await?;

        info!("{} commented on {}", username, artwork_id);
        Ok(comment)
    }

    pub async fn comments_by_artwork(&self, artwork_id: &ArtworkId) -> Vec<Comment> {
        let mut found: Vec<Comment> = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| &c.artwork_id == artwork_id)
            .cloned()
            .collect();
        newest_first(&mut found);
        found
    }

    pub async fn comment_by_id(&self, comment_id: &CommentId) -> Option<Comment> {
        self.comments
            .read()
            .await
            .iter()
            .find(|c| &c.id == comment_id)
            .cloned()
    }

    /// Author-only edit. `Ok(false)` when missing or not the author.
    pub async fn update_comment(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
        new_text: &str,
    ) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(comment) = comments.iter_mut().find(|c| &c.id == comment_id) else {
            return Ok(false);
        };
        if &comment.user_id != user_id {
            return Ok(false);
        }
        validate_text(new_text, COMMENT_MAX_LEN, "Comment")?;

        comment.text = new_text.trim().to_string();
        comment.updated_at = Some(Utc::now());

        self.save_comments(&comments).await?;
        Ok(true)
    }

    /// Author-only delete. `Ok(false)` when missing or not the author.
    pub async fn delete_comment(&self, comment_id: &CommentId, user_id: &UserId) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(pos) = comments.iter().position(|c| &c.id == comment_id) else {
            return Ok(false);
        };
        if &comments[pos].user_id != user_id {
            return Ok(false);
        }

        comments.remove(pos);
        self.save_comments(&comments).await?;
        debug!("Deleted comment {}", comment_id);
        Ok(true)
    }

    /// Drop every comment on an artwork; returns how many were removed
    pub async fn delete_comments_by_artwork(&self, artwork_id: &ArtworkId) -> AppResult<usize> {
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|c| &c.artwork_id != artwork_id);
        let removed = before - comments.len();

        self.save_comments(&comments).await?;
        debug!("Removed {} comments of artwork {}", removed, artwork_id);
        Ok(removed)
    }

    /// Drop every comment and reply written by a user; returns how many were removed
    pub async fn delete_comments_by_user(&self, user_id: &UserId) -> AppResult<usize> {
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|c| &c.user_id != user_id);
        let mut removed = before - comments.len();

        for comment in comments.iter_mut() {
            let replies_before = comment.replies.len();
            comment.replies.retain(|r| &r.user_id != user_id);
            removed += replies_before - comment.replies.len();
        }

        self.save_comments(&comments).await?;
        debug!("Removed {} comments and replies by {}", removed, user_id);
        Ok(removed)
    }

    pub async fn like_comment(&self, comment_id: &CommentId, user_id: &UserId) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(comment) = comments.iter_mut().find(|c| &c.id == comment_id) else {
            return Ok(false);
        };

        toggle_like_entry(&mut comment.liked_by, &mut comment.likes, user_id);
        self.save_comments(&comments).await?;
        Ok(true)
    }

    pub async fn is_comment_liked_by_user(&self, comment_id: &CommentId, user_id: &UserId) -> bool {
        self.comments
            .read()
            .await
            .iter()
            .find(|c| &c.id == comment_id)
            .is_some_and(|c| c.liked_by.contains(user_id))
    }

    /// Reply to a top-level comment. `Ok(None)` when the parent does not exist.
    pub async fn add_reply(
        &self,
        parent_id: &CommentId,
        user_id: &UserId,
        username: &str,
        text: &str,
    ) -> AppResult<Option<Reply>> {
        validate_text(text, REPLY_MAX_LEN, "Reply")?;

        let mut comments = self.comments.write().await;
        let Some(parent) = comments.iter_mut().find(|c| &c.id == parent_id) else {
            return Ok(None);
        };

        let reply = Reply {
            id: CommentId::generate(),
            user_id: user_id.clone(),
            username: username.to_string(),
            text: text.trim().to_string(),
            created_at: Utc::now(),
            likes: 0,
            liked_by: Vec::new(),
        };
        parent.replies.insert(0, reply.clone());

        self.save_comments(&comments).await?;
        Ok(Some(reply))
    }

    pub async fn like_reply(
        &self,
        parent_id: &CommentId,
        reply_id: &CommentId,
        user_id: &UserId,
    ) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(reply) = comments
            .iter_mut()
            .find(|c| &c.id == parent_id)
            .and_then(|c| c.replies.iter_mut().find(|r| &r.id == reply_id))
        else {
            return Ok(false);
        };

        toggle_like_entry(&mut reply.liked_by, &mut reply.likes, user_id);
        self.save_comments(&comments).await?;
        Ok(true)
    }

    pub async fn is_reply_liked_by_user(
        &self,
        parent_id: &CommentId,
        reply_id: &CommentId,
        user_id: &UserId,
    ) -> bool {
        self.comments
            .read()
            .await
            .iter()
            .find(|c| &c.id == parent_id)
            .and_then(|c| c.replies.iter().find(|r| &r.id == reply_id))
            .is_some_and(|r| r.liked_by.contains(user_id))
    }

    /// Author-only reply delete
    pub async fn delete_reply(
        &self,
        parent_id: &CommentId,
        reply_id: &CommentId,
        user_id: &UserId,
    ) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(parent) = comments.iter_mut().find(|c| &c.id == parent_id) else {
            return Ok(false);
        };
        let Some(pos) = parent.replies.iter().position(|r| &r.id == reply_id) else {
            return Ok(false);
        };
        if &parent.replies[pos].user_id != user_id {
            return Ok(false);
        }

        parent.replies.remove(pos);
        self.save_comments(&comments).await?;
        Ok(true)
    }

    /// Report a comment; each user may flag a comment once
    pub async fn flag_comment(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
        reason: &str,
    ) -> AppResult<bool> {
        let mut comments = self.comments.write().await;
        let Some(comment) = comments.iter_mut().find(|c| &c.id == comment_id) else {
            return Ok(false);
        };
        if comment.flags.iter().any(|f| &f.user_id == user_id) {
            return Ok(false);
        }

        comment.flags.push(CommentFlag {
            user_id: user_id.clone(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        });
        self.save_comments(&comments).await?;
        info!("Comment {} flagged by {}", comment_id, user_id);
        Ok(true)
    }

    pub async fn comment_stats(&self) -> CommentStats {
        let comments = self.comments.read().await;
        let commenters: HashSet<&UserId> = comments.iter().map(|c| &c.user_id).collect();

        CommentStats {
            total_comments: comments.len(),
            total_replies: comments.iter().map(|c| c.replies.len()).sum(),
            total_likes: comments.iter().map(|c| c.likes).sum(),
            active_commenters: commenters.len(),
        }
    }

    /// Match comment text or author name; an empty query returns the whole pool
    pub async fn search_comments(&self, query: &str, artwork_id: Option<&ArtworkId>) -> Vec<Comment> {
        let pool = match artwork_id {
            Some(id) => self.comments_by_artwork(id).await,
            None => self.comments.read().await.clone(),
        };
        if query.is_empty() {
            return pool;
        }

        let term = query.to_lowercase();
        pool.into_iter()
            .filter(|c| contains_ignore_case(&c.text, &term) || contains_ignore_case(&c.username, &term))
            .collect()
    }

    /// Replace the whole comment collection (sample data, imports)
    pub async fn import_comments(&self, records: Vec<Comment>) -> AppResult<()> {
        let mut comments = self.comments.write().await;
        *comments = records;
        self.save_comments(&comments).await
    }

    pub async fn clear_all_comments(&self) -> AppResult<()> {
        self.import_comments(Vec::new()).await
    }
}
