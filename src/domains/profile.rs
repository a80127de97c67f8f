// Profile - read-only aggregates and achievement badges derived from artworks

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::artwork::{round_one_decimal, Artwork, ArtworkManager};
use super::auth::{AuthManager, ProfileUpdate, User};
use crate::core::strong_types::{Category, UserId};
use crate::error::{AppError, AppResult};

pub const BIO_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub user: User,
    pub artwork_count: usize,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_views: u64,
    pub category_stats: BTreeMap<Category, usize>,
    /// Highest likes + comments; later entries win ties
    pub most_popular_artwork: Option<Artwork>,
    pub average_likes_per_artwork: f64,
    pub joined_days_ago: i64,
}

impl ProfileStats {
    /// Aggregate a user's artworks as of `now`
    pub fn compute(user: User, artworks: &[Artwork], now: DateTime<Utc>) -> Self {
        let total_likes: u64 = artworks.iter().map(|a| a.likes).sum();

        let mut category_stats = BTreeMap::new();
        for artwork in artworks {
            *category_stats.entry(artwork.category).or_insert(0) += 1;
        }

        let most_popular_artwork = artworks
            .iter()
            .fold(None::<&Artwork>, |best, current| match best {
                Some(prev) if prev.likes + prev.comments > current.likes + current.comments => {
                    Some(prev)
                }
                _ => Some(current),
            })
            .cloned();

        let average_likes_per_artwork = if artworks.is_empty() {
            0.0
        } else {
            round_one_decimal(total_likes as f64 / artworks.len() as f64)
        };

        Self {
            joined_days_ago: (now - user.joined_date).num_days(),
            user,
            artwork_count: artworks.len(),
            total_likes,
            total_comments: artworks.iter().map(|a| a.comments).sum(),
            total_views: artworks.iter().map(|a| a.views).sum(),
            category_stats,
            most_popular_artwork,
            average_likes_per_artwork,
        }
    }

    /// Category with the most artworks
    pub fn top_category(&self) -> Option<Category> {
        self.category_stats
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(category, _)| *category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstArtwork,
    ActiveArtist,
    ProlificCreator,
    ArtMachine,
    LikedArtist,
    PopularArtist,
    BelovedArtist,
    Veteran,
    AnnualMember,
    ViewedArtist,
    ViralArtist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Artworks,
    Likes,
    DaysSinceJoin,
    Views,
}

struct Threshold {
    kind: AchievementKind,
    metric: Metric,
    at_least: u64,
    title: &'static str,
    description: &'static str,
}

static THRESHOLDS: [Threshold; 11] = [
    Threshold { kind: AchievementKind::FirstArtwork, metric: Metric::Artworks, at_least: 1, title: "First Creation", description: "Posted your first artwork!" },
    Threshold { kind: AchievementKind::ActiveArtist, metric: Metric::Artworks, at_least: 5, title: "Active Artist", description: "Posted 5 artworks" },
    Threshold { kind: AchievementKind::ProlificCreator, metric: Metric::Artworks, at_least: 10, title: "Prolific Creator", description: "Posted 10 artworks" },
    Threshold { kind: AchievementKind::ArtMachine, metric: Metric::Artworks, at_least: 25, title: "Art Machine", description: "Posted 25 artworks" },
    Threshold { kind: AchievementKind::LikedArtist, metric: Metric::Likes, at_least: 10, title: "Liked Artist", description: "Received 10 likes" },
    Threshold { kind: AchievementKind::PopularArtist, metric: Metric::Likes, at_least: 50, title: "Popular Artist", description: "Received 50 likes" },
    Threshold { kind: AchievementKind::BelovedArtist, metric: Metric::Likes, at_least: 100, title: "Beloved Artist", description: "Received 100 likes" },
    Threshold { kind: AchievementKind::Veteran, metric: Metric::DaysSinceJoin, at_least: 30, title: "Veteran", description: "Member for 30 days" },
    Threshold { kind: AchievementKind::AnnualMember, metric: Metric::DaysSinceJoin, at_least: 365, title: "Annual Member", description: "Member for 1 year" },
    Threshold { kind: AchievementKind::ViewedArtist, metric: Metric::Views, at_least: 100, title: "Viewed Artist", description: "Artworks viewed 100 times" },
    Threshold { kind: AchievementKind::ViralArtist, metric: Metric::Views, at_least: 1000, title: "Viral Artist", description: "Artworks viewed 1000 times" },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub title: &'static str,
    pub description: &'static str,
}

/// Every badge whose threshold the stats meet, in fixed order
pub fn achievements_for(stats: &ProfileStats) -> Vec<Achievement> {
    let value = |metric: Metric| -> u64 {
        match metric {
            Metric::Artworks => stats.artwork_count as u64,
            Metric::Likes => stats.total_likes,
            Metric::DaysSinceJoin => stats.joined_days_ago.max(0) as u64,
            Metric::Views => stats.total_views,
        }
    };

    THRESHOLDS
        .iter()
        .filter(|t| value(t.metric) >= t.at_least)
        .map(|t| Achievement {
            kind: t.kind,
            title: t.title,
            description: t.description,
        })
        .collect()
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// One-sentence description of a profile
pub fn summarize(stats: &ProfileStats) -> String {
    let mut summary = format!(
        "{} has been creating art for {} days",
        stats.user.username, stats.joined_days_ago
    );

    if stats.artwork_count == 0 {
        summary.push_str(" but hasn't shared any artworks yet.");
        return summary;
    }

    let count = stats.artwork_count as u64;
    summary.push_str(&format!(" and has shared {} artwork{}", count, plural(count)));
    if stats.total_likes > 0 {
        summary.push_str(&format!(
            " receiving {} like{}",
            stats.total_likes,
            plural(stats.total_likes)
        ));
    }

    let mut ranked: Vec<(&Category, &usize)> = stats.category_stats.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));
    let top: Vec<&str> = ranked.iter().take(2).map(|(c, _)| c.as_str()).collect();
    summary.push_str(&format!(". They primarily create {} art.", top.join(" and ")));

    summary
}

pub fn validate_profile_data(update: &ProfileUpdate) -> Vec<String> {
    let mut errors = Vec::new();
    if update
        .bio
        .as_deref()
        .is_some_and(|bio| bio.chars().count() > BIO_MAX_LEN)
    {
        errors.push(format!("Bio must be less than {} characters", BIO_MAX_LEN));
    }
    errors
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileExport {
    pub user: User,
    pub artworks: Vec<Artwork>,
    pub stats: ProfileStats,
    pub achievements: Vec<Achievement>,
    pub export_date: DateTime<Utc>,
}

/// Derives profile views from auth and artwork state; keeps nothing of its own
pub struct ProfileService {
    auth: Arc<AuthManager>,
    artworks: Arc<ArtworkManager>,
}

impl ProfileService {
    pub fn new(auth: Arc<AuthManager>, artworks: Arc<ArtworkManager>) -> Self {
        Self { auth, artworks }
    }

    pub async fn profile_stats(&self, user_id: &UserId) -> Option<ProfileStats> {
        let user = self.auth.user_by_id(user_id).await?;
        let artworks = self.artworks.artworks_by_user(user_id).await;
        Some(ProfileStats::compute(user, &artworks, Utc::now()))
    }

    pub async fn achievements(&self, user_id: &UserId) -> Vec<Achievement> {
        self.profile_stats(user_id)
            .await
            .map(|stats| achievements_for(&stats))
            .unwrap_or_default()
    }

    pub async fn profile_summary(&self, user_id: &UserId) -> Option<String> {
        self.profile_stats(user_id).await.map(|stats| summarize(&stats))
    }

    /// Validate and store bio/avatar edits. `Ok(false)` for unknown users.
    pub async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> AppResult<bool> {
        if let Some(msg) = validate_profile_data(&update).into_iter().next() {
            return Err(AppError::Validation(msg));
        }
        let updated = self.auth.update_user(user_id, update).await?;
        debug!("Profile update for {}: {}", user_id, updated);
        Ok(updated)
    }

    pub async fn export_profile_data(&self, user_id: &UserId) -> Option<ProfileExport> {
        let stats = self.profile_stats(user_id).await?;
        Some(ProfileExport {
            user: stats.user.clone(),
            artworks: self.artworks.artworks_by_user(user_id).await,
            achievements: achievements_for(&stats),
            stats,
            export_date: Utc::now(),
        })
    }
}
