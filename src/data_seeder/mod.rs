use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

use crate::{
    app_state::AppState,
    core::strong_types::{ArtworkId, Category, CommentId, UserId},
    domains::{artwork::ArtworkExport, Artwork, Comment, UserRecord, UserStats},
    error::{AppError, AppResult},
};

/// Password shared by every sample account
pub const SAMPLE_PASSWORD: &str = "artshare123";

struct SampleUser {
    id: &'static str,
    username: &'static str,
    email: &'static str,
    bio: &'static str,
    avatar: &'static str,
    joined: &'static str,
}

struct SampleArtwork {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    artist_id: &'static str,
    category: Category,
    image_url: &'static str,
    created: &'static str,
    likes: u64,
    comments: u64,
    tags: [&'static str; 3],
}

struct SampleComment {
    id: &'static str,
    artwork_id: &'static str,
    user_id: &'static str,
    text: &'static str,
    created: &'static str,
}

static USERS: [SampleUser; 3] = [
    SampleUser {
        id: "user1",
        username: "ArtisticSoul",
        email: "artist@example.com",
        bio: "Digital artist passionate about fantasy and sci-fi art",
        avatar: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=120&h=120&fit=crop&crop=face",
        joined: "2024-01-15T00:00:00Z",
    },
    SampleUser {
        id: "user2",
        username: "PixelMaster",
        email: "pixel@example.com",
        bio: "Pixel art enthusiast and game developer",
        avatar: "https://images.unsplash.com/photo-1494790108755-2616b332c2cc?w=120&h=120&fit=crop&crop=face",
        joined: "2024-02-20T00:00:00Z",
    },
    SampleUser {
        id: "user3",
        username: "ColorVibe",
        email: "color@example.com",
        bio: "Abstract artist exploring color and form",
        avatar: "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=120&h=120&fit=crop&crop=face",
        joined: "2024-03-10T00:00:00Z",
    },
];

static ARTWORKS: [SampleArtwork; 6] = [
    SampleArtwork {
        id: "art1",
        title: "Cyberpunk Cityscape",
        description: "A neon-lit cityscape depicting a futuristic cyberpunk world with towering skyscrapers and flying vehicles.",
        artist_id: "user1",
        category: Category::Digital,
        image_url: "https://images.unsplash.com/photo-1518709268805-4e9042af2176?w=800&h=600&fit=crop",
        created: "2024-12-15T10:30:00Z",
        likes: 25,
        comments: 5,
        tags: ["cyberpunk", "futuristic", "cityscape"],
    },
    SampleArtwork {
        id: "art2",
        title: "Pixel Adventure Character",
        description: "A charming 16-bit style character design for an indie adventure game.",
        artist_id: "user2",
        category: Category::Digital,
        image_url: "https://images.unsplash.com/photo-1542751371-adc38448a05e?w=800&h=600&fit=crop",
        created: "2024-12-14T15:45:00Z",
        likes: 18,
        comments: 3,
        tags: ["pixel", "character", "game"],
    },
    SampleArtwork {
        id: "art3",
        title: "Abstract Flow",
        description: "An exploration of organic shapes and vibrant colors creating a sense of movement and energy.",
        artist_id: "user3",
        category: Category::Digital,
        image_url: "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=800&h=600&fit=crop",
        created: "2024-12-13T09:20:00Z",
        likes: 32,
        comments: 8,
        tags: ["abstract", "colorful", "flow"],
    },
    SampleArtwork {
        id: "art4",
        title: "Mountain Landscape",
        description: "A serene mountain landscape painted in traditional watercolor style.",
        artist_id: "user1",
        category: Category::Traditional,
        image_url: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=800&h=600&fit=crop",
        created: "2024-12-12T14:15:00Z",
        likes: 41,
        comments: 12,
        tags: ["landscape", "mountains", "nature"],
    },
    SampleArtwork {
        id: "art5",
        title: "Character Portrait",
        description: "A detailed character portrait showcasing lighting and anatomy studies.",
        artist_id: "user2",
        category: Category::Digital,
        image_url: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=800&h=600&fit=crop",
        created: "2024-12-11T11:30:00Z",
        likes: 29,
        comments: 6,
        tags: ["portrait", "character", "study"],
    },
    SampleArtwork {
        id: "art6",
        title: "Geometric Harmony",
        description: "A study in geometric patterns and color relationships.",
        artist_id: "user3",
        category: Category::Digital,
        image_url: "https://images.unsplash.com/photo-1557804506-669a67965ba0?w=800&h=600&fit=crop",
        created: "2024-12-10T16:00:00Z",
        likes: 22,
        comments: 4,
        tags: ["geometric", "patterns", "harmony"],
    },
];

static COMMENTS: [SampleComment; 4] = [
    SampleComment {
        id: "comment1",
        artwork_id: "art1",
        user_id: "user2",
        text: "Amazing atmosphere! The neon lighting really brings this to life.",
        created: "2024-12-15T11:15:00Z",
    },
    SampleComment {
        id: "comment2",
        artwork_id: "art1",
        user_id: "user3",
        text: "Love the color palette choice here. Very moody and cyberpunk!",
        created: "2024-12-15T12:00:00Z",
    },
    SampleComment {
        id: "comment3",
        artwork_id: "art2",
        user_id: "user1",
        text: "Such clean pixel work! Reminds me of classic 90s adventure games.",
        created: "2024-12-14T16:30:00Z",
    },
    SampleComment {
        id: "comment4",
        artwork_id: "art3",
        user_id: "user1",
        text: "The flow and movement in this piece is incredible. Great work!",
        created: "2024-12-13T10:45:00Z",
    },
];

fn timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Bad sample timestamp {}: {}", raw, e)))
}

fn username_of(user_id: &str) -> &'static str {
    USERS
        .iter()
        .find(|u| u.id == user_id)
        .map_or("", |u| u.username)
}

/// Populate an empty store with sample users, artworks and comments.
/// Returns false without touching anything when users already exist.
pub async fn seed_sample_data(state: &AppState) -> AppResult<bool> {
    if !state.auth.all_users().await.is_empty() {
        info!("Users already present, skipping sample data");
        return Ok(false);
    }

    let password_hash = state.auth.hasher().hash_password(SAMPLE_PASSWORD)?;

    let mut users = Vec::with_capacity(USERS.len());
    for sample in &USERS {
        // stats mirror the seeded artworks
        let owned = ARTWORKS.iter().filter(|a| a.artist_id == sample.id);
        users.push(UserRecord {
            id: UserId::from(sample.id),
            username: sample.username.to_string(),
            email: sample.email.to_string(),
            password_hash: password_hash.clone(),
            bio: sample.bio.to_string(),
            avatar: sample.avatar.to_string(),
            joined_date: timestamp(sample.joined)?,
            stats: UserStats {
                artworks: owned.clone().count() as u64,
                likes: owned.map(|a| a.likes).sum(),
            },
        });
    }

    let mut artworks = Vec::with_capacity(ARTWORKS.len());
    for sample in &ARTWORKS {
        artworks.push(Artwork {
            id: ArtworkId::from(sample.id),
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            artist: username_of(sample.artist_id).to_string(),
            artist_id: UserId::from(sample.artist_id),
            category: sample.category,
            image_url: sample.image_url.to_string(),
            created_at: timestamp(sample.created)?,
            updated_at: None,
            likes: sample.likes,
            comments: sample.comments,
            tags: sample.tags.iter().map(|t| t.to_string()).collect(),
            views: 0,
        });
    }

    let mut comments = Vec::with_capacity(COMMENTS.len());
    for sample in &COMMENTS {
        comments.push(Comment {
            id: CommentId::from(sample.id),
            artwork_id: ArtworkId::from(sample.artwork_id),
            user_id: UserId::from(sample.user_id),
            username: username_of(sample.user_id).to_string(),
            text: sample.text.to_string(),
            created_at: timestamp(sample.created)?,
            updated_at: None,
            likes: 0,
            liked_by: Vec::new(),
            replies: Vec::new(),
            flags: Vec::new(),
        });
    }

    state.auth.import_users(users).await?;
    state
        .artworks
        .import_artworks(ArtworkExport {
            artworks,
            user_likes: BTreeMap::new(),
            export_date: Utc::now(),
        })
        .await?;
    state.comments.import_comments(comments).await?;

    info!(
        "Seeded {} users, {} artworks and {} comments",
        USERS.len(),
        ARTWORKS.len(),
        COMMENTS.len()
    );
    Ok(true)
}
