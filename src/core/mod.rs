// Core types shared by every domain

pub mod strong_types;

// Re-export commonly used types
pub use strong_types::{ArtworkId, Category, CommentId, UserId};
