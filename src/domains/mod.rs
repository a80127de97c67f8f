// Domain managers - each owns one persisted collection and receives its collaborators explicitly

pub mod auth;
pub mod artwork;
pub mod comments;
pub mod profile;

pub use auth::{AuthManager, ProfileUpdate, StatKind, User, UserRecord, UserStats};
pub use artwork::{Artwork, ArtworkManager, ArtworkQuery, ArtworkUpdate, NewArtwork, SortOrder};
pub use comments::{Comment, CommentManager, Reply};
pub use profile::{Achievement, ProfileService, ProfileStats};

use crate::core::strong_types::UserId;

/// Flip `user_id`'s membership in a like set and move the matching counter with it.
/// Returns true when the user now likes the item.
pub(crate) fn toggle_like_entry(liked_by: &mut Vec<UserId>, likes: &mut u64, user_id: &UserId) -> bool {
    if let Some(pos) = liked_by.iter().position(|id| id == user_id) {
        liked_by.remove(pos);
        *likes = likes.saturating_sub(1);
        false
    } else {
        liked_by.push(user_id.clone());
        *likes += 1;
        true
    }
}

/// Case-insensitive substring match
pub(crate) fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
