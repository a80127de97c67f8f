// Strong Types - newtype identifiers and closed enums shared by every domain
// Keeps user, artwork and comment ids from being swapped by accident

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::infrastructure::id_generator::generate_id;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for freshly generated ids
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new unique id
            pub fn generate() -> Self {
                Self(generate_id(Self::PREFIX))
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a registered user
    UserId,
    "user"
);
string_id!(
    /// Identifier of a posted artwork
    ArtworkId,
    "artwork"
);
string_id!(
    /// Identifier of a comment or a reply
    CommentId,
    "comment"
);

/// Artwork category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Category {
    #[serde(rename = "digital")]
    Digital,
    #[serde(rename = "traditional")]
    Traditional,
    #[serde(rename = "photography")]
    Photography,
    #[serde(rename = "3d")]
    ThreeD,
    #[default]
    #[serde(rename = "other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Digital,
        Category::Traditional,
        Category::Photography,
        Category::ThreeD,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Digital => "digital",
            Category::Traditional => "traditional",
            Category::Photography => "photography",
            Category::ThreeD => "3d",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::Validation("Invalid category selected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_prefix() {
        let user = UserId::generate();
        let artwork = ArtworkId::generate();
        assert!(user.as_str().starts_with("user_"));
        assert!(artwork.as_str().starts_with("artwork_"));
        assert_ne!(UserId::generate(), user);
        assert!(!user.is_empty());
        assert!(UserId::default().is_empty());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = CommentId::from("comment1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"comment1\"");
    }

    #[test]
    fn test_category_round_trips_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(serde_json::to_string(&Category::ThreeD).unwrap(), "\"3d\"");
        assert!("sculpture".parse::<Category>().is_err());
    }
}
