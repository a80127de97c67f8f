// Auth - user records, registration/login, the session pointer and stat counters

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::core::strong_types::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::security::CredentialHasher;
use crate::infrastructure::storage::{
    load_collection, save_collection, KeyValueStore, CURRENT_USER_KEY, USERS_KEY,
};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 50;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern compiles"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Per-user running totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub artworks: u64,
    #[serde(default)]
    pub likes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Artworks,
    Likes,
}

impl UserStats {
    fn counter_mut(&mut self, kind: StatKind) -> &mut u64 {
        match kind {
            StatKind::Artworks => &mut self.artworks,
            StatKind::Likes => &mut self.likes,
        }
    }
}

/// Stored user, including the password digest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
    pub joined_date: DateTime<Utc>,
    #[serde(default)]
    pub stats: UserStats,
}

/// User as handed to callers; never carries the digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub avatar: String,
    pub joined_date: DateTime<Utc>,
    pub stats: UserStats,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            email: record.email.clone(),
            bio: record.bio.clone(),
            avatar: record.avatar.clone(),
            joined_date: record.joined_date,
            stats: record.stats.clone(),
        }
    }
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub total_users: usize,
    /// Users who joined in the last 30 days
    pub active_users: usize,
    pub top_artists: Vec<User>,
}

/// Full Unicode case-insensitive comparison for usernames and emails
pub(crate) fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub fn default_avatar(username: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=6366f1&color=fff&size=120",
        encode_uri_component(username)
    )
}

fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*'
            | b'\'' | b'(' | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

pub struct AuthManager {
    store: Arc<dyn KeyValueStore>,
    hasher: CredentialHasher,
    users: RwLock<Vec<UserRecord>>,
    current_user_id: RwLock<Option<UserId>>,
}

impl AuthManager {
    /// Load users and the session pointer from the store
    pub async fn load(store: Arc<dyn KeyValueStore>, hasher: CredentialHasher) -> AppResult<Self> {
        let users: Vec<UserRecord> = load_collection(store.as_ref(), USERS_KEY).await?;
        let current_user_id = store.get(CURRENT_USER_KEY).await?.map(UserId::from);
        debug!("Loaded {} users", users.len());

        Ok(Self {
            store,
            hasher,
            users: RwLock::new(users),
            current_user_id: RwLock::new(current_user_id),
        })
    }

    fn ensure_unique(users: &[UserRecord], username: &str, email: &str) -> AppResult<()> {
        if users.iter().any(|u| same_ignoring_case(&u.username, username)) {
            return Err(AppError::Validation("Username already exists".to_string()));
        }
        if users.iter().any(|u| same_ignoring_case(&u.email, email)) {
            return Err(AppError::Validation("Email already registered".to_string()));
        }
        Ok(())
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    async fn save_users(&self, users: &[UserRecord]) -> AppResult<()> {
        save_collection(self.store.as_ref(), USERS_KEY, users).await
    }

    async fn start_session(&self, user_id: &UserId) -> AppResult<()> {
        self.store.set(CURRENT_USER_KEY, user_id.as_str()).await?;
        *self.current_user_id.write().await = Some(user_id.clone());
        Ok(())
    }

    /// Register a new user and log them in
    #[instrument(skip(self, email, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
        if username.chars().count() < USERNAME_MIN_LEN {
            return Err(AppError::Validation(format!(
                "Username must be at least {} characters long",
                USERNAME_MIN_LEN
            )));
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters long",
                PASSWORD_MIN_LEN
            )));
        }

        Self::ensure_unique(&self.users.read().await, username, email)?;

        // CPU bound, runs on the blocking pool outside the lock
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        let mut users = self.users.write().await;
        // another registration may have landed while hashing
        Self::ensure_unique(&users, username, email)?;

        let record = UserRecord {
            id: UserId::generate(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            bio: String::new(),
            avatar: default_avatar(username),
            joined_date: Utc::now(),
            stats: UserStats::default(),
        };
        let user = User::from(&record);

        users.push(record);
        self.save_users(&users).await?;
        drop(users);

        self.start_session(&user.id).await?;
        info!("User {} registered as {}", user.username, user.id);
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let user = {
            let users = self.users.read().await;
            let record = users
                .iter()
                .find(|u| same_ignoring_case(&u.username, username))
                .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

            if !self.hasher.verify_password(password, &record.password_hash) {
                warn!("Failed login for {}", record.username);
                return Err(AppError::Unauthorized("Invalid username or password".to_string()));
            }
            User::from(record)
        };

        self.start_session(&user.id).await?;
        info!("User {} logged in", user.username);
        Ok(user)
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.store.remove(CURRENT_USER_KEY).await?;
        if let Some(id) = self.current_user_id.write().await.take() {
            info!("User {} logged out", id);
        }
        Ok(())
    }

    pub async fn current_user_id(&self) -> Option<UserId> {
        self.current_user_id.read().await.clone()
    }

    /// The logged-in user, if the session points at an existing record
    pub async fn current_user(&self) -> Option<User> {
        let id = self.current_user_id().await?;
        self.user_by_id(&id).await
    }

    pub async fn user_by_id(&self, user_id: &UserId) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| &u.id == user_id)
            .map(User::from)
    }

    pub async fn all_users(&self) -> Vec<User> {
        self.users.read().await.iter().map(User::from).collect()
    }

    /// Apply bio/avatar changes. `Ok(false)` when the user does not exist.
    pub async fn update_user(&self, user_id: &UserId, update: ProfileUpdate) -> AppResult<bool> {
        let mut users = self.users.write().await;
        let Some(record) = users.iter_mut().find(|u| &u.id == user_id) else {
            return Ok(false);
        };

        if let Some(bio) = update.bio {
            record.bio = bio;
        }
        if let Some(avatar) = update.avatar {
            record.avatar = avatar;
        }

        self.save_users(&users).await?;
        debug!("Updated profile of {}", user_id);
        Ok(true)
    }

    pub async fn increment_user_stats(&self, user_id: &UserId, kind: StatKind) -> AppResult<bool> {
        self.adjust_user_stats(user_id, kind, 1).await
    }

    /// Decrease a counter by one, never going below zero
    pub async fn decrement_user_stats(&self, user_id: &UserId, kind: StatKind) -> AppResult<bool> {
        self.adjust_user_stats(user_id, kind, -1).await
    }

    /// Shift a counter by `delta`, clamped at zero. `Ok(false)` for unknown users.
    pub async fn adjust_user_stats(
        &self,
        user_id: &UserId,
        kind: StatKind,
        delta: i64,
    ) -> AppResult<bool> {
        let mut users = self.users.write().await;
        let Some(record) = users.iter_mut().find(|u| &u.id == user_id) else {
            return Ok(false);
        };

        let counter = record.stats.counter_mut(kind);
        let updated = if delta.is_negative() {
            counter.saturating_sub(delta.unsigned_abs())
        } else {
            counter.saturating_add(delta as u64)
        };
        if updated != *counter {
            *counter = updated;
            self.save_users(&users).await?;
        }
        Ok(true)
    }

    pub async fn validate_username(&self, username: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if username.is_empty() {
            errors.push("Username is required".to_string());
            return errors;
        }

        let len = username.chars().count();
        if len < USERNAME_MIN_LEN {
            errors.push(format!("Username must be at least {} characters long", USERNAME_MIN_LEN));
        }
        if len > USERNAME_MAX_LEN {
            errors.push(format!("Username must be less than {} characters", USERNAME_MAX_LEN));
        }
        if !USERNAME_PATTERN.is_match(username) {
            errors.push("Username can only contain letters, numbers, and underscores".to_string());
        }
        if self
            .users
            .read()
            .await
            .iter()
            .any(|u| same_ignoring_case(&u.username, username))
        {
            errors.push("Username already exists".to_string());
        }

        errors
    }

    pub async fn validate_email(&self, email: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if email.is_empty() {
            errors.push("Email is required".to_string());
            return errors;
        }

        if !EMAIL_PATTERN.is_match(email) {
            errors.push("Please enter a valid email address".to_string());
        }
        if self
            .users
            .read()
            .await
            .iter()
            .any(|u| same_ignoring_case(&u.email, email))
        {
            errors.push("Email already registered".to_string());
        }

        errors
    }

    pub fn validate_password(password: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if password.is_empty() {
            errors.push("Password is required".to_string());
            return errors;
        }

        let len = password.chars().count();
        if len < PASSWORD_MIN_LEN {
            errors.push(format!("Password must be at least {} characters long", PASSWORD_MIN_LEN));
        }
        if len > PASSWORD_MAX_LEN {
            errors.push(format!("Password must be less than {} characters", PASSWORD_MAX_LEN));
        }

        errors
    }

    pub async fn community_stats(&self) -> CommunityStats {
        let users = self.users.read().await;
        let cutoff = Utc::now() - Duration::days(30);

        let mut ranked: Vec<&UserRecord> = users.iter().collect();
        ranked.sort_by(|a, b| b.stats.artworks.cmp(&a.stats.artworks));

        CommunityStats {
            total_users: users.len(),
            active_users: users.iter().filter(|u| u.joined_date > cutoff).count(),
            top_artists: ranked.into_iter().take(5).map(User::from).collect(),
        }
    }

    /// Replace the whole user collection (sample data, imports)
    pub async fn import_users(&self, records: Vec<UserRecord>) -> AppResult<()> {
        let mut users = self.users.write().await;
        *users = records;
        self.save_users(&users).await?;
        info!("Imported {} users", users.len());
        Ok(())
    }

    pub async fn clear_all_users(&self) -> AppResult<()> {
        self.import_users(Vec::new()).await?;
        self.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::storage::MemoryStore;

    async fn manager_with_store() -> (AuthManager, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let hasher = CredentialHasher::new(&Config::in_memory().security).unwrap();
        let auth = AuthManager::load(store.clone(), hasher).await.unwrap();
        (auth, store)
    }

    #[tokio::test]
    async fn test_register_starts_session() {
        let (auth, store) = manager_with_store().await;
        let user = auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        assert_eq!(auth.current_user().await, Some(user.clone()));
        assert_eq!(user.stats, UserStats::default());
        assert!(user.avatar.contains("name=ArtFan1"));
        assert_eq!(
            store.get(CURRENT_USER_KEY).await.unwrap().as_deref(),
            Some(user.id.as_str())
        );

        let raw = store.get(USERS_KEY).await.unwrap().unwrap();
        assert!(raw.contains("$argon2id$"));
        assert!(!raw.contains("secret1"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_case_insensitively() {
        let (auth, _) = manager_with_store().await;
        auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        let err = auth.register("artfan1", "other@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.message(), "Username already exists");

        let err = auth.register("Another", "FAN@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.message(), "Email already registered");
    }

    #[tokio::test]
    async fn test_uniqueness_folds_non_ascii_case() {
        let (auth, _) = manager_with_store().await;
        auth.register("Émile", "zoë@example.com", "secret1").await.unwrap();

        let err = auth.register("émile", "other@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.message(), "Username already exists");

        let err = auth.register("Zoe", "ZOË@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.message(), "Email already registered");

        assert_eq!(auth.validate_email("ZOË@EXAMPLE.COM").await, vec!["Email already registered".to_string()]);
        assert!(auth.login("ÉMILE", "secret1").await.is_ok());
        assert_eq!(auth.all_users().await.len(), 1);
    }

    #[test]
    fn test_same_ignoring_case() {
        assert!(same_ignoring_case("Émile", "éMILE"));
        assert!(same_ignoring_case("ArtFan1", "artfan1"));
        assert!(!same_ignoring_case("Emile", "Émile"));
    }

    #[tokio::test]
    async fn test_register_validation_messages() {
        let (auth, _) = manager_with_store().await;

        let cases = [
            ("", "a@b.co", "secret1", "All fields are required"),
            ("ab", "a@b.co", "secret1", "Username must be at least 3 characters long"),
            ("abc", "a@b.co", "12345", "Password must be at least 6 characters long"),
        ];
        for (username, email, password, expected) in cases {
            let err = auth.register(username, email, password).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(err.message(), expected);
        }
        assert!(auth.all_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (auth, store) = manager_with_store().await;
        let user = auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();
        auth.logout().await.unwrap();
        assert_eq!(auth.current_user().await, None);
        assert_eq!(store.get(CURRENT_USER_KEY).await.unwrap(), None);

        let err = auth.login("ArtFan1", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = auth.login("nobody", "secret1").await.unwrap_err();
        assert_eq!(err.message(), "Invalid username or password");

        let logged_in = auth.login("ARTFAN1", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.current_user_id().await, Some(user.id));
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let (auth, store) = manager_with_store().await;
        let user = auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        let hasher = CredentialHasher::new(&Config::in_memory().security).unwrap();
        let reloaded = AuthManager::load(store, hasher).await.unwrap();
        assert_eq!(reloaded.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn test_stats_clamp_at_zero() {
        let (auth, _) = manager_with_store().await;
        let user = auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        assert!(auth.decrement_user_stats(&user.id, StatKind::Likes).await.unwrap());
        assert!(auth.increment_user_stats(&user.id, StatKind::Artworks).await.unwrap());
        assert!(auth.increment_user_stats(&user.id, StatKind::Artworks).await.unwrap());
        assert!(auth.adjust_user_stats(&user.id, StatKind::Artworks, -5).await.unwrap());

        let stats = auth.user_by_id(&user.id).await.unwrap().stats;
        assert_eq!(stats, UserStats { artworks: 0, likes: 0 });

        let missing = UserId::from("user_missing");
        assert!(!auth.increment_user_stats(&missing, StatKind::Likes).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_only_touches_profile_fields() {
        let (auth, _) = manager_with_store().await;
        let user = auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        let update = ProfileUpdate {
            bio: Some("Watercolours mostly".to_string()),
            avatar: None,
        };
        assert!(auth.update_user(&user.id, update).await.unwrap());

        let updated = auth.user_by_id(&user.id).await.unwrap();
        assert_eq!(updated.bio, "Watercolours mostly");
        assert_eq!(updated.avatar, user.avatar);
        assert!(!auth
            .update_user(&UserId::from("user_missing"), ProfileUpdate::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_form_validators() {
        let (auth, _) = manager_with_store().await;
        auth.register("ArtFan1", "fan@example.com", "secret1").await.unwrap();

        assert!(auth.validate_username("new_user").await.is_empty());
        assert_eq!(
            auth.validate_username("bad name!").await,
            vec!["Username can only contain letters, numbers, and underscores".to_string()]
        );
        assert_eq!(auth.validate_username("artfan1").await, vec!["Username already exists".to_string()]);
        assert_eq!(auth.validate_username("").await, vec!["Username is required".to_string()]);

        assert!(auth.validate_email("new@example.com").await.is_empty());
        assert_eq!(
            auth.validate_email("not-an-email").await,
            vec!["Please enter a valid email address".to_string()]
        );

        assert!(AuthManager::validate_password("secret1").is_empty());
        assert_eq!(AuthManager::validate_password(&"x".repeat(51)).len(), 1);
    }

    #[tokio::test]
    async fn test_community_stats_and_clear() {
        let (auth, _) = manager_with_store().await;
        let a = auth.register("Painter", "p@example.com", "secret1").await.unwrap();
        auth.register("Sketcher", "s@example.com", "secret1").await.unwrap();
        auth.increment_user_stats(&a.id, StatKind::Artworks).await.unwrap();

        let stats = auth.community_stats().await;
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.top_artists[0].id, a.id);

        auth.clear_all_users().await.unwrap();
        assert!(auth.all_users().await.is_empty());
        assert_eq!(auth.current_user().await, None);
    }

    #[test]
    fn test_default_avatar_encodes_username() {
        assert_eq!(
            default_avatar("Ana María"),
            "https://ui-avatars.com/api/?name=Ana%20Mar%C3%ADa&background=6366f1&color=fff&size=120"
        );
    }
}
