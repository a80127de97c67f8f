// Core infrastructure modules
pub mod storage;               // Key/value store trait and in-memory backend
pub mod file_storage;          // JSON-file backend
pub mod id_generator;          // Prefixed time-ordered ids
pub mod security;              // Credential hashing
pub mod image_upload;          // Local image files to data URIs

// Re-export core infrastructure components
pub use storage::{load_collection, save_collection, KeyValueStore, MemoryStore};
pub use file_storage::FileStore;
pub use id_generator::generate_id;
pub use security::CredentialHasher;
pub use image_upload::{read_image_as_data_uri, validate_image_file};
