// ArtShare Store - data layer for a small art-sharing community

// Core types and primitives
pub mod core;

// Infrastructure - storage backends, hashing, uploads
pub mod infrastructure;

// Domain-Driven Organization - one manager per persisted collection
pub mod domains;

// Wiring and configuration
pub mod app_state;
pub mod config;

// Common utilities
pub mod error;
pub mod data_seeder;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
