use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::infrastructure::image_upload::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

/// Argon2 cost parameters used for password digests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hash_memory_kib: 19_456,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env::var("ARTSHARE_STORAGE")
            .unwrap_or_else(|_| "file".to_string())
            .to_lowercase()
            .as_str()
        {
            "file" => StorageBackend::File,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("Unknown storage backend '{}', expected 'file' or 'memory'", other),
        };

        let defaults = SecurityConfig::default();

        Ok(Self {
            storage: StorageConfig {
                backend,
                data_dir: env::var("ARTSHARE_DATA_DIR")
                    .unwrap_or_else(|_| "data/artshare".to_string())
                    .into(),
            },
            security: SecurityConfig {
                hash_memory_kib: parse_var("ARTSHARE_HASH_MEMORY_KIB", defaults.hash_memory_kib)?,
                hash_iterations: parse_var("ARTSHARE_HASH_ITERATIONS", defaults.hash_iterations)?,
                hash_parallelism: parse_var("ARTSHARE_HASH_PARALLELISM", defaults.hash_parallelism)?,
            },
            uploads: UploadConfig {
                max_bytes: parse_var("ARTSHARE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            seed_sample_data: parse_var("ARTSHARE_SEED_SAMPLE_DATA", false)?,
        })
    }

    /// In-memory configuration with cheap hashing, for tests and demos
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                data_dir: PathBuf::new(),
            },
            security: SecurityConfig {
                hash_memory_kib: 1024,
                hash_iterations: 1,
                hash_parallelism: 1,
            },
            uploads: UploadConfig::default(),
            seed_sample_data: false,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
