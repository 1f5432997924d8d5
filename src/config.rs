//! Configuration management for slashlock

use crate::compression::Compression;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default padding chunk size: 4 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Encryption configuration
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Lock configuration
    #[serde(default)]
    pub lock: LockConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_iterations: u32,

    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

/// Lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Minimum body size; smaller bodies are padded up to it
    pub chunk_size: usize,

    /// Compression applied to new locks
    pub compression: Compression,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        EncryptionConfig {
            argon2_memory_kib: 65536, // 64 MiB
            argon2_iterations: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        LockConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: Compression::Gzip,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or JSON), with environment variable overrides
    ///
    /// A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let mut config: Config = if path_ref.exists() {
            let content = std::fs::read_to_string(path_ref).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            if is_yaml(path_ref) {
                serde_yaml::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to parse YAML config: {}", e))
                })?
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to parse JSON config: {}", e))
                })?
            }
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(chunk_size) = std::env::var("SLASHLOCK_CHUNK_SIZE") {
            self.lock.chunk_size = chunk_size.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("Invalid SLASHLOCK_CHUNK_SIZE: {}", chunk_size))
            })?;
        }

        if let Ok(compression) = std::env::var("SLASHLOCK_COMPRESSION") {
            self.lock.compression = compression.parse().map_err(|_| {
                Error::InvalidConfig(format!("Invalid SLASHLOCK_COMPRESSION: {}", compression))
            })?;
        }

        if let Ok(level) = std::env::var("SLASHLOCK_LOG_LEVEL") {
            let level = level.trim().to_string();
            if !level.is_empty() {
                self.logging.level = level;
            }
        }

        Ok(())
    }

    /// Save configuration to a file (format determined by extension)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        let content = if is_yaml(path_ref) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path_ref, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.lock.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        if self.encryption.argon2_memory_kib == 0
            || self.encryption.argon2_iterations == 0
            || self.encryption.argon2_parallelism == 0
        {
            return Err(Error::InvalidConfig(
                "Argon2 costs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slashlock")
            .join("config.json")
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lock.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.lock.compression, Compression::Gzip);
    }

    #[test]
    fn test_zero_chunk_size_invalid() {
        let mut config = Config::default();
        config.lock.chunk_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_argon2_cost_invalid() {
        let mut config = Config::default();
        config.encryption.argon2_iterations = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_save_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.lock.chunk_size = 512;
        config.lock.compression = Compression::Lz4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.lock.compression, Compression::Lz4);
        assert_eq!(loaded.encryption.argon2_iterations, 3);
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "lock:\n  chunk_size: 2048\n  compression: none\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.lock.compression, Compression::None);
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded.encryption.argon2_memory_kib, 65536);
    }

    #[test]
    fn test_bad_json_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }
}
