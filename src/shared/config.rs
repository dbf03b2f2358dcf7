use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::shared::errors::AppError;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a TOML document from `path` into any config shape
    pub fn from_file<T, P>(path: P) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse a TOML document
    pub fn parse<T: DeserializeOwned>(content: &str) -> Result<T, AppError> {
        toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config: {}", e)))
    }
}
