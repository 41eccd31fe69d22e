use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DEFAULT_CACHE_SIZE, cache::clamp_capacity};

/// Settings for a [`NotationService`](crate::NotationService), usually read from a TOML file like:
///
/// ```toml
/// [cache]
/// capacity = 25
/// ```
///
/// Missing tables and keys fall back to their defaults.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HelmConfig {
    pub cache: CacheConfig,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_SIZE,
        }
    }
}

impl CacheConfig {
    /// The capacity a cache will actually be given, after clamping it into the supported range
    #[must_use]
    pub fn effective_capacity(&self) -> usize {
        clamp_capacity(self.capacity)
    }
}

impl HelmConfig {
    /// # Errors
    ///
    /// Fails if `toml` isn't valid TOML or doesn't describe a configuration.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// # Errors
    ///
    /// Fails if the file at `path` can't be read, or if [`HelmConfig::from_toml()`] rejects its contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml(&toml)?;
        log::debug!("loaded {config:?} from {path:?}");
        Ok(config)
    }
}
