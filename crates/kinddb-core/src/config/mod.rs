
use crate::{
    db::codec::DEFAULT_MAX_BLOB_BYTES,
    error::{ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse client config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid client config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(ErrorOrigin::Config, err.to_string())
    }
}

///
/// ClientConfig
///
/// Explicit per-client settings. Loaded from the `[client]` table of a
/// TOML document; every key is optional.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Give text-identified entities without an id a fresh ULID on persist.
    pub generate_text_ids: bool,

    /// Join records written per `put_batch` call; 0 writes them in one call.
    pub batch_size: usize,

    /// Upper bound on one fallback blob payload accepted on decode.
    pub max_blob_bytes: usize,

    /// Check join targets still exist when reading an association.
    pub verify_association_targets: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            generate_text_ids: true,
            batch_size: 0,
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
            verify_association_targets: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    client: ClientConfig,
}

impl ClientConfig {
    /// Parse a TOML document; a missing `[client]` table yields defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        file.client.validate()?;

        Ok(file.client)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&source)
    }

    /// Render as a TOML document with a `[client]` table.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        struct Out<'a> {
            client: &'a ClientConfig,
        }

        toml::to_string(&Out { client: self }).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_blob_bytes == 0 {
            return Err(ConfigError::Invalid("max_blob_bytes must be positive".into()));
        }

        Ok(())
    }
}
