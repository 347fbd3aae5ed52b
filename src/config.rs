use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::Level;

use crate::outside::{FFMPEG, FFPROBE};

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "amqclip.toml";

/// Prefix of the environment variables overriding the configuration file
pub const ENV_PREFIX: &str = "AMQCLIP";

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of shows processed at the same time.
    /// Defaults to the available parallelism.
    pub workers: Option<usize>,
    /// Name or path of the ffmpeg program
    pub ffmpeg: String,
    /// Name or path of the ffprobe program
    pub ffprobe: String,
    pub log_level: String,
    /// Gatherer used when `add` is not given one
    pub gatherer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: None,
            ffmpeg: FFMPEG.to_owned(),
            ffprobe: FFPROBE.to_owned(),
            log_level: "info".to_owned(),
            gatherer: "ANN".to_owned(),
        }
    }
}

impl Settings {
    /// Read the settings from the given TOML file, or from the optional
    /// default one, then from the `AMQCLIP_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn level(&self) -> Result<Level, String> {
        self.log_level
            .parse()
            .map_err(|_| format!("Unknown log level '{}'", self.log_level))
    }
}
