//! Configuration file loading for the CLI.
//!
//! The configuration is searched in a fixed list of locations. The first
//! file that can be read wins; only an explicitly requested file is required
//! to exist.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use palimpsest::{OverlayError, config::AppConfig};

/// Project-relative configuration path, checked before the platform directory.
const LOCAL_CONFIG: &str = "palimpsest/config.toml";

/// Configuration-related errors for the CLI.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

impl From<ConfigError> for OverlayError {
    fn from(err: ConfigError) -> Self {
        let kind = match &err {
            ConfigError::MissingFile(_) => io::ErrorKind::NotFound,
            ConfigError::Read { source, .. } => source.kind(),
            ConfigError::Parse { .. } => io::ErrorKind::InvalidData,
        };
        OverlayError::Io(io::Error::new(kind, err.to_string()))
    }
}

/// Where a configuration candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    Explicit,
    Local,
    System,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "explicit",
            Self::Local => "local",
            Self::System => "system",
        })
    }
}

/// Finds and loads the CLI configuration.
///
/// Search order:
/// 1. `explicit_path`, when given. It must exist.
/// 2. `palimpsest/config.toml` relative to the working directory.
/// 3. `config.toml` in the platform configuration directory.
/// 4. The default configuration.
///
/// # Errors
///
/// Returns an error if the explicit file is missing, or if a file that was
/// found cannot be read or parsed.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, OverlayError> {
    // An explicit path never falls through to the other locations
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        return match read_config(path, ConfigSource::Explicit)? {
            Some(config) => Ok(config),
            None => Err(ConfigError::MissingFile(path.to_path_buf()).into()),
        };
    }

    for (path, source) in candidates() {
        if let Some(config) = read_config(&path, source)? {
            return Ok(config);
        }
        debug!(path = path.display().to_string(), source:%; "Configuration file not found");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Implicit locations, in search order.
fn candidates() -> Vec<(PathBuf, ConfigSource)> {
    let mut candidates = vec![(PathBuf::from(LOCAL_CONFIG), ConfigSource::Local)];

    match ProjectDirs::from("com", "palimpsest", "palimpsest") {
        Some(dirs) => candidates.push((dirs.config_dir().join("config.toml"), ConfigSource::System)),
        None => debug!("Could not determine platform-specific config directory"),
    }

    candidates
}

/// Reads and parses one configuration file.
///
/// Returns `Ok(None)` when the file does not exist.
fn read_config(path: &Path, source: ConfigSource) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    info!(path = path.display().to_string(), source:%; "Loading configuration");

    toml::from_str(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}
