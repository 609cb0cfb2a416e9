//! Configuration loading and validation.
//!
//! The proxy reads its configuration exactly once at startup. The
//! resulting [`Config`](model::Config) is turned into an immutable route
//! table and never changes for the lifetime of the process. Submodules
//! provide the data model, validation, and file-format sources.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ProxyError;
use model::Config;

/// File names probed in the working directory when no `--config` is given.
pub const CANDIDATE_FILES: &[&str] = &[
    "pelo-proxy.yaml",
    "pelo-proxy.yml",
    "pelo-proxy.json",
    "pelo-proxy.toml",
];

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    BuiltIn,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => f.write_str("built-in defaults"),
        }
    }
}

/// Load the explicit config file, or auto-detect one, or fall back to the
/// built-in defaults. The returned config has passed validation.
pub async fn resolve(explicit: Option<&Path>) -> Result<(Config, ConfigOrigin), ProxyError> {
    if let Some(path) = explicit {
        let config = sources::load_file(path).await?;
        return Ok((config, ConfigOrigin::File(path.to_path_buf())));
    }

    for name in CANDIDATE_FILES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            let config = sources::load_file(&path).await?;
            return Ok((config, ConfigOrigin::File(path)));
        }
    }

    let config = Config::default();
    if let Err(errors) = validation::validate(&config) {
        return Err(ProxyError::ConfigValidation { errors });
    }
    Ok((config, ConfigOrigin::BuiltIn))
}
