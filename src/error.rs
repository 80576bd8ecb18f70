use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while generating artifacts.
///
/// None of these are retried. Any error surfacing from artifact generation
/// aborts the whole run.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed run configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No provider file (or registered provider) exists under the given name.
    #[error("Provider {name} not found in {}", dir.display())]
    ProviderNotFound { name: String, dir: PathBuf },

    /// A provider failed while loading or while listing its nodes.
    #[error("Error in provider {}: {message}", path.display())]
    ProviderExecution { path: PathBuf, message: String },

    /// Template engine failure, message kept as reported by the engine.
    #[error("{0}")]
    Render(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
