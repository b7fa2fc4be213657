//! Typed errors for configuration loading and pagination.

use std::path::PathBuf;

use thiserror::Error;

/// Raised while building the site configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("invalid `{field}`: {message}")]
    Field {
        field: &'static str,
        message: String,
    },

    #[error("invalid social link #{index} (`{name}`): {message}")]
    Social {
        index: usize,
        name: String,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field {
            field,
            message: message.into(),
        }
    }
}

/// A page index past the last page of a listing.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("page index {index} out of range ({total} pages)")]
pub struct IndexError {
    pub index: usize,
    pub total: usize,
}
