use std::io;
use std::path::PathBuf;

/// Failures that abort a run. Source problems are diagnostics, not errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read config '{}': {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot create directory '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}
