//! Configuration and startup error types

use thiserror::Error;

/// Errors raised while assembling process configuration.
///
/// Any of these is fatal: the relay refuses to bind a listener until the
/// configuration loads cleanly.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
