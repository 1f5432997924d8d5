//! Error types for slashlock

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for slashlock
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Format errors
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("File is not locked")]
    NotLocked,

    // Crypto errors
    #[error("Authentication failed - wrong passphrase or corrupted container")]
    AuthenticationFailure,

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    // Compression errors
    #[error("Compression error: {0}")]
    Compression(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit code for the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AuthenticationFailure => 2,
            Error::NotLocked => 3,
            Error::InvalidInput(_) | Error::InvalidConfig(_) | Error::Config(_) => 64,
            Error::Io(_) => 74,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}
