pub mod artifacts;
pub mod clean;
pub mod config;
pub mod models;
pub mod overpass;
pub mod parse;
pub mod pipeline;

pub use models::*;

/// Common result type used throughout the library
pub type Result<T, E = HarvesterError> = std::result::Result<T, E>;

/// Library-wide error types
#[derive(thiserror::Error, Debug)]
pub enum HarvesterError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
