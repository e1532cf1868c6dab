use thiserror::Error;

/// Errors surfaced by the garden library.
///
/// Gameplay conditions such as running out of seeds are not errors; they are
/// reported as [`crate::garden::Rejection`] values and logged.
#[derive(Debug, Error)]
pub enum GardenError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
