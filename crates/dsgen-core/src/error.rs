use thiserror::Error;

/// Core error type shared across dsgen crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A table name did not match any catalog entry.
    #[error("unknown table: {0}")]
    UnknownTable(String),
    /// The session configuration violates its invariants.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
}

/// Convenience alias for results returned by dsgen crates.
pub type Result<T> = std::result::Result<T, CoreError>;
