use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up a maze session.
#[derive(Error, Debug)]
pub enum MazeError {
    #[error("maze dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("maze of {width}x{height} cells is too large to index")]
    TooLarge { width: i32, height: i32 },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type MazeResult<T> = Result<T, MazeError>;
