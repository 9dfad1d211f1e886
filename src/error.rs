use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LampError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPIO {pin} not usable at {}: {source}", path.display())]
    Output {
        pin: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task join error: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, LampError>;
