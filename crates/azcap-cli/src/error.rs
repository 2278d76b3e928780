use thiserror::Error;

use azcap_core::{CapacityError, ConfigError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            // Fatal capacity errors need a config/auth fix (exit 2);
            // transient exhaustion is an upstream problem (exit 3).
            Self::Capacity(error) if error.is_fatal() => 2,
            Self::Capacity(_) => 3,
            Self::Command(_) => 2,
            Self::Io(_) => 10,
        }
    }
}
