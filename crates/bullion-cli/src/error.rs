use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] bullion_core::ValidationError),

    #[error(transparent)]
    Config(#[from] bullion_core::ConfigError),

    #[error("provider setup failed: {0}")]
    Provider(#[from] bullion_core::SourceError),

    #[error(transparent)]
    Core(#[from] bullion_core::CoreError),

    #[error(transparent)]
    Warehouse(#[from] bullion_core::WarehouseError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Core(bullion_core::CoreError::Validation(_)) => 2,
            Self::Provider(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Core(_) | Self::Warehouse(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
