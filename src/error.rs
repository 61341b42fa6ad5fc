//! Crate-wide error type.
//!
//! Every failure carries the process exit code the `kids` binary reports:
//!
//! - `2`: configuration or I/O problems (bad flags, unreadable files)
//! - `3`: input data problems (empty sweep, nothing left to process)
//! - `4`: numerical or fitting failures

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Input(String),
    #[error("numerical error: {0}")]
    Numerical(String),
    #[error("fit failed: {0}")]
    Fit(String),
    #[error("{0}")]
    Io(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical(message.into())
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::Fit(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Io(_) => 2,
            Self::Input(_) => 3,
            Self::Numerical(_) | Self::Fit(_) => 4,
        }
    }
}
