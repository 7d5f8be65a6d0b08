use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ProvisionError {
    #[error("failed to set up HTTP client: {0}")]
    ClientSetup(String),

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid archive: {0}")]
    ArchiveFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    HttpStatus,
    Filesystem,
    ArchiveFormat,
}

impl ProvisionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProvisionError::ClientSetup(_) | ProvisionError::Network { .. } => FailureKind::Network,
            ProvisionError::HttpStatus { .. } => FailureKind::HttpStatus,
            ProvisionError::Filesystem(_) => FailureKind::Filesystem,
            ProvisionError::ArchiveFormat(_) => FailureKind::ArchiveFormat,
        }
    }
}
