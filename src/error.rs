use thiserror::Error;

use crate::session::PipelineState;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported media type `{0}`, expected application/pdf")]
    InvalidType(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("could not re-save the document")]
    Transform(#[source] anyhow::Error),
    #[error("no compressed file available")]
    NoResultAvailable,
    #[error("intake rejected while the pipeline is {0:?}")]
    Busy(PipelineState),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Coarse classification shown to the user alongside a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidType,
    TooLarge,
    Transform,
    NoResultAvailable,
    Busy,
    Unexpected,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidType(_) => ErrorKind::InvalidType,
            PipelineError::TooLarge { .. } => ErrorKind::TooLarge,
            PipelineError::Transform(_) => ErrorKind::Transform,
            PipelineError::NoResultAvailable => ErrorKind::NoResultAvailable,
            PipelineError::Busy(_) => ErrorKind::Busy,
            PipelineError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Message safe to put in front of the user. Causes stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidType(_) => "Please select a valid PDF file.".to_string(),
            PipelineError::TooLarge { limit, .. } => format!(
                "The file is too large. Maximum size: {}.",
                crate::delivery::format_file_size(*limit)
            ),
            PipelineError::Transform(_) => {
                "An error occurred while compressing. Please try again.".to_string()
            }
            PipelineError::NoResultAvailable => "No compressed file available.".to_string(),
            PipelineError::Busy(_) => "A file is already being processed. Please wait.".to_string(),
            PipelineError::Unexpected(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}
