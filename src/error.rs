use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillError {
    #[error("Browser automation error: {0}")]
    Browser(String),

    #[error("Answer generation error: {0}")]
    Generation(String),

    #[error("Document download error: {0}")]
    Download(String),

    #[error("Candidate profile error: {0}")]
    Profile(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FillError>;
