use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid id: {0}")]
    InvalidObjectId(String),

    #[error("Unknown emotion label: {0}")]
    UnknownEmotion(String),
}
