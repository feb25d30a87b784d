use thiserror::Error;

/// Errors surfaced by the digest core.
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("{0}")]
    UserInput(#[from] UserInputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A violated input constraint. The `Display` text is the context handed to the error voice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("Number must be positive")]
    NotPositive,

    #[error("User is too greedy, must be less than 500")]
    TooGreedy,

    #[error("Invalid number format")]
    InvalidNumber,

    #[error("Wrong request, no question provided")]
    EmptyQuestion,

    #[error("No previous messages found")]
    NoPreviousMessages,

    /// Non-admin tried a restricted command; carries what was attempted (e.g. "model change").
    #[error("Unauthorized {0} attempt")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
