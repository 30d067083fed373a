#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid settings for strategy '{strategy}': {message}")]
    InvalidOptions { strategy: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("optimization cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
