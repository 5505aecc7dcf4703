use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        AppError::InvalidResponse(msg.into())
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
