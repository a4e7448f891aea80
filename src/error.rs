use std::net::SocketAddr;

use axum::http::StatusCode;

/// Transport-level outcome of a call. Numeric values follow the gRPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    InvalidArgument,
    Internal,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 0,
            Status::InvalidArgument => 3,
            Status::Internal => 13,
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            Status::Ok => StatusCode::OK,
            Status::InvalidArgument => StatusCode::BAD_REQUEST,
            Status::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to fetch article: {0}")]
    Fetch(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Address {0} is already in use")]
    BindConflict(SocketAddr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Status reported to the caller. Error text never leaves the server log.
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) => Status::InvalidArgument,
            _ => Status::Internal,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
