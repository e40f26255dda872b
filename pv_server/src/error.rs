//! Error types for the store, the record service, and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::record::ParseStatusError;

/// Failures of the persistence backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data file: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Record conflicts with an existing entry")]
    Conflict,

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl From<ParseStatusError> for StoreError {
    fn from(e: ParseStatusError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Outcomes of record and auth operations that are not success.
#[derive(Error, Debug)]
pub enum PvError {
    #[error("An entry dated {date} for caidat {caidat} already exists.")]
    Duplicate { date: String, caidat: String },

    #[error("Entry {0} not found.")]
    NotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid username or password.")]
    Auth,

    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("Session failure: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl PvError {
    /// Whether the error is shown to the user as a notice rather than failing the request.
    pub fn is_notice(&self) -> bool {
        !matches!(self, PvError::Store(_) | PvError::Session(_))
    }
}

impl From<ParseStatusError> for PvError {
    fn from(e: ParseStatusError) -> Self {
        PvError::InvalidInput(format!("Invalid status: {}", e.0))
    }
}

impl IntoResponse for PvError {
    fn into_response(self) -> Response {
        let status = match self {
            PvError::Duplicate { .. } => StatusCode::CONFLICT,
            PvError::NotFound(_) => StatusCode::NOT_FOUND,
            PvError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PvError::Auth => StatusCode::UNAUTHORIZED,
            PvError::Store(ref e) => {
                tracing::error!("Store error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PvError::Session(ref e) => {
                tracing::error!("Session error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
