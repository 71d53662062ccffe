use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::ledger::LedgerError;
use crate::models::TicketStatus;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Ticket {0} not found")]
    NotFound(i64),

    #[error("Ticket {number} is {status}, not Serving")]
    InvalidState { number: i64, status: TicketStatus },

    #[error("Persistence error")]
    PersistenceError(#[from] StoreError),
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(number) => AppError::NotFound(number),
            LedgerError::InvalidState { number, status } => {
                AppError::InvalidState { number, status }
            }
            LedgerError::Persistence(e) => AppError::PersistenceError(e),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState { .. } => "INVALID_STATE",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::PersistenceError(e) => {
                error!(error = ?e, "Persistence error");
            }
            other => {
                warn!(code = other.code(), message = %other, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        let (public_message, details) = match &self {
            AppError::ValidationError(msg) => (msg.clone(), None),
            AppError::NotFound(_) => ("Ticket not found".to_string(), None),
            AppError::InvalidState { number, status } => (
                "Ticket is not in Serving state".to_string(),
                Some(json!({ "number": number, "status": status })),
            ),
            // Never leak store internals to clients
            AppError::PersistenceError(_) => ("A persistence error occurred".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}
