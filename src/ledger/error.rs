use thiserror::Error;

use crate::models::{IllegalTransition, TicketStatus};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ticket {0} not found")]
    NotFound(i64),

    #[error("Ticket {number} is {status}, not Serving")]
    InvalidState { number: i64, status: TicketStatus },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<IllegalTransition> for LedgerError {
    fn from(e: IllegalTransition) -> Self {
        LedgerError::InvalidState {
            number: e.number,
            status: e.from,
        }
    }
}
