//! The ticket ledger: numbering, lifecycle transitions and queries.
//!
//! ```text
//! Waiting --(call_next)--> Serving --(complete)--> Done
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::models::{Ticket, TicketStatus};
use crate::store::{StoreError, TicketStore};

pub mod error;
pub mod issuer;
pub mod retry;

pub use error::LedgerError;
pub use issuer::Issuer;
pub use retry::RetryPolicy;

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn TicketStore>,
    issuer: Issuer,
}

impl Ledger {
    /// Creates a ledger over `store`. Must be called from within a Tokio runtime.
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<dyn TicketStore>, policy: RetryPolicy) -> Self {
        let issuer = Issuer::spawn(Arc::clone(&store), policy);
        Self { store, issuer }
    }

    /// Issues the next ticket number in `Waiting`.
    pub async fn issue_ticket(&self) -> Result<Ticket, LedgerError> {
        let ticket = self.issuer.issue().await?;
        info!(number = ticket.number, id = ticket.id, "Ticket issued");
        Ok(ticket)
    }

    /// Moves the lowest-numbered `Waiting` ticket to `Serving`.
    ///
    /// Returns `Ok(None)` when nobody is waiting.
    pub async fn call_next(&self) -> Result<Option<Ticket>, LedgerError> {
        loop {
            let head = self
                .store
                .find_by_status(TicketStatus::Waiting)
                .await?
                .into_iter()
                .next();

            let Some(head) = head else {
                debug!("No waiting tickets");
                return Ok(None);
            };

            let serving = head.advance(TicketStatus::Serving, Utc::now())?;
            match self.store.update(&serving, TicketStatus::Waiting).await {
                Ok(ticket) => {
                    info!(number = ticket.number, "Ticket called: Waiting -> Serving");
                    return Ok(Some(ticket));
                }
                // Someone else called this ticket first; try the new head.
                Err(StoreError::Conflict(reason)) => {
                    debug!(number = head.number, %reason, "Lost race calling ticket");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Moves ticket `number` from `Serving` to `Done`.
    pub async fn complete(&self, number: i64) -> Result<Ticket, LedgerError> {
        let ticket = self
            .store
            .find_by_number(number)
            .await?
            .ok_or(LedgerError::NotFound(number))?;

        let done = ticket.advance(TicketStatus::Done, Utc::now())?;
        match self.store.update(&done, TicketStatus::Serving).await {
            Ok(ticket) => {
                info!(number, "Ticket completed: Serving -> Done");
                Ok(ticket)
            }
            Err(StoreError::Conflict(_)) => {
                // Changed under us; report against what is stored now.
                match self.store.find_by_number(number).await? {
                    Some(current) => Err(LedgerError::InvalidState {
                        number,
                        status: current.status,
                    }),
                    None => Err(LedgerError::NotFound(number)),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every ticket, ascending by number.
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>, LedgerError> {
        Ok(self.store.find_all().await?)
    }
}
