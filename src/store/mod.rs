//! Persistence for queue tickets.
//!
//! The ledger only talks to the [`TicketStore`] trait. Every method is a
//! single atomic operation against the backing store, and `update` is a
//! conditional replace keyed on the status the caller last observed.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewTicket, Ticket, TicketStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryTicketStore;
pub use postgres::PgTicketStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Corrupt ticket record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persists a new ticket and returns it with its store identity.
    ///
    /// Fails with [`StoreError::Conflict`] if the number is already taken.
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, StoreError>;

    async fn find_max_number(&self) -> Result<Option<i64>, StoreError>;

    /// Tickets in `status`, ascending by number.
    async fn find_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError>;

    async fn find_by_number(&self, number: i64) -> Result<Option<Ticket>, StoreError>;

    /// Every ticket, ascending by number.
    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Replaces the stored ticket with `ticket` only if its stored status is
    /// still `expected`.
    ///
    /// Fails with [`StoreError::Conflict`] when the row is gone or has moved on.
    async fn update(&self, ticket: &Ticket, expected: TicketStatus) -> Result<Ticket, StoreError>;
}
