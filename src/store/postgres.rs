use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::debug;

use super::{StoreError, TicketStore};
use crate::models::{NewTicket, Ticket, TicketStatus};

const TICKET_COLUMNS: &str = "id, number, status, created_at, updated_at";

/// Raw `tickets` row. Status is kept as text until it is validated.
#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    number: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TicketStatus>()
            .map_err(|e| StoreError::Corrupt(format!("ticket {}: {e}", row.number)))?;

        Ok(Ticket {
            id: row.id,
            number: row.number,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, StoreError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

/// PostgreSQL-backed store.
///
/// Each call checks a connection out of the pool for the duration of a single
/// statement; the connection goes back to the pool when the call returns,
/// whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let query = format!(
            "INSERT INTO tickets (number, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {TICKET_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket.number)
            .bind(ticket.status.as_str())
            .bind(ticket.created_at)
            .bind(ticket.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("ticket number {} already exists", ticket.number))
                }
                other => StoreError::Database(other),
            })?;

        Ticket::try_from(row)
    }

    async fn find_max_number(&self) -> Result<Option<i64>, StoreError> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(number) FROM tickets")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn find_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        let query =
            format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE status = $1 ORDER BY number ASC");

        let rows = sqlx::query_as::<_, TicketRow>(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        into_tickets(rows)
    }

    async fn find_by_number(&self, number: i64) -> Result<Option<Ticket>, StoreError> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE number = $1");

        sqlx::query_as::<_, TicketRow>(&query)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY number ASC");

        let rows = sqlx::query_as::<_, TicketRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        into_tickets(rows)
    }

    async fn update(&self, ticket: &Ticket, expected: TicketStatus) -> Result<Ticket, StoreError> {
        let query = format!(
            "UPDATE tickets SET status = $1, updated_at = $2
             WHERE id = $3 AND status = $4
             RETURNING {TICKET_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket.status.as_str())
            .bind(ticket.updated_at)
            .bind(ticket.id)
            .bind(expected.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ticket::try_from(row),
            None => {
                debug!(number = ticket.number, %expected, "Conditional ticket update matched no row");
                Err(StoreError::Conflict(format!(
                    "ticket {} is no longer {}",
                    ticket.number, expected
                )))
            }
        }
    }
}
