use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a queue ticket.
///
/// Only `Waiting`, `Serving` and `Done` are reached by the ledger today. The
/// remaining variants are reserved and must survive storage and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    New,
    Ready,
    Waiting,
    Called,
    Serving,
    Missed,
    Done,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 8] = [
        TicketStatus::New,
        TicketStatus::Ready,
        TicketStatus::Waiting,
        TicketStatus::Called,
        TicketStatus::Serving,
        TicketStatus::Missed,
        TicketStatus::Done,
        TicketStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::Ready => "Ready",
            TicketStatus::Waiting => "Waiting",
            TicketStatus::Called => "Called",
            TicketStatus::Serving => "Serving",
            TicketStatus::Missed => "Missed",
            TicketStatus::Done => "Done",
            TicketStatus::Cancelled => "Cancelled",
        }
    }

    /// Forward transition table. Anything not listed here is rejected.
    pub fn can_advance_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Waiting, TicketStatus::Serving)
                | (TicketStatus::Serving, TicketStatus::Done)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown ticket status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Ticket {number} cannot move from {from} to {to}")]
pub struct IllegalTransition {
    pub number: i64,
    pub from: TicketStatus,
    pub to: TicketStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub number: i64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Returns a copy of this ticket moved to `next`, stamped at `now`.
    ///
    /// The stamp never goes below the previous `updated_at`, so
    /// `updated_at >= created_at` holds even if the clock steps back.
    pub fn advance(&self, next: TicketStatus, now: DateTime<Utc>) -> Result<Ticket, IllegalTransition> {
        if !self.status.can_advance_to(next) {
            return Err(IllegalTransition {
                number: self.number,
                from: self.status,
                to: next,
            });
        }

        Ok(Ticket {
            status: next,
            updated_at: now.max(self.updated_at),
            ..self.clone()
        })
    }
}

/// A ticket that has not been persisted yet and has no store identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub number: i64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTicket {
    pub fn waiting(number: i64, now: DateTime<Utc>) -> Self {
        Self {
            number,
            status: TicketStatus::Waiting,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(self, id: i64) -> Ticket {
        Ticket {
            id,
            number: self.number,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
