use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{StoreError, TicketStore};
use crate::models::{NewTicket, Ticket, TicketStatus};

#[derive(Debug, Default)]
struct Inner {
    // Keyed by ticket number, so iteration is already in queue order.
    tickets: BTreeMap<i64, Ticket>,
    last_id: i64,
}

/// In-process store used in tests and when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryTicketStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let mut inner = self.write()?;

        if inner.tickets.contains_key(&ticket.number) {
            return Err(StoreError::Conflict(format!(
                "ticket number {} already exists",
                ticket.number
            )));
        }

        inner.last_id += 1;
        let stored = ticket.with_id(inner.last_id);
        inner.tickets.insert(stored.number, stored.clone());
        Ok(stored)
    }

    async fn find_max_number(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.read()?.tickets.keys().next_back().copied())
    }

    async fn find_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .read()?
            .tickets
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_number(&self, number: i64) -> Result<Option<Ticket>, StoreError> {
        Ok(self.read()?.tickets.get(&number).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.read()?.tickets.values().cloned().collect())
    }

    async fn update(&self, ticket: &Ticket, expected: TicketStatus) -> Result<Ticket, StoreError> {
        let mut inner = self.write()?;

        let stored = inner
            .tickets
            .get_mut(&ticket.number)
            .filter(|stored| stored.id == ticket.id)
            .ok_or_else(|| {
                StoreError::Conflict(format!("ticket {} no longer exists", ticket.number))
            })?;

        if stored.status != expected {
            return Err(StoreError::Conflict(format!(
                "ticket {} is {}, expected {}",
                ticket.number, stored.status, expected
            )));
        }

        *stored = ticket.clone();
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryTicketStore::new();
        let first = store.insert(NewTicket::waiting(1, Utc::now())).await.unwrap();
        let second = store.insert(NewTicket::waiting(2, Utc::now())).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(store.find_max_number().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_number() {
        let store = MemoryTicketStore::new();
        store.insert(NewTicket::waiting(1, Utc::now())).await.unwrap();

        let err = store
            .insert(NewTicket::waiting(1, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_has_no_max() {
        let store = MemoryTicketStore::new();
        assert_eq!(store.find_max_number().await.unwrap(), None);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_status_is_ordered_by_number() {
        let store = MemoryTicketStore::new();
        for number in [3, 1, 2] {
            store.insert(NewTicket::waiting(number, Utc::now())).await.unwrap();
        }

        let numbers: Vec<i64> = store
            .find_by_status(TicketStatus::Waiting)
            .await
            .unwrap()
            .iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(store
            .find_by_status(TicketStatus::Serving)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_expected_status() {
        let store = MemoryTicketStore::new();
        let ticket = store.insert(NewTicket::waiting(1, Utc::now())).await.unwrap();
        let serving = ticket.advance(TicketStatus::Serving, Utc::now()).unwrap();

        store.update(&serving, TicketStatus::Waiting).await.unwrap();

        // A second writer that still believes the ticket is waiting loses.
        let err = store
            .update(&serving, TicketStatus::Waiting)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.find_by_number(1).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Serving);
    }

    #[tokio::test]
    async fn test_update_of_unknown_ticket_conflicts() {
        let store = MemoryTicketStore::new();
        let ghost = NewTicket::waiting(7, Utc::now()).with_id(99);

        let err = store.update(&ghost, TicketStatus::Waiting).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reserved_statuses_are_stored_as_is() {
        let store = MemoryTicketStore::new();
        let mut ticket = NewTicket::waiting(1, Utc::now());
        ticket.status = TicketStatus::Missed;
        store.insert(ticket).await.unwrap();

        let stored = store.find_by_number(1).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Missed);
    }
}
