use std::sync::Arc;

use crate::ledger::{Ledger, RetryPolicy};
use crate::store::TicketStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Builds the ledger over `store`. Must be called from within a Tokio runtime.
    pub fn with_store(store: Arc<dyn TicketStore>, retry: RetryPolicy) -> Self {
        Self::new(Ledger::with_retry_policy(store, retry))
    }
}
