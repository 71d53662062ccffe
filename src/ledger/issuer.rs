//! Single-writer owner of the ticket numbering critical section.
//!
//! Issue requests are queued on a channel and handled one at a time by a
//! dedicated task, so "read max, compute next, insert" never interleaves
//! within this process. The store's unique constraint catches anything that
//! slips past (another writer on the same table); those conflicts are retried
//! with backoff up to the configured limit.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::models::{NewTicket, Ticket};
use crate::store::{StoreError, TicketStore};

const QUEUE_CAPACITY: usize = 256;

struct IssueRequest {
    response: oneshot::Sender<Result<Ticket, StoreError>>,
}

#[derive(Clone)]
pub struct Issuer {
    sender: mpsc::Sender<IssueRequest>,
}

impl Issuer {
    /// Spawns the issuing task. Must be called from within a Tokio runtime.
    ///
    /// The task stops once every `Issuer` handle has been dropped.
    pub fn spawn(store: Arc<dyn TicketStore>, policy: RetryPolicy) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_issuer(store, receiver, policy));
        Self { sender }
    }

    pub async fn issue(&self) -> Result<Ticket, StoreError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.sender
            .send(IssueRequest {
                response: response_tx,
            })
            .await
            .map_err(|_| StoreError::Unavailable("ticket issuer has stopped".into()))?;

        response_rx
            .await
            .map_err(|_| StoreError::Unavailable("ticket issuer dropped the request".into()))?
    }
}

async fn run_issuer(
    store: Arc<dyn TicketStore>,
    mut receiver: mpsc::Receiver<IssueRequest>,
    policy: RetryPolicy,
) {
    while let Some(request) = receiver.recv().await {
        let result = issue_with_retry(store.as_ref(), &policy).await;
        // The caller may have gone away; the ticket is issued either way.
        let _ = request.response.send(result);
    }

    debug!("Ticket issuer stopped");
}

async fn issue_with_retry(
    store: &dyn TicketStore,
    policy: &RetryPolicy,
) -> Result<Ticket, StoreError> {
    let mut attempt = 0;

    loop {
        let next = match store.find_max_number().await? {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| StoreError::Unavailable("ticket numbers exhausted".into()))?,
            None => 1,
        };

        match store.insert(NewTicket::waiting(next, Utc::now())).await {
            Ok(ticket) => return Ok(ticket),
            Err(StoreError::Conflict(reason)) if attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    number = next,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "Ticket number taken, retrying issuance"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
