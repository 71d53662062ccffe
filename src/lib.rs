//! Sequential queue tickets for a walk-in counter.
//!
//! Customers take a numbered ticket, an operator calls the next waiting
//! ticket, and completed service is recorded. Numbers are unique and strictly
//! increasing even when tickets are issued concurrently.

pub mod config;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
