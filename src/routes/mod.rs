use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::health_check;
use crate::handlers::tickets::{call_next, complete_ticket, issue_ticket, list_tickets};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/ticket/new", post(issue_ticket))
        .route("/api/ticket/next", post(call_next))
        .route("/api/ticket/:number/done", post(complete_ticket))
        .route("/api/tickets", get(list_tickets))
        .with_state(state);

    with_security_headers(router, config.production)
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
