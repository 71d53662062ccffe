use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use queue_ticket::config::Config;
use queue_ticket::ledger::RetryPolicy;
use queue_ticket::routes::create_routes;
use queue_ticket::state::AppState;
use queue_ticket::store::{MemoryTicketStore, PgTicketStore, TicketStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("queue_ticket=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let store: Arc<dyn TicketStore> = match &config.database_url {
        Some(url) => {
            let store = PgTicketStore::connect(url, config.db_max_connections).await?;
            tracing::info!("Connected to database and ran migrations");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; tickets are kept in memory and lost on exit");
            Arc::new(MemoryTicketStore::new())
        }
    };

    let state = AppState::with_store(store, RetryPolicy::with_max_retries(config.issue_max_retries));
    let app = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Queue ticket server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
