mod api;
mod auth;
mod db;
mod doc;
mod retry;
mod router;
mod state;

use std::sync::Arc;

use tracing::info;

use fieldgate_commit::CommitService;
use fieldgate_core::Config;
use fieldgate_queue::{JobPublisher, SqsPublisher};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    fieldgate_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let pool = db::init_pg_pool(&config.postgres).await?;

    // One broker connection for the process, shared by all commit calls and
    // the retry sweep; dropped on shutdown with the rest of the state.
    let publisher: Arc<dyn JobPublisher> = Arc::new(SqsPublisher::new(&config.queue).await?);

    let service = CommitService::postgres(pool.clone(), publisher.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        publisher,
        service,
    });

    tokio::spawn(retry::run_retry_sweep(state.clone()));

    let app = router::build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
