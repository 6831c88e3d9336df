use std::sync::Arc;

use sqlx::PgPool;

use fieldgate_commit::CommitService;
use fieldgate_core::Config;
use fieldgate_queue::JobPublisher;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub publisher: Arc<dyn JobPublisher>,
    pub service: CommitService,
}
