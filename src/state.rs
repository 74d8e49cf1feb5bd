use std::sync::Arc;

use sqlx::SqlitePool;

use crate::generation::ContentGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub generator: Arc<dyn ContentGenerator>,
}
