use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::SessionManager;
use crate::supabase::SupabaseClient;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub backend: Arc<dyn SupabaseClient>,
    pub session: Arc<SessionManager>,
}

impl AppState {
    pub fn new(db: SqlitePool, backend: Arc<dyn SupabaseClient>) -> Self {
        let session = Arc::new(SessionManager::new(db.clone(), backend.clone()));
        Self {
            db,
            backend,
            session,
        }
    }
}
