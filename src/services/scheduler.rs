use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::services::session::SessionManager;

/// Session auto-refresh loop.
/// Periodically renews the signed-in session before its access token expires.
pub struct SessionRefresher {
    session: Arc<SessionManager>,
    interval: Duration,
}

impl SessionRefresher {
    pub fn new(session: Arc<SessionManager>, interval_secs: u64) -> Self {
        Self {
            session,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Runs forever; abort the task to stop it.
    pub async fn start(self) {
        info!("Starting session refresher (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.session.refresh_if_expiring().await {
                Ok(true) => info!("Session refreshed"),
                Ok(false) => debug!("Session still fresh"),
                Err(e) => {
                    warn!("Session refresh failed: {:?}", e);
                    // keep looping; the next tick retries
                }
            }
        }
    }
}
