use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::Session;
use crate::supabase::SupabaseClient;

/// Sessions this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Application-wide owner of the signed-in session.
///
/// The session is persisted in the local store, mirrored onto the backend
/// client as its bearer token, and broadcast to subscribers on every change.
/// All refreshes go through [`SessionManager::refresh`] or
/// [`SessionManager::refresh_if_expiring`].
pub struct SessionManager {
    db: SqlitePool,
    backend: Arc<dyn SupabaseClient>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionManager {
    pub fn new(db: SqlitePool, backend: Arc<dyn SupabaseClient>) -> Self {
        let (tx, _) = watch::channel(None);
        Self { db, backend, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn require(&self) -> Result<Session, AppError> {
        self.current()
            .ok_or_else(|| AppError::Unauthorized("Please sign in to continue.".to_string()))
    }

    fn publish(&self, session: Option<Session>) {
        self.backend
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        self.tx.send_replace(session);
    }

    async fn store(&self, session: Session) -> Result<Session, AppError> {
        repository::save_session(&self.db, &session).await?;
        self.publish(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Missing fields",
                "Please enter both email and password.",
            ));
        }

        let session = self
            .backend
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| match e {
                AppError::Unauthorized(msg) => AppError::validation("Login Failed", msg),
                other => other,
            })?;

        info!("Signed in as {}", session.user.email);
        self.store(session).await
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        if self.current().is_some() {
            if let Err(e) = self.backend.sign_out().await {
                warn!("Remote sign-out failed, clearing local session anyway: {}", e);
            }
        }

        repository::clear_session(&self.db).await?;
        self.publish(None);
        info!("Signed out");
        Ok(())
    }

    /// Loads the persisted session, refreshing it first when it is about to
    /// expire. A session that cannot be refreshed is discarded.
    pub async fn restore(&self) -> Result<Option<Session>, AppError> {
        let Some(stored) = repository::load_session(&self.db).await? else {
            return Ok(None);
        };

        if !stored.expires_within(Utc::now().timestamp(), REFRESH_MARGIN_SECS) {
            self.publish(Some(stored.clone()));
            return Ok(Some(stored));
        }

        match self.refresh_from(&stored).await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Stored session could not be refreshed: {}", e);
                repository::clear_session(&self.db).await?;
                self.publish(None);
                Ok(None)
            }
        }
    }

    pub async fn refresh(&self) -> Result<Session, AppError> {
        let current = self.require()?;
        self.refresh_from(&current).await
    }

    /// Returns whether a refresh happened.
    pub async fn refresh_if_expiring(&self) -> Result<bool, AppError> {
        match self.current() {
            Some(session) if session.expires_within(Utc::now().timestamp(), REFRESH_MARGIN_SECS) => {
                self.refresh_from(&session).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn refresh_from(&self, session: &Session) -> Result<Session, AppError> {
        let refreshed = self.backend.refresh_session(&session.refresh_token).await?;
        self.store(refreshed).await
    }
}
