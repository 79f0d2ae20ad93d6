use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::models::{AuthUser, Session};

/// The app keeps a single signed-in session per device.
const CURRENT_SLOT: &str = "current";

#[derive(Debug, FromRow)]
struct SessionRow {
    user_id: String,
    email: String,
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            user: AuthUser {
                id: row.user_id,
                email: row.email,
            },
        }
    }
}

pub async fn save_session(db: &SqlitePool, session: &Session) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO sessions
            (slot, user_id, email, access_token, refresh_token, expires_at, saved_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(slot) DO UPDATE SET
            user_id = excluded.user_id,
            email = excluded.email,
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at,
            saved_at = excluded.saved_at
        "#,
    )
    .bind(CURRENT_SLOT)
    .bind(&session.user.id)
    .bind(&session.user.email)
    .bind(&session.access_token)
    .bind(&session.refresh_token)
    .bind(session.expires_at)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn load_session(db: &SqlitePool) -> Result<Option<Session>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT user_id, email, access_token, refresh_token, expires_at FROM sessions WHERE slot = ?",
    )
    .bind(CURRENT_SLOT)
    .fetch_optional(db)
    .await?;

    Ok(row.map(Session::from))
}

pub async fn clear_session(db: &SqlitePool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE slot = ?")
        .bind(CURRENT_SLOT)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn session(access_token: &str) -> Session {
        Session {
            access_token: access_token.to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: 1_750_000_000,
            user: AuthUser {
                id: "user-1".to_string(),
                email: "ana@opsclad.io".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_load_session() {
        let pool = setup_test_db().await;

        assert!(load_session(&pool).await.expect("Failed to load").is_none());

        save_session(&pool, &session("token-1")).await.expect("Failed to save");
        let loaded = load_session(&pool)
            .await
            .expect("Failed to load")
            .expect("Session not found");
        assert_eq!(loaded, session("token-1"));
    }

    #[tokio::test]
    async fn test_save_replaces_current_session() {
        let pool = setup_test_db().await;

        save_session(&pool, &session("token-1")).await.expect("Failed to save");
        save_session(&pool, &session("token-2")).await.expect("Failed to save");

        let loaded = load_session(&pool)
            .await
            .expect("Failed to load")
            .expect("Session not found");
        assert_eq!(loaded.access_token, "token-2");
    }

    #[tokio::test]
    async fn test_clear_session() {
        let pool = setup_test_db().await;

        save_session(&pool, &session("token-1")).await.expect("Failed to save");
        assert!(clear_session(&pool).await.expect("Failed to clear"));
        assert!(!clear_session(&pool).await.expect("Failed to clear"));
        assert!(load_session(&pool).await.expect("Failed to load").is_none());
    }
}
