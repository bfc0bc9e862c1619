/// Session preference persistence
///
/// Stores the last fulfilled dining search per session so a returning user
/// can be offered a shortcut. At most one row per session: `put` replaces
/// the record wholesale, it is never partially mutated.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

/// Preference record: the cuisine/location pair of a session's last
/// fulfilled search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preference {
    pub session_id: String,
    pub cuisine: String,
    pub location: String,
    pub created_at: i64,
}

impl Preference {
    /// Build a preference stamped with the current time.
    pub fn new(session_id: &str, cuisine: &str, location: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self {
            session_id: session_id.to_string(),
            cuisine: cuisine.to_string(),
            location: location.to_string(),
            created_at: now,
        }
    }
}

/// Storage seam for session preferences
///
/// The dialog orchestrator only sees this trait; the sqlite implementation
/// below is the production store, tests inject in-memory fakes.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch the preference for a session, if one exists.
    async fn get(&self, session_id: &str) -> Result<Option<Preference>>;

    /// Insert or replace the preference for a session.
    async fn put(&self, preference: &Preference) -> Result<()>;

    /// Remove the preference for a session. Removing a missing row is not
    /// an error.
    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// Sqlite-backed preference store
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
}

impl SqlitePreferenceStore {
    /// Create a new preference store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get(&self, session_id: &str) -> Result<Option<Preference>> {
        let row = sqlx::query(
            "SELECT session_id, cuisine, location, created_at FROM preferences WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch preference")?;

        Ok(row.map(|r| Preference {
            session_id: r.get("session_id"),
            cuisine: r.get("cuisine"),
            location: r.get("location"),
            created_at: r.get("created_at"),
        }))
    }

    async fn put(&self, preference: &Preference) -> Result<()> {
        // Use parameterized query to prevent SQL injection
        sqlx::query(
            "INSERT OR REPLACE INTO preferences (session_id, cuisine, location, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&preference.session_id)
        .bind(&preference.cuisine)
        .bind(&preference.location)
        .bind(preference.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to store preference")?;

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete preference")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, SqlitePreferenceStore) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let store = db.preferences();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let (_dir, store) = test_store().await;

        let pref = Preference::new("session-1", "japanese", "manhattan");
        store.put(&pref).await.unwrap();

        let fetched = store.get("session-1").await.unwrap().unwrap();
        assert_eq!(fetched, pref);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_dir, store) = test_store().await;

        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_existing_row() {
        let (_dir, store) = test_store().await;

        store
            .put(&Preference::new("session-1", "japanese", "manhattan"))
            .await
            .unwrap();
        store
            .put(&Preference::new("session-1", "italian", "brooklyn"))
            .await
            .unwrap();

        let fetched = store.get("session-1").await.unwrap().unwrap();
        assert_eq!(fetched.cuisine, "italian");
        assert_eq!(fetched.location, "brooklyn");

        // Still a single row for the session
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM preferences")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (_dir, store) = test_store().await;

        store
            .put(&Preference::new("session-1", "japanese", "manhattan"))
            .await
            .unwrap();
        store.delete("session-1").await.unwrap();

        assert!(store.get("session-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (_dir, store) = test_store().await;

        store.delete("never-existed").await.unwrap();
    }
}
