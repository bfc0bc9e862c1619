/// Restaurant catalog persistence
///
/// Holds the full restaurant records the fulfillment worker hydrates search
/// hits against. Rows are loaded out of band with `savor catalog import`;
/// the worker only ever reads.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

/// Restaurant record
///
/// `id` is the listing identifier the search index returns; `name` and
/// `address` are what end up in the notification. The remaining fields ride
/// along from the import file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub cuisine: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub inserted_at: i64,
}

/// Read seam the fulfillment worker uses to resolve search hits
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch a restaurant by listing id, if present.
    async fn get(&self, id: &str) -> Result<Option<Restaurant>>;
}

/// Sqlite-backed catalog store
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Create a new catalog store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a restaurant record
    ///
    /// A zero `inserted_at` is stamped with the current time, so import
    /// files don't need to carry timestamps.
    pub async fn insert(&self, restaurant: &Restaurant) -> Result<()> {
        let inserted_at = if restaurant.inserted_at > 0 {
            restaurant.inserted_at
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        };

        sqlx::query(
            "INSERT OR REPLACE INTO restaurants (id, name, address, cuisine, rating, review_count, inserted_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.cuisine)
        .bind(restaurant.rating)
        .bind(restaurant.review_count)
        .bind(inserted_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert restaurant")?;

        Ok(())
    }

    /// Number of catalog rows
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count restaurants")?;

        Ok(count)
    }

    /// Most recently imported rows, newest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<Restaurant>> {
        let rows = sqlx::query(
            "SELECT id, name, address, cuisine, rating, review_count, inserted_at FROM restaurants ORDER BY inserted_at DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent restaurants")?;

        Ok(rows.into_iter().map(row_to_restaurant).collect())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn get(&self, id: &str) -> Result<Option<Restaurant>> {
        let row = sqlx::query(
            "SELECT id, name, address, cuisine, rating, review_count, inserted_at FROM restaurants WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch restaurant")?;

        Ok(row.map(row_to_restaurant))
    }
}

fn row_to_restaurant(r: sqlx::sqlite::SqliteRow) -> Restaurant {
    Restaurant {
        id: r.get("id"),
        name: r.get("name"),
        address: r.get("address"),
        cuisine: r.get("cuisine"),
        rating: r.get("rating"),
        review_count: r.get("review_count"),
        inserted_at: r.get("inserted_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    fn sample(id: &str, name: &str) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: name.to_string(),
            address: "123 Main St".to_string(),
            cuisine: "japanese".to_string(),
            rating: Some(4.5),
            review_count: Some(120),
            inserted_at: 0,
        }
    }

    async fn test_store() -> (TempDir, SqliteCatalogStore) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let store = db.catalog();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let (_dir, store) = test_store().await;

        store.insert(&sample("r1", "Sakura")).await.unwrap();

        let fetched = store.get("r1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Sakura");
        assert_eq!(fetched.address, "123 Main St");
        // Timestamp was stamped on insert
        assert!(fetched.inserted_at > 0);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_dir, store) = test_store().await;

        assert!(store.get("r404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_by_id() {
        let (_dir, store) = test_store().await;

        store.insert(&sample("r1", "Sakura")).await.unwrap();
        store.insert(&sample("r1", "Sakura Garden")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let fetched = store.get("r1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Sakura Garden");
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let (_dir, store) = test_store().await;

        for i in 0..5 {
            store
                .insert(&sample(&format!("r{}", i), "Place"))
                .await
                .unwrap();
        }

        let recent = store.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
    }

    #[tokio::test]
    async fn test_import_record_deserializes_without_optionals() {
        let json = r#"{"id": "r1", "name": "Sakura", "address": "1 Ave", "cuisine": "japanese"}"#;
        let r: Restaurant = serde_json::from_str(json).unwrap();

        assert_eq!(r.id, "r1");
        assert!(r.rating.is_none());
        assert_eq!(r.inserted_at, 0);
    }
}
