/// Sqlite-backed request queue
///
/// Lives in the same database file as the stores, so a single-node deploy
/// needs no external broker. Claims are a single UPDATE..RETURNING
/// statement: the row's `visible_at` is pushed past the visibility window
/// and `receive_count` incremented atomically, so two concurrent consumers
/// never claim the same message twice within one window.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::{ReceivedMessage, RequestAttributes, RequestQueue, REQUEST_BODY};

/// Claims past this count log a warning; there is no dead-letter handling,
/// so a poison message keeps redelivering and this is its only trace.
const REDELIVERY_WARN_THRESHOLD: i64 = 3;

/// Sqlite implementation of the fulfillment queue
pub struct SqliteQueue {
    pool: SqlitePool,
}

impl SqliteQueue {
    /// Create a queue over an initialized pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now_secs() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RequestQueue for SqliteQueue {
    async fn publish(&self, attributes: &RequestAttributes, session_id: &str) -> Result<()> {
        let now = Self::now_secs();
        let attributes_json =
            serde_json::to_string(attributes).context("Failed to serialize attributes")?;

        sqlx::query(
            "INSERT INTO queue_messages (session_id, attributes, body, enqueued_at, visible_at, receive_count) VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(session_id)
        .bind(&attributes_json)
        .bind(REQUEST_BODY)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to enqueue request")?;

        debug!(session_id, "Request enqueued");
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<ReceivedMessage>> {
        let now = Self::now_secs();
        let hidden_until = now + visibility_timeout.as_secs() as i64;

        let rows = sqlx::query(
            "UPDATE queue_messages
             SET visible_at = ?, receive_count = receive_count + 1
             WHERE id IN (
                 SELECT id FROM queue_messages
                 WHERE visible_at <= ?
                 ORDER BY id ASC
                 LIMIT ?
             )
             RETURNING id, session_id, attributes, body, receive_count",
        )
        .bind(hidden_until)
        .bind(now)
        .bind(max_messages as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to claim queue messages")?;

        let mut messages = Vec::with_capacity(rows.len());
        for r in rows {
            let message = ReceivedMessage {
                id: r.get("id"),
                session_id: r.get("session_id"),
                attributes: r.get("attributes"),
                body: r.get("body"),
                receive_count: r.get("receive_count"),
            };

            if message.receive_count > REDELIVERY_WARN_THRESHOLD {
                warn!(
                    message_id = message.id,
                    receive_count = message.receive_count,
                    "Message redelivered repeatedly; it may be failing fulfillment"
                );
            }

            messages.push(message);
        }

        Ok(messages)
    }

    async fn delete(&self, message: &ReceivedMessage) -> Result<()> {
        sqlx::query("DELETE FROM queue_messages WHERE id = ?")
            .bind(message.id)
            .execute(&self.pool)
            .await
            .context("Failed to delete queue message")?;

        debug!(message_id = message.id, "Message acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    fn attrs() -> RequestAttributes {
        RequestAttributes {
            cuisine: "japanese".to_string(),
            location: "manhattan".to_string(),
            time: "18:00".to_string(),
            people: "4".to_string(),
            email: "diner@example.com".to_string(),
        }
    }

    async fn test_queue() -> (TempDir, SqliteQueue) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let queue = SqliteQueue::new(db.pool().clone());
        (temp_dir, queue)
    }

    #[tokio::test]
    async fn test_publish_then_receive() {
        let (_dir, queue) = test_queue().await;

        queue.publish(&attrs(), "session-1").await.unwrap();

        let messages = queue
            .receive(5, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].session_id, "session-1");
        assert_eq!(messages[0].body, REQUEST_BODY);
        assert_eq!(messages[0].parse_attributes().unwrap(), attrs());
    }

    #[tokio::test]
    async fn test_claimed_message_is_invisible() {
        let (_dir, queue) = test_queue().await;

        queue.publish(&attrs(), "session-1").await.unwrap();

        let first = queue.receive(5, Duration::from_secs(30)).await.unwrap();
        assert_eq!(first.len(), 1);

        let second = queue.receive(5, Duration::from_secs(30)).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_message_reappears_after_visibility_window() {
        let (_dir, queue) = test_queue().await;

        queue.publish(&attrs(), "session-1").await.unwrap();

        let first = queue.receive(5, Duration::from_secs(1)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].receive_count, 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let second = queue.receive(5, Duration::from_secs(30)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].receive_count, 2);
    }

    #[tokio::test]
    async fn test_deleted_message_never_reappears() {
        let (_dir, queue) = test_queue().await;

        queue.publish(&attrs(), "session-1").await.unwrap();

        let messages = queue.receive(5, Duration::from_secs(1)).await.unwrap();
        queue.delete(&messages[0]).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let after = queue.receive(5, Duration::from_secs(30)).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_receive_returns_oldest_first_and_respects_limit() {
        let (_dir, queue) = test_queue().await;

        queue.publish(&attrs(), "a").await.unwrap();
        queue.publish(&attrs(), "b").await.unwrap();
        queue.publish(&attrs(), "c").await.unwrap();

        let messages = queue.receive(2, Duration::from_secs(30)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].session_id, "a");
        assert_eq!(messages[1].session_id, "b");
    }
}
