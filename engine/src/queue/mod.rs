//! Fulfillment request queue
//!
//! Decouples dialog intake from the worker that resolves suggestions.
//! Delivery is at-least-once: a received message stays invisible for the
//! visibility window and reappears unless it was deleted. Consumers delete
//! only after a fully successful send, so a crash mid-pipeline redelivers.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod sqlite;

pub use sqlite::SqliteQueue;

/// Fixed body stamped on every queued request; the payload proper lives in
/// the attribute map.
pub const REQUEST_BODY: &str = "Dining suggestions request";

/// The validated slot values a completed dialog hands to the worker.
///
/// Serialized as a capitalized-key JSON map at rest, mirroring the message
/// attribute names the notification pipeline was built around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RequestAttributes {
    pub cuisine: String,
    pub location: String,
    pub time: String,
    pub people: String,
    pub email: String,
}

/// A message claimed from the queue
///
/// Attributes stay raw here: a consumer must be able to reject a malformed
/// map without failing the whole receive batch.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Queue-assigned message id, used for deletion
    pub id: i64,
    /// Session that produced the request
    pub session_id: String,
    /// Raw JSON attribute map
    pub attributes: String,
    /// Descriptive body
    pub body: String,
    /// How many times this message has been claimed, including this claim
    pub receive_count: i64,
}

impl ReceivedMessage {
    /// Decode the attribute map. Fails on missing fields or invalid JSON.
    pub fn parse_attributes(&self) -> Result<RequestAttributes, serde_json::Error> {
        serde_json::from_str(&self.attributes)
    }
}

/// Queue seam between the dialog orchestrator (producer) and the
/// fulfillment worker (consumer)
#[async_trait]
pub trait RequestQueue: Send + Sync {
    /// Enqueue a completed dining request.
    async fn publish(&self, attributes: &RequestAttributes, session_id: &str) -> Result<()>;

    /// Claim up to `max_messages` visible messages, hiding each for
    /// `visibility_timeout`. Returns oldest first; may return fewer than
    /// requested, or none.
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<ReceivedMessage>>;

    /// Acknowledge a message, removing it permanently.
    async fn delete(&self, message: &ReceivedMessage) -> Result<()>;
}
