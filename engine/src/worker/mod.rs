//! Fulfillment worker
//!
//! Drains the request queue and turns each completed dining request into a
//! notification: search the index for the cuisine, hydrate the hits from
//! the local catalog, send the suggestion list, then acknowledge. A message
//! is only deleted after a fully successful pass, so any collaborator
//! failure leaves it to redeliver after the visibility window.
//!
//! Per-message failures never abort the batch; the worker logs and moves
//! on, exactly like the dialog side never surfaces collaborator detail.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::db::catalog::CatalogStore;
use crate::notify::NotificationSender;
use crate::queue::{ReceivedMessage, RequestAttributes, RequestQueue};
use crate::search::SearchIndex;

/// How many suggestions one notification carries at most
const SUGGESTION_COUNT: u32 = 5;

/// A restaurant pick ready for the notification body
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub name: String,
    pub address: String,
}

/// Outcome counts for one drain cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainStats {
    /// Messages claimed from the queue
    pub received: usize,
    /// Notifications sent and messages acknowledged
    pub delivered: usize,
    /// Messages finished without a notification (malformed attributes, or
    /// nothing to recommend)
    pub skipped: usize,
    /// Messages left for redelivery after a collaborator failure
    pub failed: usize,
}

/// Queue consumer that resolves requests into suggestion notifications
pub struct FulfillmentWorker {
    /// Fulfillment queue (consume side)
    queue: Arc<dyn RequestQueue>,

    /// Restaurant search index
    search: Arc<dyn SearchIndex>,

    /// Catalog used to hydrate search hits
    catalog: Arc<dyn CatalogStore>,

    /// Delivery channel
    notifier: Arc<dyn NotificationSender>,

    batch_size: u32,
    visibility_timeout: Duration,
}

impl FulfillmentWorker {
    /// Create a new worker over its collaborators
    pub fn new(
        queue: Arc<dyn RequestQueue>,
        search: Arc<dyn SearchIndex>,
        catalog: Arc<dyn CatalogStore>,
        notifier: Arc<dyn NotificationSender>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            queue,
            search,
            catalog,
            notifier,
            batch_size: config.batch_size,
            visibility_timeout: Duration::from_secs(config.visibility_timeout_secs),
        }
    }

    /// One drain cycle: claim a batch and process each message.
    pub async fn run_once(&self) -> Result<DrainStats> {
        let messages = self
            .queue
            .receive(self.batch_size, self.visibility_timeout)
            .await
            .context("Failed to claim messages")?;

        let mut stats = DrainStats {
            received: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            self.process_message(message, &mut stats).await;
        }

        if stats.received > 0 {
            info!(
                "Drain cycle: {} received, {} delivered, {} skipped, {} failed",
                stats.received, stats.delivered, stats.skipped, stats.failed
            );
        } else {
            debug!("Queue empty");
        }

        Ok(stats)
    }

    /// Poll loop for the worker command. Never returns; callers race it
    /// against a shutdown signal.
    pub async fn run(&self, poll_interval: Duration) {
        info!(
            "Starting fulfillment worker (batch size {}, polling every {}s)",
            self.batch_size,
            poll_interval.as_secs()
        );

        loop {
            if let Err(e) = self.run_once().await {
                error!("Drain cycle failed: {:#}", e);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn process_message(&self, message: &ReceivedMessage, stats: &mut DrainStats) {
        let attributes = match message.parse_attributes() {
            Ok(attributes) => attributes,
            Err(e) => {
                // Not acknowledged: a malformed message will redeliver and
                // fail the same way, which the queue's receive-count
                // warning makes visible.
                warn!(
                    "Message {} has malformed attributes ({}); skipping",
                    message.id, e
                );
                stats.skipped += 1;
                return;
            }
        };

        match self.fulfill(&attributes).await {
            Ok(sent) => {
                if let Err(e) = self.queue.delete(message).await {
                    error!("Failed to acknowledge message {}: {:#}", message.id, e);
                    stats.failed += 1;
                    return;
                }
                if sent {
                    stats.delivered += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            Err(e) => {
                error!(
                    "Fulfillment failed for message {} (session {}): {:#}",
                    message.id, message.session_id, e
                );
                stats.failed += 1;
            }
        }
    }

    /// Resolve one request into a notification. Returns whether anything
    /// was sent; `Ok(false)` means there was nothing to recommend, which
    /// still acknowledges the message.
    async fn fulfill(&self, attributes: &RequestAttributes) -> Result<bool> {
        let ids = self
            .search
            .top_ids(&attributes.cuisine, SUGGESTION_COUNT)
            .await
            .context("Search failed")?;

        let mut recommendations = Vec::new();
        for id in &ids {
            // One dangling reference never fails the whole request.
            match self.catalog.get(id).await {
                Ok(Some(restaurant)) => recommendations.push(Recommendation {
                    name: restaurant.name,
                    address: restaurant.address,
                }),
                Ok(None) => warn!("Search hit {} missing from catalog; dropping it", id),
                Err(e) => warn!("Catalog lookup failed for {}: {:#}; dropping it", id, e),
            }
        }

        if recommendations.is_empty() {
            info!(
                "No recommendations for {} in {}; nothing to send",
                attributes.cuisine, attributes.location
            );
            return Ok(false);
        }

        let subject = format!(
            "Dining Suggestions for {} Cuisine in {}",
            attributes.cuisine, attributes.location
        );
        let body = compose_body(attributes, &recommendations);

        self.notifier
            .send(&attributes.email, &subject, &body)
            .await
            .context("Notification send failed")?;

        info!(
            "Sent {} suggestions to {}",
            recommendations.len(),
            attributes.email
        );
        Ok(true)
    }
}

/// Plain-text notification body: a one-line summary of the request, then
/// the numbered picks.
fn compose_body(attributes: &RequestAttributes, recommendations: &[Recommendation]) -> String {
    let mut body = format!(
        "Hello! Here are my {} restaurant suggestions in {} for {} people, at {}:\n\n",
        attributes.cuisine, attributes.location, attributes.people, attributes.time
    );

    for (i, recommendation) in recommendations.iter().enumerate() {
        body.push_str(&format!(
            "{}. {} at {}\n",
            i + 1,
            recommendation.name,
            recommendation.address
        ));
    }

    body.push_str("\nEnjoy your meal!");
    body
}
