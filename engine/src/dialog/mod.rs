//! Dialog orchestration
//!
//! This module implements the per-turn controller for the dining concierge.
//! Each turn runs the same sequence:
//!
//! 1. Resolve the session (minting an id when the caller has none)
//! 2. Look up the session's stored preference
//! 3. Recognize the utterance through the NLU seam
//! 4. If a dining request meets a stored preference: run the resumption
//!    shortcut (yes / no / confirm) instead of normal dispatch
//! 5. Otherwise dispatch on intent; dining requests go through slot
//!    validation and, once complete, are enqueued for fulfillment
//!
//! The public entry never fails: any collaborator error degrades to a
//! polite retry reply so the transport always has something to send back.

use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::preferences::{Preference, PreferenceStore};
use crate::nlu::{Intent, PrefilledSlots, Recognition, Recognizer};
use crate::queue::{RequestAttributes, RequestQueue};

pub mod slots;

pub use slots::{SlotName, SlotSet, Validation, ViolationKind};

const EMPTY_UTTERANCE_REPLY: &str = "Sorry, I didn't understand that. Please try again.";
const GENERIC_RETRY_REPLY: &str =
    "There was an error processing your request. Please try again later.";
const RESUMPTION_FAILED_REPLY: &str = "Something went wrong while processing your request.";
const PREFERENCES_CLEARED_REPLY: &str =
    "Preferences cleared. Let's start fresh. How can I help you today?";
const PUBLISH_FAILED_REPLY: &str =
    "Sorry, we couldn't process your request at this time. Please try again later.";
const GREETING_REPLY: &str = "Hello! Welcome! How can I be of assistance today?";
const THANK_YOU_REPLY: &str = "You're welcome! Let me know if you need anything else.";
const FALLBACK_REPLY: &str = "Sorry, I didn't quite get that. Could you please rephrase?";

/// One structured reply per turn
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    /// Session the turn belongs to; echoes the caller's id or carries the
    /// minted one
    pub session_id: String,
    /// Text to show the user
    pub message: String,
    /// Set when this turn closed an intent; `None` while the dialog is
    /// still collecting input
    pub fulfilled: Option<Intent>,
}

impl BotReply {
    /// A reply that keeps the dialog open (elicitation, confirmation,
    /// error strings).
    pub fn prompt(session_id: &str, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            message: message.into(),
            fulfilled: None,
        }
    }

    /// A reply that closes the turn's intent.
    pub fn close(session_id: &str, message: impl Into<String>, intent: Intent) -> Self {
        Self {
            session_id: session_id.to_string(),
            message: message.into(),
            fulfilled: Some(intent),
        }
    }
}

/// Per-turn dialog controller
///
/// Stateless between turns; everything that must survive a turn lives
/// behind the injected seams.
pub struct DialogOrchestrator {
    /// Recognition engine seam
    recognizer: Arc<dyn Recognizer>,

    /// Durable per-session preference store
    preferences: Arc<dyn PreferenceStore>,

    /// Fulfillment queue (publish side only)
    queue: Arc<dyn RequestQueue>,
}

impl DialogOrchestrator {
    /// Create a new orchestrator over its collaborators
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        preferences: Arc<dyn PreferenceStore>,
        queue: Arc<dyn RequestQueue>,
    ) -> Self {
        Self {
            recognizer,
            preferences,
            queue,
        }
    }

    /// Run one dialog turn.
    ///
    /// Never errors: collaborator failures are logged and degrade to a
    /// fixed retry reply, keeping the stored preference untouched.
    pub async fn respond(&self, session_id: Option<&str>, text: &str) -> BotReply {
        let session_id = match session_id {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        if text.trim().is_empty() {
            return BotReply::prompt(&session_id, EMPTY_UTTERANCE_REPLY);
        }

        match self.try_respond(&session_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Turn failed for session {}: {:#}", session_id, e);
                BotReply::prompt(&session_id, GENERIC_RETRY_REPLY)
            }
        }
    }

    async fn try_respond(&self, session_id: &str, text: &str) -> Result<BotReply> {
        let preference = self
            .preferences
            .get(session_id)
            .await
            .context("Failed to look up stored preference")?;

        let recognition = self
            .recognizer
            .recognize(session_id, text, None, None)
            .await
            .context("Recognition failed")?;

        debug!(
            "Session {} recognized as {} ({} slot values)",
            session_id,
            recognition.intent,
            recognition.slots.len()
        );

        // A returning user asking for dining suggestions gets the shortcut
        // offer before any fresh slot collection happens.
        if recognition.intent == Intent::DiningRequest {
            if let Some(pref) = preference {
                return self.resume(session_id, text, &pref).await;
            }
        }

        match recognition.intent {
            Intent::DiningRequest => self.fresh_intake(session_id, &recognition).await,
            Intent::Greeting => Ok(BotReply::close(session_id, GREETING_REPLY, Intent::Greeting)),
            Intent::ThankYou => Ok(BotReply::close(
                session_id,
                THANK_YOU_REPLY,
                Intent::ThankYou,
            )),
            Intent::Fallback => {
                // Relay whatever the engine proposed before giving up on
                // the utterance entirely.
                let message = recognition.first_message().unwrap_or(FALLBACK_REPLY);
                Ok(BotReply::close(session_id, message, Intent::Fallback))
            }
        }
    }

    /// Resumption shortcut: the session has a stored search and just asked
    /// for dining suggestions again.
    async fn resume(
        &self,
        session_id: &str,
        text: &str,
        preference: &Preference,
    ) -> Result<BotReply> {
        // The decision must be the literal utterance; near misses fall
        // through to the confirmation prompt.
        match text {
            "yes" => {
                let prefilled = PrefilledSlots {
                    cuisine: preference.cuisine.clone(),
                    location: preference.location.clone(),
                };

                // Re-enter the dining intent with cuisine/location already
                // filled, steering the engine to ask for the time next.
                let seeded = self
                    .recognizer
                    .recognize(
                        session_id,
                        SlotName::Time.elicitation_prompt(),
                        Some(&prefilled),
                        Some(SlotName::Time.wire_name()),
                    )
                    .await;

                match seeded {
                    Ok(recognition) => match recognition.first_message() {
                        Some(message) => {
                            let message = message.to_string();

                            // The shortcut has been consumed; the resumed
                            // conversation carries the values from here.
                            self.preferences
                                .delete(session_id)
                                .await
                                .context("Failed to consume preference")?;

                            info!(
                                "Session {} resumed last search ({} in {})",
                                session_id, preference.cuisine, preference.location
                            );
                            Ok(BotReply::prompt(session_id, message))
                        }
                        None => {
                            warn!(
                                "Session {} resumption returned no messages; keeping preference",
                                session_id
                            );
                            Ok(BotReply::prompt(session_id, RESUMPTION_FAILED_REPLY))
                        }
                    },
                    Err(e) => {
                        warn!(
                            "Session {} resumption recognition failed: {}; keeping preference",
                            session_id, e
                        );
                        Ok(BotReply::prompt(session_id, RESUMPTION_FAILED_REPLY))
                    }
                }
            }
            "no" => {
                self.preferences
                    .delete(session_id)
                    .await
                    .context("Failed to clear preference")?;

                info!("Session {} declined resumption; preference cleared", session_id);
                Ok(BotReply::prompt(session_id, PREFERENCES_CLEARED_REPLY))
            }
            _ => Ok(BotReply::prompt(
                session_id,
                format!(
                    "We have your last search for {} in {}. Would you like to continue? (yes/no)",
                    preference.cuisine, preference.location
                ),
            )),
        }
    }

    /// Fresh intake: validate the recognized slots and either re-prompt for
    /// the first gap or hand the completed request to fulfillment.
    async fn fresh_intake(&self, session_id: &str, recognition: &Recognition) -> Result<BotReply> {
        let slot_set = SlotSet::from_map(&recognition.slots);

        match slots::validate(&slot_set, Local::now().naive_local()) {
            Validation::Violated { slot, kind, prompt } => {
                debug!(
                    "Session {} re-prompted for {:?} ({:?})",
                    session_id, slot, kind
                );
                Ok(BotReply::prompt(session_id, prompt))
            }
            Validation::Complete => self.finalize(session_id, &slot_set).await,
        }
    }

    /// Enqueue a completed request and remember the search for next time.
    async fn finalize(&self, session_id: &str, slot_set: &SlotSet) -> Result<BotReply> {
        let attributes = RequestAttributes {
            cuisine: slot_set.cuisine.clone(),
            location: slot_set.location.clone(),
            time: slot_set.time.clone(),
            people: slot_set.people.clone(),
            email: slot_set.email.clone(),
        };

        if let Err(e) = self.queue.publish(&attributes, session_id).await {
            error!(
                "Failed to enqueue dining request for session {}: {:#}",
                session_id, e
            );
            return Ok(BotReply::prompt(session_id, PUBLISH_FAILED_REPLY));
        }

        // The request is already in flight; a failed preference write only
        // costs the next visit's shortcut.
        let preference = Preference::new(session_id, &attributes.cuisine, &attributes.location);
        if let Err(e) = self.preferences.put(&preference).await {
            warn!(
                "Failed to store preference for session {}: {:#}",
                session_id, e
            );
        }

        info!(
            "Session {} request enqueued: {} in {} at {} for {}",
            session_id, attributes.cuisine, attributes.location, attributes.time, attributes.people
        );

        Ok(BotReply::close(
            session_id,
            format!(
                "Thank you! We'll send you {} food suggestions in {} for {} people at {} on {}.",
                attributes.cuisine,
                attributes.location,
                attributes.people,
                attributes.time,
                attributes.email
            ),
            Intent::DiningRequest,
        ))
    }
}
