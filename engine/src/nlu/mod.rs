//! Language-understanding adapter
//!
//! The dialog orchestrator never talks to the recognition engine directly;
//! it goes through the `Recognizer` trait defined here. The engine itself is
//! an external service that turns free text into an intent plus raw slot
//! values, and can be steered with pre-filled slots and an elicitation
//! target for the resumption shortcut.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod http;

pub use http::HttpRecognizer;

/// Result type for recognition operations
pub type Result<T> = std::result::Result<T, NluError>;

/// Errors that can occur while talking to the recognition engine
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// The closed set of intents the pipeline understands
///
/// Anything the engine reports outside this set collapses to `Fallback`,
/// so downstream dispatch is always exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "GreetingIntent")]
    Greeting,
    #[serde(rename = "ThankYouIntent")]
    ThankYou,
    #[serde(rename = "DiningSuggestionsIntent")]
    DiningRequest,
    #[serde(rename = "FallbackIntent")]
    Fallback,
}

impl Intent {
    /// Map an engine-reported intent name into the closed set.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "GreetingIntent" => Intent::Greeting,
            "ThankYouIntent" => Intent::ThankYou,
            "DiningSuggestionsIntent" => Intent::DiningRequest,
            _ => Intent::Fallback,
        }
    }

    /// The engine-side name of this intent.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Intent::Greeting => "GreetingIntent",
            Intent::ThankYou => "ThankYouIntent",
            Intent::DiningRequest => "DiningSuggestionsIntent",
            Intent::Fallback => "FallbackIntent",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Slot values carried into a steered recognition call
///
/// Used by the resumption shortcut: the stored cuisine/location pair is
/// handed back to the engine so the conversation can continue at the first
/// unfilled slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefilledSlots {
    pub cuisine: String,
    pub location: String,
}

/// What the engine made of one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Matched intent, `Fallback` when the engine had nothing
    pub intent: Intent,
    /// Raw slot values by engine slot name; absent slots are simply missing
    pub slots: HashMap<String, String>,
    /// Response utterances proposed by the engine, in order
    pub messages: Vec<String>,
}

impl Recognition {
    /// First proposed response utterance, if the engine sent any.
    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }
}

/// Seam to the external recognition engine
///
/// One dialog turn may call this twice: a plain pass over the user's text,
/// then a steered pass when a stored preference is being resumed.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Run one utterance through the engine.
    ///
    /// `prefilled` seeds slot values before recognition; `elicit_slot`
    /// names the engine slot the next prompt should target. Both are only
    /// used on the resumption path.
    async fn recognize(
        &self,
        session_id: &str,
        text: &str,
        prefilled: Option<&PrefilledSlots>,
        elicit_slot: Option<&str>,
    ) -> Result<Recognition>;
}
