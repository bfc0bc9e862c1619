use super::{NluError, PrefilledSlots, Recognition, Recognizer};
use crate::config::NluConfig;
use crate::nlu::Intent;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client for the recognition engine
///
/// Posts one JSON document per utterance to `{base_url}/recognize` and
/// validates the reply at this boundary, so the rest of the pipeline only
/// ever sees a well-formed `Recognition`.
pub struct HttpRecognizer {
    config: NluConfig,
    client: reqwest::Client,
}

/// Wire shape of a recognition reply. Everything is optional; the
/// conversion below fills the gaps.
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    intent: Option<String>,
    slots: Option<HashMap<String, Option<String>>>,
    messages: Option<Vec<String>>,
}

impl HttpRecognizer {
    pub fn new(config: NluConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(
        &self,
        session_id: &str,
        text: &str,
        prefilled: Option<&PrefilledSlots>,
        elicit_slot: Option<&str>,
    ) -> super::Result<Recognition> {
        let url = format!("{}/recognize", self.config.base_url);

        let mut payload = json!({
            "session_id": session_id,
            "text": text,
            "locale": self.config.locale,
        });

        if prefilled.is_some() || elicit_slot.is_some() {
            let mut session_state = serde_json::Map::new();
            if let Some(p) = prefilled {
                session_state.insert(
                    "slots".to_string(),
                    json!({ "Cuisine": p.cuisine, "Location": p.location }),
                );
            }
            if let Some(slot) = elicit_slot {
                session_state.insert("elicit_slot".to_string(), json!(slot));
            }
            payload["session_state"] = Value::Object(session_state);
        }

        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&payload);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NluError::Timeout
            } else {
                NluError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(NluError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(NluError::RateLimited);
            } else {
                return Err(NluError::InvalidRequest(text));
            }
        }

        let data: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| NluError::ParseError(e.to_string()))?;

        Ok(convert(data))
    }
}

/// Validate a wire reply into the closed recognition type.
///
/// Missing intent collapses to `Fallback`; null slot values are dropped so
/// "absent" and "null" read the same downstream.
fn convert(data: RecognizeResponse) -> Recognition {
    let intent = data
        .intent
        .as_deref()
        .map(Intent::from_wire)
        .unwrap_or(Intent::Fallback);

    let slots = data
        .slots
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect();

    Recognition {
        intent,
        slots,
        messages: data.messages.unwrap_or_default(),
    }
}
