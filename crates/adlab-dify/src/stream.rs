//! Event-stream decoding.
//!
//! The service's streaming response is a sequence of lines; lines of
//! interest begin with the literal prefix `data: ` followed by one JSON
//! object carrying an `event` discriminator. Everything else (blank lines,
//! keep-alive comments, undecodable payloads) is skipped, never fatal.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Line prefix marking an event payload.
const DATA_PREFIX: &str = "data: ";

/// Default currency when the service omits one.
fn default_currency() -> String {
    "USD".to_string()
}

/// Accept a JSON number or a numeric string; anything else reads as zero.
///
/// The service reports `total_price` as a decimal string.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// Token and cost accounting from the terminal `message_end` event.
///
/// Absent numeric fields default to zero, absent currency to `USD`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens produced by the completion.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Total token count.
    #[serde(default)]
    pub total_tokens: u64,
    /// Monetary cost of the call.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_price: f64,
    /// Currency the cost is denominated in.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            total_price: 0.0,
            currency: default_currency(),
        }
    }
}

/// Metadata block of a `message_end` event.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EndMetadata {
    /// Finalized usage accounting.
    #[serde(default)]
    pub usage: Usage,
}

/// One decoded stream event, tagged by the `event` field.
///
/// Unknown discriminators decode to [`StreamEvent::Other`] and are ignored
/// by the aggregator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event")]
pub enum StreamEvent {
    /// Partial answer text.
    #[serde(rename = "message")]
    Message {
        /// Answer fragment; may be empty.
        #[serde(default)]
        answer: String,
        /// Conversation the message belongs to.
        #[serde(default)]
        conversation_id: Option<String>,
        /// Message being streamed.
        #[serde(default)]
        message_id: Option<String>,
    },
    /// Terminal event with finalized identifiers and usage.
    #[serde(rename = "message_end")]
    MessageEnd {
        /// Final message id.
        #[serde(default)]
        id: Option<String>,
        /// Service-confirmed conversation id.
        #[serde(default)]
        conversation_id: Option<String>,
        /// Usage/cost metadata.
        #[serde(default)]
        metadata: EndMetadata,
    },
    /// File attached to the message (e.g. a generated image).
    #[serde(rename = "message_file")]
    MessageFile {
        /// File id.
        #[serde(default)]
        id: Option<String>,
        /// File type (`image`, ...).
        #[serde(rename = "type", default)]
        kind: String,
        /// Download URL.
        #[serde(default)]
        url: String,
        /// Owner of the file (`assistant` or `user`).
        #[serde(default)]
        belongs_to: String,
    },
    /// Any other discriminator (ping, workflow telemetry, ...).
    #[serde(other)]
    Other,
}

/// Decode a buffered streaming payload into an ordered event sequence.
///
/// Lines without the `data: ` prefix and lines that fail to decode are
/// skipped with a debug log; arrival order is preserved.
pub fn decode_stream(payload: &str) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    for line in payload.lines() {
        let Some(data) = line.trim().strip_prefix(DATA_PREFIX) else {
            continue;
        };
        match serde_json::from_str::<StreamEvent>(data) {
            Ok(event) => events.push(event),
            Err(error) => debug!(%error, "skipping undecodable stream line"),
        }
    }
    events
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_well_formed_lines_in_order() {
        let payload = concat!(
            "data: {\"event\":\"message\",\"answer\":\"Hel\",\"conversation_id\":\"c1\"}\n",
            "data: {\"event\":\"message\",\"answer\":\"lo\"}\n",
            "data: {\"event\":\"message_end\",\"id\":\"m9\",\"conversation_id\":\"c1\"}\n",
        );
        let events = decode_stream(payload);
        assert_eq!(events.len(), 3);
        assert_matches!(&events[0], StreamEvent::Message { answer, .. } if answer == "Hel");
        assert_matches!(&events[1], StreamEvent::Message { answer, .. } if answer == "lo");
        assert_matches!(&events[2], StreamEvent::MessageEnd { id: Some(id), .. } if id == "m9");
    }

    #[test]
    fn skips_malformed_and_unprefixed_lines() {
        let payload = concat!(
            ": keep-alive\n",
            "\n",
            "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
            "data: {not json}\n",
            "event: ping\n",
            "data: {\"event\":\"message\",\"answer\":\"b\"}\n",
            "data: {\"no_discriminator\":true}\n",
        );
        let events = decode_stream(payload);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn unknown_discriminator_decodes_to_other() {
        let payload = "data: {\"event\":\"workflow_started\",\"task_id\":\"t1\"}\n";
        let events = decode_stream(payload);
        assert_eq!(events, vec![StreamEvent::Other]);
    }

    #[test]
    fn empty_payload_yields_no_events() {
        assert!(decode_stream("").is_empty());
    }

    #[test]
    fn message_file_fields() {
        let payload = concat!(
            "data: {\"event\":\"message_file\",\"id\":\"f1\",\"type\":\"image\",",
            "\"url\":\"https://files.example/f1.png\",\"belongs_to\":\"assistant\"}\n",
        );
        let events = decode_stream(payload);
        assert_matches!(
            &events[0],
            StreamEvent::MessageFile { id: Some(id), kind, url, belongs_to }
                if id == "f1" && kind == "image"
                && url == "https://files.example/f1.png" && belongs_to == "assistant"
        );
    }

    #[test]
    fn usage_accepts_string_price() {
        let payload = concat!(
            "data: {\"event\":\"message_end\",\"id\":\"m1\",\"metadata\":{\"usage\":",
            "{\"prompt_tokens\":10,\"completion_tokens\":5,\"total_tokens\":15,",
            "\"total_price\":\"0.0000021\",\"currency\":\"USD\"}}}\n",
        );
        let events = decode_stream(payload);
        let StreamEvent::MessageEnd { metadata, .. } = &events[0] else {
            panic!("expected message_end");
        };
        assert_eq!(metadata.usage.total_tokens, 15);
        assert!((metadata.usage.total_price - 0.0000021).abs() < 1e-12);
    }

    #[test]
    fn usage_defaults_when_absent() {
        let payload = "data: {\"event\":\"message_end\"}\n";
        let events = decode_stream(payload);
        let StreamEvent::MessageEnd { metadata, .. } = &events[0] else {
            panic!("expected message_end");
        };
        assert_eq!(metadata.usage, Usage::default());
        assert_eq!(metadata.usage.currency, "USD");
    }
}
