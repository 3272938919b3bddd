//! Interaction event types
//!
//! Wire-format records accepted by the collector's batch-logging endpoint.
//! An `InteractionEvent` is captured at record time (including its
//! timestamp); an `InteractionBatch` frames a whole buffer snapshot as the
//! single JSON payload a flush delivers.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single recorded interaction.
///
/// Field names serialize in camelCase because that is the shape the
/// collector expects. `event_type` is an open-ended tag, not a closed
/// enumeration: callers record whatever descriptive string fits
/// (e.g. "navigate_to_gallery", "guestbook_entry_submitted").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Tag identifying the kind of interaction.
    pub event_type: String,
    /// Open key-value context for the event.
    pub event_data: Map<String, Value>,
    /// ISO-8601 timestamp captured when the event was recorded (not at
    /// flush time), millisecond precision, UTC.
    pub client_timestamp: String,
}

impl InteractionEvent {
    /// Create an event stamped with the current UTC time.
    pub fn new(event_type: impl Into<String>, event_data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            event_data,
            client_timestamp: now_timestamp(),
        }
    }
}

/// The flush payload envelope: `{"interactions": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionBatch {
    /// Buffered events in record order.
    pub interactions: Vec<InteractionEvent>,
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn test_event_serializes_camel_case() {
        let mut data = Map::new();
        data.insert("entryId".to_string(), json!(42));

        let event = InteractionEvent::new("guestbook_entry_viewed", data);
        let serialized = serde_json::to_string(&event).expect("serialize should succeed");

        assert!(serialized.contains("\"eventType\":\"guestbook_entry_viewed\""));
        assert!(serialized.contains("\"eventData\""));
        assert!(serialized.contains("\"clientTimestamp\""));
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc_millis() {
        let stamp = now_timestamp();

        assert!(stamp.ends_with('Z'), "timestamp should be UTC: {stamp}");
        let parsed = DateTime::parse_from_rfc3339(&stamp);
        assert!(parsed.is_ok(), "timestamp should parse as RFC 3339: {stamp}");
        // Millisecond precision: exactly three fractional digits before 'Z'.
        let fraction = stamp
            .rsplit('.')
            .next()
            .expect("timestamp should contain a fractional part");
        assert_eq!(fraction.len(), "123Z".len(), "unexpected precision: {stamp}");
    }

    #[test]
    fn test_nested_event_data_round_trips() {
        let data = json!({
            "entry": { "id": 7, "snippet": "hello" },
            "path": ["card_hub", "gallery"],
            "depth": 2
        });
        let event = InteractionEvent::new(
            "blog_lightbox_navigated",
            data.as_object().cloned().expect("object literal"),
        );

        let serialized = serde_json::to_string(&event).expect("serialize should succeed");
        let back: InteractionEvent =
            serde_json::from_str(&serialized).expect("deserialize should succeed");

        assert_eq!(back, event);
        assert_eq!(Value::Object(back.event_data), data);
    }

    #[test]
    fn test_batch_envelope_shape() {
        let batch = InteractionBatch {
            interactions: vec![InteractionEvent::new("language_selected", Map::new())],
        };

        let value: Value = serde_json::to_value(&batch).expect("serialize should succeed");
        let interactions = value
            .get("interactions")
            .and_then(Value::as_array)
            .expect("payload should carry an interactions array");
        assert_eq!(interactions.len(), 1);
    }
}
