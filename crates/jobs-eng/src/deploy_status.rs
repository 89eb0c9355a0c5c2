//! Deploy-status reductions served by the dashboard and the polling feed.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{
    format::{format_timestamp, format_timestamp_value},
    models::{DeployStatusEvent, StoredDocument},
};

/// Push channel event name announcing a new deploy status.
pub const DEPLOY_STATUS_CHANGE_EVENT: &str = "gdsc";

/// Field a document may carry its own identifier under; never exposed.
const ID_FIELD: &str = "_id";

/// The most recent event reported for one resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceStatus {
    #[serde(flatten)]
    pub event: DeployStatusEvent,
    /// `event.timestamp` in display form.
    pub time: String,
}

/// Decode stored documents, skipping any that do not describe an event.
pub fn decode_events(docs: Vec<StoredDocument>) -> Vec<DeployStatusEvent> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value(doc.body) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(
                    id = %doc.id,
                    inserted_at = %doc.inserted_at,
                    "Skipping malformed deploy status: {e}"
                );
                None
            }
        })
        .collect()
}

/// Keep the newest event per resource.
///
/// Events are visited sorted by resource (stable, so insertion order holds
/// within a resource); on equal timestamps the later one wins.
pub fn latest_per_resource(mut events: Vec<DeployStatusEvent>) -> BTreeMap<String, ResourceStatus> {
    events.sort_by(|a, b| a.resource.cmp(&b.resource));

    let mut latest: BTreeMap<String, DeployStatusEvent> = BTreeMap::new();
    for event in events {
        let newer = latest
            .get(&event.resource)
            .is_none_or(|prev| prev.timestamp <= event.timestamp);
        if newer {
            latest.insert(event.resource.clone(), event);
        }
    }

    latest
        .into_iter()
        .map(|(resource, event)| {
            let time = format_timestamp(event.timestamp.0);
            (resource, ResourceStatus { event, time })
        })
        .collect()
}

/// Events displayed after `threshold`, for polling clients.
///
/// Each body gets its `timestamp` replaced by the display string, and the
/// comparison against `threshold` (itself a display string) is done on text.
pub fn feed_since(docs: Vec<StoredDocument>, threshold: &str) -> Vec<Value> {
    let mut feed: Vec<(String, Value)> = docs
        .into_iter()
        .filter_map(|doc| match doc.body {
            Value::Object(mut body) => {
                body.remove(ID_FIELD);
                let time = format_timestamp_value(body.get("timestamp").unwrap_or(&Value::Null));
                body.insert("timestamp".to_string(), Value::String(time.clone()));
                Some((time, Value::Object(body)))
            }
            _ => None,
        })
        .filter(|(time, _)| time.as_str() > threshold)
        .collect();

    feed.sort_by(|(a, _), (b, _)| a.cmp(b));
    feed.into_iter().map(|(_, body)| body).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::INVALID_DATE;
    use serde_json::json;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn doc(body: Value) -> StoredDocument {
        StoredDocument {
            id: Uuid::new_v4(),
            body,
            inserted_at: OffsetDateTime::now_utc(),
        }
    }

    fn event(resource: &str, status: &str, timestamp: i64) -> DeployStatusEvent {
        serde_json::from_value(json!({
            "author": "ci",
            "status": status,
            "resource": resource,
            "timestamp": timestamp,
        }))
        .unwrap()
    }

    #[test]
    fn test_latest_per_resource_picks_max_timestamp() {
        let latest = latest_per_resource(vec![
            event("api", "ok", 2_000),
            event("web", "failed", 1_000),
            event("api", "failed", 1_000),
            event("web", "ok", 3_000),
        ]);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest["api"].event.status, "ok");
        assert_eq!(latest["web"].event.status, "ok");
        assert_eq!(latest["web"].event.timestamp.0, 3_000);
    }

    #[test]
    fn test_latest_per_resource_tie_goes_to_later_event() {
        let latest = latest_per_resource(vec![
            event("api", "first", 5_000),
            event("api", "second", 5_000),
        ]);
        assert_eq!(latest["api"].event.status, "second");
    }

    #[test]
    fn test_latest_per_resource_compares_numerically() {
        // "900" > "1000" as strings; numerically it is older.
        let latest = latest_per_resource(vec![event("api", "new", 1_000), event("api", "old", 900)]);
        assert_eq!(latest["api"].event.status, "new");
    }

    #[test]
    fn test_latest_per_resource_attaches_display_time() {
        let latest = latest_per_resource(vec![event("api", "ok", 0)]);
        assert_eq!(latest["api"].time, "01/01/1970, 01:00:00");
    }

    #[test]
    fn test_decode_events_skips_malformed_documents() {
        let events = decode_events(vec![
            doc(json!({"resource": "api", "timestamp": "1000", "status": "ok"})),
            doc(json!({"status": "ok"})),
            doc(json!({"resource": "web", "timestamp": "soon"})),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].resource, "api");
        assert_eq!(events[0].timestamp.0, 1_000);
        assert_eq!(events[0].author, "");
    }

    #[test]
    fn test_decode_events_keeps_extra_fields() {
        let events = decode_events(vec![doc(
            json!({"resource": "api", "timestamp": 1, "build": 42}),
        )]);
        assert_eq!(events[0].extra.get("build"), Some(&json!(42)));
    }

    #[test]
    fn test_feed_since_formats_strips_and_sorts() {
        // 02/01/2024 and 03/01/2024 in Rome; the threshold is 01/01/2024.
        let jan_1 = 1_704_106_800_000; // 2024-01-01T11:00:00Z
        let jan_2 = jan_1 + 86_400_000;
        let jan_3 = jan_2 + 86_400_000;
        let docs = vec![
            doc(json!({"_id": "x", "resource": "web", "timestamp": jan_3})),
            doc(json!({"resource": "api", "timestamp": jan_2})),
            doc(json!({"resource": "old", "timestamp": jan_1})),
        ];

        let feed = feed_since(docs, &format_timestamp(jan_1));
        assert_eq!(
            feed,
            vec![
                json!({"resource": "api", "timestamp": "02/01/2024, 12:00:00"}),
                json!({"resource": "web", "timestamp": "03/01/2024, 12:00:00"}),
            ]
        );
    }

    #[test]
    fn test_feed_since_compares_display_strings_not_instants() {
        // 01/02/2024 is a month after 15/01/2024, but sorts before it as text.
        let jan_15 = 1_705_312_800_000; // 2024-01-15T10:00:00Z
        let feb_1 = 1_706_781_600_000; // 2024-02-01T10:00:00Z
        let feed = feed_since(
            vec![doc(json!({"resource": "api", "timestamp": feb_1}))],
            &format_timestamp(jan_15),
        );
        assert!(feed.is_empty());

        let feed = feed_since(
            vec![doc(json!({"resource": "api", "timestamp": jan_15}))],
            &format_timestamp(feb_1),
        );
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_feed_since_excludes_equal_display_string() {
        let t = 1_705_312_800_000;
        let feed = feed_since(
            vec![doc(json!({"resource": "api", "timestamp": t + 400}))],
            &format_timestamp(t),
        );
        assert!(feed.is_empty());
    }

    #[test]
    fn test_feed_since_invalid_timestamps_sort_after_dates() {
        let feed = feed_since(
            vec![
                doc(json!({"resource": "api"})),
                doc(json!({"resource": "web", "timestamp": 1_705_312_800_000_i64})),
            ],
            &format_timestamp(0),
        );
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["resource"], "web");
        assert_eq!(feed[1]["timestamp"], "Invalid Date");
    }

    #[test]
    fn test_feed_since_invalid_threshold_keeps_nothing() {
        let feed = feed_since(
            vec![
                doc(json!({"resource": "api"})),
                doc(json!({"resource": "web", "timestamp": 1_705_312_800_000_i64})),
            ],
            INVALID_DATE,
        );
        assert!(feed.is_empty());
    }
}
