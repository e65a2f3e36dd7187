//! Alert record model for the Alertmanager webhook contract

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::models::Trace;

/// Label injected into every alert so the receiver can route it
pub const ALERT_NAME: &str = "Slow Query";

/// Timestamp wrapper enforcing the receiver's wire format.
///
/// Alertmanager expects RFC3339; fractional seconds are truncated so a
/// round trip through JSON is stable at whole-second precision.
/// See <https://prometheus.io/docs/alerting/latest/clients/>.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTime(pub DateTime<Utc>);

impl fmt::Display for AlertTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<DateTime<Utc>> for AlertTime {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

impl Serialize for AlertTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AlertTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = String::deserialize(deserializer)?;
        let parsed = DateTime::parse_from_rfc3339(&repr).map_err(D::Error::custom)?;
        Ok(Self(parsed.with_timezone(&Utc)))
    }
}

/// One firing condition, shaped for the Alertmanager webhook API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Always `"firing"`; this tool has no resolution signal path
    pub status: String,

    /// Root-span labels plus the injected `alertname`
    pub labels: HashMap<String, String>,

    /// Injected `description` annotation
    pub annotations: HashMap<String, String>,

    /// When the alert started firing
    #[serde(rename = "startsAt")]
    pub starts_at: AlertTime,

    /// When the alert ends, if known
    #[serde(rename = "endsAt", skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<AlertTime>,
}

impl Alert {
    /// Translate one slow trace into a firing alert.
    ///
    /// Labels are a copy of the trace's root-span labels; a zero-span trace
    /// is rejected with a data-integrity error before any label access. The
    /// description annotation carries the same latency threshold that built
    /// the query filter. `starts_at` is supplied by the caller (currently
    /// translation wall-clock time).
    pub fn for_slow_trace(
        trace: &Trace,
        threshold: Duration,
        starts_at: DateTime<Utc>,
    ) -> Result<Self> {
        let root = trace.root_span()?;

        let mut labels = root.labels.clone();
        labels.insert("alertname".to_string(), ALERT_NAME.to_string());

        let mut annotations = HashMap::new();
        annotations.insert(
            "description".to_string(),
            format!("Query slower than {}", humantime::format_duration(threshold)),
        );

        Ok(Self {
            status: "firing".to_string(),
            labels,
            annotations,
            starts_at: starts_at.into(),
            ends_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Span;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn slow_trace(labels: &[(&str, &str)]) -> Trace {
        Trace {
            project_id: "my-project".to_string(),
            trace_id: "d44ab6d246b294c78c128c06387b5255".to_string(),
            spans: vec![Span {
                span_id: "1".to_string(),
                kind: Default::default(),
                name: "/sql/execute".to_string(),
                start_time: None,
                end_time: None,
                parent_span_id: None,
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }],
        }
    }

    #[test]
    fn alert_time_round_trips_at_second_precision() {
        let original = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 15).unwrap()
            + chrono::Duration::milliseconds(437);
        let serialized = serde_json::to_string(&AlertTime(original)).unwrap();
        assert_eq!(serialized, "\"2024-05-01T10:30:15Z\"");

        let restored: AlertTime = serde_json::from_str(&serialized).unwrap();
        let truncated = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 15).unwrap();
        assert_eq!(restored.0, truncated);
    }

    #[test]
    fn translation_copies_labels_and_injects_alertname() {
        let trace = slow_trace(&[("query", "SELECT *")]);
        let alert =
            Alert::for_slow_trace(&trace, Duration::from_secs(3), Utc::now()).unwrap();

        assert_eq!(alert.status, "firing");
        assert_eq!(alert.labels.len(), 2);
        assert_eq!(alert.labels["query"], "SELECT *");
        assert_eq!(alert.labels["alertname"], ALERT_NAME);
        assert_eq!(alert.annotations["description"], "Query slower than 3s");
        assert!(alert.ends_at.is_none());
    }

    #[test]
    fn translation_does_not_mutate_the_trace() {
        let trace = slow_trace(&[("query", "SELECT *")]);
        Alert::for_slow_trace(&trace, Duration::from_secs(3), Utc::now()).unwrap();
        assert_eq!(trace.spans[0].labels.len(), 1);
    }

    #[test]
    fn translation_rejects_zero_span_trace() {
        let mut trace = slow_trace(&[]);
        trace.spans.clear();

        let err = Alert::for_slow_trace(&trace, Duration::from_secs(3), Utc::now()).unwrap_err();
        assert!(matches!(err, crate::Error::DataIntegrity(_)));
    }

    #[test]
    fn ends_at_is_omitted_from_the_wire() {
        let trace = slow_trace(&[]);
        let alert =
            Alert::for_slow_trace(&trace, Duration::from_secs(5), Utc::now()).unwrap();
        let json = serde_json::to_value(&alert).unwrap();

        assert!(json.get("endsAt").is_none());
        assert_eq!(json["annotations"]["description"], "Query slower than 5s");
    }
}
