//! Event Types
//!
//! Records emitted while the market runs: one per production attempt and
//! one per consumer decision.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Production,
    Decision,
}

/// Why a production attempt did not deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Requested amount was negative or not a number
    InvalidAmount,
    /// Requested amount exceeded remaining capacity
    InsufficientCapacity,
    /// The stochastic failure trial triggered
    OperationFailed,
}

/// Producer status after a production attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionStatus {
    pub producer_id: u64,
    pub name: String,
    pub requested: f64,
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureCause>,
    pub trust_level: f64,
    pub capacity: f64,
}

/// A producer that passed every check during a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub producer: String,
    pub score: f64,
}

/// Outcome of one consumer decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub consumer_id: u64,
    pub consumer_name: String,
    /// Chosen producer name, `None` when no producer was available
    pub chosen: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateScore>,
}

impl DecisionRecord {
    pub fn is_purchase(&self) -> bool {
        self.chosen.is_some()
    }
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Production(ProductionStatus),
    Decision(DecisionRecord),
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::Production(_) => EventType::Production,
            EventPayload::Decision(_) => EventType::Decision,
        }
    }
}

/// A single market event, one JSON line in the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub event_id: String,
    pub run_id: Uuid,
    pub tick: u64,
    pub payload: EventPayload,
}

impl MarketEvent {
    pub fn new(event_id: impl Into<String>, run_id: Uuid, tick: u64, payload: EventPayload) -> Self {
        Self {
            event_id: event_id.into(),
            run_id,
            tick,
            payload,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Returns the producer or consumer name this event is about.
    pub fn subject(&self) -> &str {
        match &self.payload {
            EventPayload::Production(status) => &status.name,
            EventPayload::Decision(record) => &record.consumer_name,
        }
    }

    /// Serializes the event to a JSON line (for JSONL format).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production(delivered: bool) -> EventPayload {
        EventPayload::Production(ProductionStatus {
            producer_id: 111,
            name: "Eólica".to_string(),
            requested: 9.0,
            delivered,
            failure: if delivered { None } else { Some(FailureCause::OperationFailed) },
            trust_level: 0.808,
            capacity: 1191.0,
        })
    }

    #[test]
    fn test_event_id_format() {
        assert_eq!(generate_event_id(1), "evt_00000001");
        assert_eq!(generate_event_id(12345), "evt_00012345");
    }

    #[test]
    fn test_payload_tagging() {
        let json = serde_json::to_value(production(true)).unwrap();
        assert_eq!(json["kind"], "production");
        assert!(json.get("failure").is_none());

        let json = serde_json::to_value(production(false)).unwrap();
        assert_eq!(json["failure"], "operation_failed");
    }

    #[test]
    fn test_jsonl_line_parses_back() {
        let run_id = Uuid::new_v4();
        let event = MarketEvent::new(
            generate_event_id(3),
            run_id,
            7,
            EventPayload::Decision(DecisionRecord {
                consumer_id: 123,
                consumer_name: "Genivaldo".to_string(),
                chosen: Some("Solar".to_string()),
                candidates: vec![CandidateScore {
                    producer: "Solar".to_string(),
                    score: 1.5,
                }],
            }),
        );

        let line = event.to_jsonl().unwrap();
        assert!(!line.contains('\n'));

        let parsed = MarketEvent::from_jsonl(&line).unwrap();
        assert_eq!(parsed.event_type(), EventType::Decision);
        assert_eq!(parsed.subject(), "Genivaldo");
        assert_eq!(parsed.run_id, run_id);
        assert_eq!(parsed.tick, 7);
    }

    #[test]
    fn test_no_producer_decision() {
        let record = DecisionRecord {
            consumer_id: 1,
            consumer_name: "c".to_string(),
            chosen: None,
            candidates: Vec::new(),
        };
        assert!(!record.is_purchase());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["chosen"].is_null());
        assert!(json.get("candidates").is_none());
    }
}
