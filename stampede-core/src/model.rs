//! Entities exchanged with the target services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

/// Identifier assigned by a target service.
///
/// The services hand out numeric ids today, but the harness only ever echoes
/// them back, so any JSON scalar is accepted and re-sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => EntityId::Number(n),
            Err(_) => EntityId::Text(s.to_string()),
        })
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub EntityId);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(EntityId::Number(value))
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

entity_id!(
    /// An allocation-eligible identity (a user)
    ActorId
);
entity_id!(
    /// The principal owning the coupon
    CreatorId
);
entity_id!(
    /// The limited-quantity coupon under test
    ResourceId
);

/// One allocation attempt; has no identity beyond its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    pub actor_id: ActorId,
    pub resource_id: ResourceId,
}

/// A durable completion recorded by the allocation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionLogEntry {
    pub request_sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Status reported by the gate's rank endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStatus {
    Waiting { rank: Option<u64> },
    Processing,
    /// Neither queued nor processing (expired, finished, or never entered)
    Unknown(String),
}

impl GateStatus {
    /// Build from the `status` / `rank` fields of a rank response
    pub fn from_fields(status: &str, rank: Option<u64>) -> Self {
        match status {
            "WAITING" => GateStatus::Waiting { rank },
            "PROCESSING" => GateStatus::Processing,
            other => GateStatus::Unknown(other.to_string()),
        }
    }
}

/// Observable state of a ticket as last seen by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Waiting,
    Processing,
}

/// A gate ticket held by one actor for the duration of a single run
#[derive(Debug, Clone)]
pub struct WaitTicket {
    pub actor_id: u64,
    pub enqueued_at: Instant,
    pub last_known_rank: Option<u64>,
    pub state: TicketState,
}

impl WaitTicket {
    pub fn new(actor_id: u64, enqueued_at: Instant) -> Self {
        Self {
            actor_id,
            enqueued_at,
            last_known_rank: None,
            state: TicketState::Waiting,
        }
    }

    /// Fold a poll observation into the ticket; returns true once admitted
    pub fn observe(&mut self, status: &GateStatus) -> bool {
        match status {
            GateStatus::Waiting { rank } => {
                if rank.is_some() {
                    self.last_known_rank = *rank;
                }
                self.state = TicketState::Waiting;
            }
            GateStatus::Processing => self.state = TicketState::Processing,
            GateStatus::Unknown(_) => {}
        }
        self.state == TicketState::Processing
    }

    /// Time since enqueue as of `now`
    pub fn waited(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_round_trips_json_scalars() {
        let numeric: ActorId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(numeric, ActorId::from(42));
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(42));

        let text: ResourceId = serde_json::from_value(json!("c-9")).unwrap();
        assert_eq!(text.to_string(), "c-9");
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("c-9"));
    }

    #[test]
    fn test_entity_id_from_str_prefers_numbers() {
        assert_eq!("17".parse::<ResourceId>().unwrap(), ResourceId::from(17));
        assert_eq!(
            "abc".parse::<ResourceId>().unwrap(),
            ResourceId(EntityId::Text("abc".to_string()))
        );
    }

    #[test]
    fn test_completion_entry_parses_log_record() {
        let entry: CompletionLogEntry = serde_json::from_value(json!({
            "userId": 7,
            "timestamp": "2024-01-01T00:00:00",
            "requestSequence": 3
        }))
        .unwrap();
        assert_eq!(entry.request_sequence, 3);
        assert_eq!(entry.user_id, Some(EntityId::Number(7)));
    }

    #[test]
    fn test_ticket_observes_rank_and_admission() {
        let mut ticket = WaitTicket::new(5, Instant::now());
        assert!(!ticket.observe(&GateStatus::Waiting { rank: Some(12) }));
        assert_eq!(ticket.last_known_rank, Some(12));
        assert!(!ticket.observe(&GateStatus::Unknown("UNKNOWN".into())));
        assert_eq!(ticket.state, TicketState::Waiting);
        assert!(ticket.observe(&GateStatus::Processing));
        assert_eq!(ticket.state, TicketState::Processing);
    }
}
