//! JSON wire envelope for pushed events.

use crate::error::BusResult;
use serde::{Deserialize, Serialize};
use setplan_core::{ChangeEvent, ChangePayload, ClubId, EntityKind, Lifecycle, PracticeId};

/// The shape transports send to clients.
///
/// ```json
/// {"entity":"set","eventType":"updated","practiceId":"…","clubId":"…",
///  "sequence":7,"payload":{"type":"setUpdated","data":{…}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    /// Entity kind.
    pub entity: EntityKind,
    /// Lifecycle stage.
    pub event_type: Lifecycle,
    /// Practice the event belongs to.
    pub practice_id: PracticeId,
    /// Club owning the practice.
    pub club_id: ClubId,
    /// Commit sequence.
    pub sequence: u64,
    /// What changed.
    pub payload: ChangePayload,
}

impl WireEnvelope {
    /// Encodes to a JSON string.
    pub fn to_json(&self) -> BusResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes from a JSON string.
    pub fn from_json(json: &str) -> BusResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&ChangeEvent> for WireEnvelope {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            entity: event.kind(),
            event_type: event.lifecycle(),
            practice_id: event.audience.practice_id,
            club_id: event.audience.club_id,
            sequence: event.sequence.as_u64(),
            payload: event.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setplan_core::{Audience, SequenceNumber, SetId};

    #[test]
    fn envelope_field_names() {
        let audience = Audience {
            club_id: ClubId::from_u128(1),
            practice_id: PracticeId::from_u128(2),
            private_to: None,
        };
        let set_id = SetId::from_u128(3);
        let event = ChangeEvent::set_deleted(SequenceNumber::new(7), audience, set_id);

        let json = WireEnvelope::from(&event).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entity"], "set");
        assert_eq!(value["eventType"], "deleted");
        assert_eq!(value["sequence"], 7);
        assert_eq!(value["payload"]["type"], "setDeleted");
        assert_eq!(value["payload"]["data"]["setId"], set_id.to_string());

        let decoded = WireEnvelope::from_json(&json).unwrap();
        assert_eq!(decoded.practice_id, audience.practice_id);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(WireEnvelope::from_json("{\"entity\":\"nope\"}").is_err());
    }
}
