//! Attendance records.

use crate::model::Dog;
use crate::types::{DogId, PracticeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a dog attends a practice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceStatus {
    /// Confirmed attending.
    Attending,
    /// Confirmed absent.
    NotAttending,
    /// No answer yet.
    #[default]
    Unknown,
}

/// A dog's attendance for one practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// The practice.
    pub practice_id: PracticeId,
    /// The dog.
    pub dog_id: DogId,
    /// Attendance status.
    pub status: AttendanceStatus,
    /// True for records synthesized for dogs without an explicit answer.
    #[serde(default)]
    pub is_virtual: bool,
}

impl Attendance {
    /// Creates an explicit attendance record.
    pub fn new(practice_id: PracticeId, dog_id: DogId, status: AttendanceStatus) -> Self {
        Self {
            practice_id,
            dog_id,
            status,
            is_virtual: false,
        }
    }

    /// Returns true if the dog confirmed attending.
    pub fn is_attending(&self) -> bool {
        self.status == AttendanceStatus::Attending
    }
}

/// Merges explicit records with virtual `Unknown` records.
///
/// Every active dog lacking an explicit record for the practice gets a
/// virtual record. Records of other practices are dropped. Explicit records
/// keep their order and are followed by the virtual ones in dog order.
pub fn merge_attendance(
    practice_id: PracticeId,
    records: &[Attendance],
    dogs: &[Dog],
) -> Vec<Attendance> {
    let mut merged: Vec<Attendance> = records
        .iter()
        .filter(|r| r.practice_id == practice_id)
        .cloned()
        .collect();
    let known: BTreeSet<DogId> = merged.iter().map(|r| r.dog_id).collect();

    merged.extend(
        dogs.iter()
            .filter(|dog| dog.is_active() && !known.contains(&dog.id))
            .map(|dog| Attendance {
                practice_id,
                dog_id: dog.id,
                status: AttendanceStatus::Unknown,
                is_virtual: true,
            }),
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DogStatus;
    use crate::types::HandlerId;

    #[test]
    fn synthesizes_unknown_for_active_dogs() {
        let practice_id = PracticeId::new();
        let owner = HandlerId::new();
        let answered = Dog::new("Answered", owner);
        let silent = Dog::new("Silent", owner);
        let mut retired = Dog::new("Retired", owner);
        retired.status = DogStatus::Inactive;

        let records = vec![
            Attendance::new(practice_id, answered.id, AttendanceStatus::Attending),
            Attendance::new(PracticeId::new(), silent.id, AttendanceStatus::Attending),
        ];
        let merged = merge_attendance(
            practice_id,
            &records,
            &[answered.clone(), silent.clone(), retired],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].dog_id, answered.id);
        assert!(!merged[0].is_virtual);
        assert_eq!(merged[1].dog_id, silent.id);
        assert_eq!(merged[1].status, AttendanceStatus::Unknown);
        assert!(merged[1].is_virtual);
    }
}
