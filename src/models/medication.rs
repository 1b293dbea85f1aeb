use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MedicationStatus, Substance};

/// A prescription on a client's live medication list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    /// Substances this medication shows up as on a screen. May contain the
    /// `none` sentinel for medications no panel detects.
    pub detected_as: Vec<Substance>,
    /// A missing expected positive for this medication is a critical
    /// finding rather than an informational one.
    pub require_confirmation: bool,
    pub status: MedicationStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Medication {
    /// Whether this prescription was active on the given date.
    pub fn active_on(&self, date: NaiveDate) -> bool {
        if self.status != MedicationStatus::Active {
            return false;
        }
        if self.start_date.is_some_and(|start| start > date) {
            return false;
        }
        if self.end_date.is_some_and(|end| end < date) {
            return false;
        }
        true
    }
}

/// Point-in-time copy of one active medication, captured when a test record
/// is created and stored with it. Later edits to the client's medication
/// list never reach past records through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMedication {
    pub medication_name: String,
    pub detected_as: BTreeSet<Substance>,
    pub require_confirmation: bool,
}

impl SnapshotMedication {
    /// Capture the snapshot for a collection date: medications active on
    /// that date, with the `none` sentinel stripped from `detected_as`.
    /// Medications left with no detectable substances are still recorded so
    /// the snapshot reflects the full prescription list at test time.
    pub fn capture(medications: &[Medication], collection_date: NaiveDate) -> Vec<Self> {
        medications
            .iter()
            .filter(|m| m.active_on(collection_date))
            .map(|m| Self {
                medication_name: m.name.clone(),
                detected_as: m
                    .detected_as
                    .iter()
                    .filter(|s| !s.is_sentinel())
                    .copied()
                    .collect(),
                require_confirmation: m.require_confirmation,
            })
            .collect()
    }
}
